//! Slash command parsing for the chat application.
//!
//! Input that starts with `/` controls the REPL and is never sent to the
//! backend.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Show the agent currently answering.
    Agent,

    /// Show the loading flag and connection state.
    Status,

    /// Change the user id sent with each message.
    User(String),

    /// Change the session id sent with each message.
    Session(String),

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a message.
///
/// # Examples
///
/// ```
/// # use agentstream::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/user alice").is_some());
/// assert!(parse_command("Hello there").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "agent" => ChatCommand::Agent,
        "status" => ChatCommand::Status,
        "user" => match argument {
            Some(id) => ChatCommand::User(id.to_string()),
            None => ChatCommand::Invalid("/user requires an id".to_string()),
        },
        "session" => match argument {
            Some(id) => ChatCommand::Session(id.to_string()),
            None => ChatCommand::Invalid("/session requires an id".to_string()),
        },
        other => ChatCommand::Invalid(format!("unknown command: /{other}")),
    };
    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /agent                 Show the agent currently answering
  /status                Show loading and connection state
  /user <id>             Change the user id
  /session <id>          Change the session id
  /help                  Show this help message
  /quit                  Exit the chat

Press Ctrl+C while a response streams to cancel it."#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /QUIT  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_ids() {
        assert_eq!(
            parse_command("/user   alice  "),
            Some(ChatCommand::User("alice".to_string()))
        );
        assert_eq!(
            parse_command("/session s-2"),
            Some(ChatCommand::Session("s-2".to_string()))
        );
        assert_eq!(
            parse_command("/user"),
            Some(ChatCommand::Invalid("/user requires an id".to_string()))
        );
    }

    #[test]
    fn parse_info_commands() {
        assert_eq!(parse_command("/agent"), Some(ChatCommand::Agent));
        assert_eq!(parse_command("/status"), Some(ChatCommand::Status));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn unknown_command_is_invalid() {
        assert_eq!(
            parse_command("/model x"),
            Some(ChatCommand::Invalid("unknown command: /model".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("  what is /status?"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn help_text_lists_commands() {
        let help = help_text();
        for command in ["/agent", "/status", "/user", "/session", "/help", "/quit"] {
            assert!(help.contains(command), "missing {command}");
        }
    }
}
