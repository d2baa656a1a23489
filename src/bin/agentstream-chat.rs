//! Interactive chat against a streaming agent backend.
//!
//! # Usage
//!
//! ```bash
//! # Talk to the default local endpoint
//! agentstream-chat
//!
//! # Use a YAML config and override the endpoint
//! agentstream-chat --config agentstream.yaml --endpoint https://chat.example.com/api/run_sse
//!
//! # Verbose connection diagnostics on stderr
//! agentstream-chat --log-level debug
//! ```
//!
//! # Commands
//!
//! - `/agent` - Show the agent currently answering
//! - `/status` - Show loading and connection state
//! - `/user <id>` and `/session <id>` - Change the ids sent with each message
//! - `/help` - Show available commands
//! - `/quit` - Exit the application
//!
//! Ctrl+C while a response streams cancels it.

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use agentstream::chat::{
    ChatArgs, ChatCommand, ChatConfig, PlainTextRenderer, Renderer, help_text, parse_command,
};
use agentstream::{SessionOutcome, StreamingSession};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("agentstream-chat [OPTIONS]");
    let mut config = ChatConfig::from_args(args)?;

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(config.stream.log_level))
        .with_writer(std::io::stderr)
        .init();

    let session = Arc::new(StreamingSession::from_config(&config.stream)?);
    let mut notifications = session.subscribe();
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    let handler_session = Arc::clone(&session);
    // An idle cancel would carry over to the next message.
    ctrlc::set_handler(move || {
        if handler_session.is_loading() {
            handler_session.cancel_stream();
        }
    })?;

    println!("agentstream chat ({})", config.stream.endpoint);
    println!("Type /help for commands, /quit to exit\n");

    loop {
        let line = match rl.readline("You: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {err}"));
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);

        if let Some(command) = parse_command(line) {
            match command {
                ChatCommand::Quit => {
                    println!("Goodbye!");
                    break;
                }
                ChatCommand::Help => {
                    for line in help_text().lines() {
                        println!("    {line}");
                    }
                }
                ChatCommand::Agent => {
                    let agent = session.current_agent();
                    if agent.is_empty() {
                        renderer.print_info("No agent has answered yet.");
                    } else {
                        renderer.print_info(&format!("Current agent: {agent}"));
                    }
                }
                ChatCommand::Status => {
                    renderer.print_info(&format!(
                        "loading: {}, connection: {}, user: {}, session: {}",
                        session.is_loading(),
                        session.connection_state(),
                        config.user_id,
                        config.session_id,
                    ));
                }
                ChatCommand::User(id) => {
                    renderer.print_info(&format!("User id set to {id}"));
                    config.user_id = id;
                }
                ChatCommand::Session(id) => {
                    renderer.print_info(&format!("Session id set to {id}"));
                    config.session_id = id;
                }
                ChatCommand::Invalid(message) => renderer.print_error(&message),
            }
            continue;
        }

        let submit = session.submit_message(line, &config.user_id, &config.session_id);
        tokio::pin!(submit);
        let outcome = loop {
            tokio::select! {
                Some(notification) = notifications.recv() => renderer.render(&notification),
                outcome = &mut submit => break outcome,
            }
        };
        while let Ok(notification) = notifications.try_recv() {
            renderer.render(&notification);
        }

        match outcome {
            Ok(SessionOutcome::Completed(_)) => renderer.finish_response(),
            Ok(SessionOutcome::Cancelled) => renderer.print_interrupted(),
            Err(err) => renderer.print_error(&err.to_string()),
        }
    }

    Ok(())
}
