//! Output rendering for the chat application.
//!
//! Notifications carry the full accumulated text of a message; the renderer
//! prints only what is new since the previous update so the response appears
//! incrementally.

use std::io::{self, Stdout, Write};

use crate::types::Notification;

/// ANSI escape code for dim text (used for agent events).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for cyan text (used for agent titles).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Print a chunk of response text.
    fn print_text(&mut self, text: &str);

    /// Print an agent or status event.
    fn print_event(&mut self, title: &str);

    /// Print the number of websites consulted.
    fn print_website_count(&mut self, count: u64);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when a response is complete.
    fn finish_response(&mut self);

    /// Called when the stream is cancelled by the user.
    fn print_interrupted(&mut self);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    message_id: Option<String>,
    printed: usize,
    mid_line: bool,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a renderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a renderer on stdout with the specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer on an arbitrary writer.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            message_id: None,
            printed: 0,
            mid_line: false,
        }
    }

    /// Consumes the renderer, returning its writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Renders one notification.
    pub fn render(&mut self, notification: &Notification) {
        match notification {
            Notification::MessageUpdate { id, text } => {
                if self.message_id.as_deref() != Some(id.as_str()) {
                    self.message_id = Some(id.clone());
                    self.printed = 0;
                }
                if let Some(new) = text.get(self.printed..) {
                    if !new.is_empty() {
                        self.print_text(new);
                    }
                }
                self.printed = text.len();
            }
            Notification::EventUpdate { title, .. } => self.print_event(title),
            Notification::WebsiteCount { count } => self.print_website_count(*count),
        }
    }

    fn write(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    fn break_line(&mut self) {
        if self.mid_line {
            self.write("\n");
            self.mid_line = false;
        }
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_text(&mut self, text: &str) {
        self.write(text);
        self.mid_line = !text.ends_with('\n');
    }

    fn print_event(&mut self, title: &str) {
        self.break_line();
        let line = if self.use_color {
            format!("{ANSI_CYAN}[{title}]{ANSI_RESET}\n")
        } else {
            format!("[{title}]\n")
        };
        self.write(&line);
    }

    fn print_website_count(&mut self, count: u64) {
        self.break_line();
        let line = if self.use_color {
            format!("{ANSI_DIM}[{count} websites]{ANSI_RESET}\n")
        } else {
            format!("[{count} websites]\n")
        };
        self.write(&line);
    }

    fn print_error(&mut self, error: &str) {
        self.break_line();
        let line = if self.use_color {
            format!("{ANSI_RED}Error: {error}{ANSI_RESET}\n")
        } else {
            format!("Error: {error}\n")
        };
        self.write(&line);
    }

    fn print_info(&mut self, info: &str) {
        self.break_line();
        self.write(&format!("{info}\n"));
    }

    fn finish_response(&mut self) {
        self.break_line();
        self.message_id = None;
        self.printed = 0;
    }

    fn print_interrupted(&mut self) {
        self.break_line();
        self.write("[interrupted]\n");
        self.message_id = None;
        self.printed = 0;
    }
}
