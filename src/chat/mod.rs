//! Building blocks of the interactive chat application.
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: slash command parsing
//! - [`render`]: incremental output of notifications

mod commands;
mod config;
mod render;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use render::{PlainTextRenderer, Renderer};
