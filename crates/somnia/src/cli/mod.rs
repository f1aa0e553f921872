//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the somnia binary.

mod check_config;
mod commands;
mod generate;
mod presets;

pub use check_config::handle_check_config;
pub use commands::{Cli, Commands, GenerateArgs};
#[cfg(feature = "ollama")]
pub use generate::handle_generate;
pub use generate::{RunReport, generate_story, write_outputs};
pub use presets::handle_presets;
