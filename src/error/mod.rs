// Error types for the sound class mixer
//
// This module defines custom error types for mixer and console command
// operations, providing structured errors with logging helpers.

mod command;
mod mixer;

pub use command::{log_command_error, CommandError};
pub use mixer::{log_mixer_error, MixerError};
