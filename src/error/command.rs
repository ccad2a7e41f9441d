// Console command error types

use log::error;
use std::fmt;

use crate::error::MixerError;

/// Log a command error with the line that produced it
pub fn log_command_error(err: &CommandError, line: &str) {
    error!("Command error for '{}': {}", line, err);
}

/// Errors raised while parsing or dispatching console commands.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// No command with this name is registered
    UnknownCommand { name: String },

    /// Too few arguments for the command
    MissingArguments {
        command: &'static str,
        got: usize,
        want: usize,
    },

    /// An argument failed to parse
    InvalidArgument {
        argument: &'static str,
        value: String,
    },

    /// The command is not available in this build
    Unsupported { command: &'static str },

    /// Rendering command output failed
    Render { reason: String },

    /// The command reached the mixer but the mixer refused it
    Mixer(MixerError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownCommand { name } => {
                write!(f, "Unknown command '{}' (try 'help')", name)
            }
            CommandError::MissingArguments { command, got, want } => {
                write!(f, "{}: not enough arguments, {}/{}", command, got, want)
            }
            CommandError::InvalidArgument { argument, value } => {
                write!(f, "Invalid {} '{}'", argument, value)
            }
            CommandError::Unsupported { command } => {
                write!(f, "{} is not available in this build", command)
            }
            CommandError::Render { reason } => {
                write!(f, "Failed to render output: {}", reason)
            }
            CommandError::Mixer(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Mixer(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MixerError> for CommandError {
    fn from(err: MixerError) -> Self {
        CommandError::Mixer(err)
    }
}
