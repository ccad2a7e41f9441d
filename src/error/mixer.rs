// Mixer error types

use log::error;
use std::fmt;

use crate::mixer::BusKind;

/// Log a mixer error with structured context
///
/// Includes the component and the operation that failed so log lines can be
/// filtered without parsing the message body.
pub fn log_mixer_error(err: &MixerError, context: &str) {
    error!("Mixer error in {}: component=MixerEngine, message={}", context, err);
}

/// Errors raised by the mixer engine and its handle.
#[derive(Debug, Clone, PartialEq)]
pub enum MixerError {
    /// No bus with this name is registered under the given kind
    UnknownBus { kind: BusKind, name: String },

    /// The ticker thread is already running
    AlreadyRunning,

    /// The ticker thread is not running
    NotRunning,

    /// A Mutex guarding shared state was poisoned
    LockPoisoned { component: String },

    /// The command queue is full; the ticker is not keeping up
    CommandQueueFull,

    /// The command queue receiver is gone
    CommandQueueClosed,
}

impl fmt::Display for MixerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MixerError::UnknownBus { kind, name } => {
                write!(f, "No {} named '{}' is registered", kind, name)
            }
            MixerError::AlreadyRunning => {
                write!(f, "Mixer already running. Call stop() first.")
            }
            MixerError::NotRunning => {
                write!(f, "Mixer not running. Call start() first.")
            }
            MixerError::LockPoisoned { component } => {
                write!(f, "Lock poisoned on {}", component)
            }
            MixerError::CommandQueueFull => {
                write!(f, "Command queue is full")
            }
            MixerError::CommandQueueClosed => {
                write!(f, "Command queue is closed")
            }
        }
    }
}

impl std::error::Error for MixerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_bus_message_names_the_bus() {
        let err = MixerError::UnknownBus {
            kind: BusKind::SoundClass,
            name: "Music".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("Music"));
        assert!(message.contains("sound class"));

        let err = MixerError::UnknownBus {
            kind: BusKind::Submix,
            name: "Reverb".to_string(),
        };
        assert!(err.to_string().contains("submix"));
    }

    #[test]
    fn test_lifecycle_error_messages() {
        assert!(MixerError::AlreadyRunning.to_string().contains("already running"));
        assert!(MixerError::NotRunning.to_string().contains("not running"));
    }

    #[test]
    fn test_lock_poisoned_names_component() {
        let err = MixerError::LockPoisoned {
            component: "engine".to_string(),
        };
        assert!(err.to_string().contains("engine"));
    }

    #[test]
    fn test_queue_error_messages() {
        assert!(MixerError::CommandQueueFull.to_string().contains("full"));
        assert!(MixerError::CommandQueueClosed.to_string().contains("closed"));
    }
}
