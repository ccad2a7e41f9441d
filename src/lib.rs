// SoundClass Mixer - control-rate volume automation
// Named audio buses with curved fades, driven by a background ticker

// Module declarations
pub mod commands;
pub mod config;
pub mod dsp;
pub mod error;
pub mod handle;
pub mod mixer;
#[cfg(feature = "debug-draw")]
pub mod overlay;
pub mod telemetry;

// Re-exports for convenience
pub use commands::{CommandRegistry, CommandSpec, COMMANDS};
pub use config::MixerConfig;
pub use dsp::level::{to_decibels, to_linear};
pub use dsp::{FadeCurve, VolumeFader};
pub use error::{CommandError, MixerError};
pub use handle::{MixerCommand, MixerHandle};
pub use mixer::{BusDecl, BusKind, BusSnapshot, MixerEngine, MAX_DELTA_TIME};
pub use telemetry::{EventHub, EventSnapshot, MixerEvent, MixerEventKind};
