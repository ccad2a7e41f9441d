//! Bus registry and volume mixer engine.
//!
//! A bus is a named volume control backed by a [`crate::dsp::VolumeFader`].
//! Two kinds exist side by side: sound classes and submixes. The engine
//! owns the registry, applies fade and volume requests to it, advances all
//! faders from a tick, and reports what happened through the event hub.

mod engine;
mod registry;

pub use engine::{BusSnapshot, MixerEngine, MAX_DELTA_TIME};
pub use registry::{BusDecl, BusKind, BusRegistry};
