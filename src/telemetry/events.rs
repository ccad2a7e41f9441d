//! Mixer event types describing fades, volume writes and engine lifecycle,
//! exposed to CLI surfaces and tests.

use serde::{Deserialize, Serialize};

use crate::dsp::FadeCurve;
use crate::mixer::BusKind;

/// A single mixer occurrence with its time offset from engine creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MixerEvent {
    /// Milliseconds since the engine was created
    pub timestamp_ms: u64,
    pub kind: MixerEventKind,
    /// Free-form context, e.g. the error message behind a warning
    pub detail: Option<String>,
}

/// What happened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MixerEventKind {
    EngineStarted {
        tick_hz: f32,
    },
    EngineStopped,
    BusRegistered {
        bus: String,
        kind: BusKind,
    },
    BusUnregistered {
        bus: String,
        kind: BusKind,
    },
    FadeStarted {
        bus: String,
        kind: BusKind,
        target: f32,
        duration: f32,
        curve: FadeCurve,
    },
    FadeCompleted {
        bus: String,
        kind: BusKind,
        volume: f32,
    },
    VolumeSet {
        bus: String,
        kind: BusKind,
        volume: f32,
    },
    Warning,
}
