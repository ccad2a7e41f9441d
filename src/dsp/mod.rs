//! Control-rate DSP primitives
//!
//! This module provides the volume-control building blocks used by the
//! mixer engine:
//! - Linear/decibel level conversions with a fixed silence floor
//! - A control-rate volume fader supporting multiple fade curve shapes
//!
//! Everything here is allocation-free and deterministic: the same sequence
//! of updates always produces the same volumes.

pub mod fader;
pub mod level;

pub use fader::{FadeCurve, VolumeFader};
