//! Mixer engine: applies volume requests to the registry and advances
//! every fader from the tick.

use std::sync::Arc;
use std::time::Instant;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::MixerConfig;
use crate::dsp::FadeCurve;
use crate::error::MixerError;
use crate::mixer::{BusDecl, BusKind, BusRegistry};
use crate::telemetry::{EventHub, MixerEvent, MixerEventKind};

/// Largest delta the engine will apply in one update. Keeps a stalled
/// ticker from slamming every fade to its target on the next tick.
pub const MAX_DELTA_TIME: f32 = 0.5;

const NEARLY_ZERO: f32 = 1.0e-8;

fn nearly_zero(value: f32) -> bool {
    value.abs() <= NEARLY_ZERO
}

/// Read-only view of one bus, as reported by [`MixerEngine::snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusSnapshot {
    pub name: String,
    pub kind: BusKind,
    pub volume: f32,
    pub target_volume: f32,
    pub fading: bool,
    pub fading_to_silence: bool,
}

/// Applies fades and volume writes to registered buses.
///
/// The engine is synchronous and single-threaded. Wrapping it for
/// concurrent use is the job of [`crate::handle::MixerHandle`].
pub struct MixerEngine {
    registry: BusRegistry,
    hub: Arc<EventHub>,
    created_at: Instant,
}

impl MixerEngine {
    /// Builds an engine with the buses declared in `config`, after
    /// exclusion filtering.
    pub fn new(config: &MixerConfig, hub: Arc<EventHub>) -> Self {
        let registry = BusRegistry::from_config(config);
        debug!("[Mixer] Gathered {} buses from config", registry.len());
        Self {
            registry,
            hub,
            created_at: Instant::now(),
        }
    }

    pub(crate) fn emit(&self, kind: MixerEventKind, detail: Option<String>) {
        let timestamp_ms = self.created_at.elapsed().as_millis() as u64;
        self.hub.publish(MixerEvent {
            timestamp_ms,
            kind,
            detail,
        });
    }

    pub(crate) fn warn(&self, detail: impl Into<String>) {
        self.emit(MixerEventKind::Warning, Some(detail.into()));
    }

    /// Registers a bus, replacing any existing strip under the same name.
    pub fn register(&mut self, kind: BusKind, decl: BusDecl) {
        debug!("[Mixer] Bus added: {} ({})", decl.name, kind);
        let name = decl.name.clone();
        self.registry.insert(kind, &decl);
        self.emit(MixerEventKind::BusRegistered { bus: name, kind }, None);
    }

    /// Removes a bus.
    pub fn unregister(&mut self, kind: BusKind, name: &str) -> Result<(), MixerError> {
        if !self.registry.remove(kind, name) {
            return Err(MixerError::UnknownBus {
                kind,
                name: name.to_string(),
            });
        }
        debug!("[Mixer] Bus removed: {} ({})", name, kind);
        self.emit(
            MixerEventKind::BusUnregistered {
                bus: name.to_string(),
                kind,
            },
            None,
        );
        Ok(())
    }

    /// Adjusts a bus volume toward `level` over `duration` seconds.
    ///
    /// Durations and levels are clamped to zero. Fade-out requests carry
    /// extra rules:
    /// - a fade-out to a level at or above the current target is ignored
    /// - a fade-out with both duration and level at zero is ignored
    /// - fade-outs and fades to silence cap the fader's activity
    ///   allowance, so a later, longer request cannot keep the bus
    ///   audible past the earlier silence point
    pub fn adjust_volume(
        &mut self,
        kind: BusKind,
        name: &str,
        level: f32,
        duration: f32,
        curve: FadeCurve,
        is_fade_out: bool,
    ) -> Result<(), MixerError> {
        let duration = duration.max(0.0);
        let level = level.max(0.0);
        if is_fade_out && nearly_zero(duration) && nearly_zero(level) {
            return Ok(());
        }

        let strip = self.registry.strip_mut(kind, name).ok_or_else(|| {
            MixerError::UnknownBus {
                kind,
                name: name.to_string(),
            }
        })?;

        strip.fading_to_silence = is_fade_out || nearly_zero(level);

        // A fade-out may only lower the target.
        let initial_target = strip.fader.target_volume();
        if is_fade_out && level >= initial_target {
            return Ok(());
        }

        let to_zero = nearly_zero(level);
        if is_fade_out || to_zero {
            // An indefinite allowance becomes finite here; an existing
            // finite one can only shrink.
            let old_allowance = strip.fader.active_duration();
            let new_allowance = if old_allowance < 0.0 {
                duration
            } else {
                old_allowance.min(duration)
            };
            strip.fader.set_active_duration(new_allowance);
        }

        strip.fader.start_fade(level, duration, curve);
        debug!(
            "[Mixer] {} '{}' fading to {:.4} over {:.2}s ({})",
            kind, name, level, duration, curve
        );
        self.emit(
            MixerEventKind::FadeStarted {
                bus: name.to_string(),
                kind,
                target: level,
                duration,
                curve,
            },
            None,
        );
        Ok(())
    }

    /// Fades a bus to `level`, deciding the fade direction from the
    /// current volume.
    pub fn fade_to(
        &mut self,
        kind: BusKind,
        name: &str,
        level: f32,
        duration: f32,
        curve: FadeCurve,
    ) -> Result<(), MixerError> {
        let current = self.volume(kind, name)?;
        let is_fade_out = current > level;
        self.adjust_volume(kind, name, level, duration, curve, is_fade_out)
    }

    /// Sets a bus volume immediately, aborting any fade in progress.
    pub fn set_volume(&mut self, kind: BusKind, name: &str, volume: f32) -> Result<(), MixerError> {
        let volume = volume.max(0.0);
        let strip = self.registry.strip_mut(kind, name).ok_or_else(|| {
            MixerError::UnknownBus {
                kind,
                name: name.to_string(),
            }
        })?;

        strip.fader.set_volume(volume);
        strip.fading_to_silence = false;
        self.emit(
            MixerEventKind::VolumeSet {
                bus: name.to_string(),
                kind,
                volume,
            },
            None,
        );
        Ok(())
    }

    /// Current volume of a bus.
    pub fn volume(&self, kind: BusKind, name: &str) -> Result<f32, MixerError> {
        self.registry
            .strip(kind, name)
            .map(|strip| strip.fader.volume())
            .ok_or_else(|| MixerError::UnknownBus {
                kind,
                name: name.to_string(),
            })
    }

    /// Volume a bus is heading toward.
    pub fn target_volume(&self, kind: BusKind, name: &str) -> Result<f32, MixerError> {
        self.registry
            .strip(kind, name)
            .map(|strip| strip.fader.target_volume())
            .ok_or_else(|| MixerError::UnknownBus {
                kind,
                name: name.to_string(),
            })
    }

    /// Advances every fader by `delta` seconds, clamped to
    /// [`MAX_DELTA_TIME`], and reports fades that finished this tick.
    pub fn update(&mut self, delta: f32) {
        let delta = delta.clamp(0.0, MAX_DELTA_TIME);

        let mut completed = Vec::new();
        for (kind, name, strip) in self.registry.iter_mut() {
            let was_fading = strip.fader.is_fading();
            strip.fader.update(delta);
            if was_fading && !strip.fader.is_fading() {
                completed.push((kind, name.to_string(), strip.fader.volume()));
            }
        }

        for (kind, bus, volume) in completed {
            self.emit(MixerEventKind::FadeCompleted { bus, kind, volume }, None);
        }
    }

    /// Reports every bus, sorted by name then kind.
    pub fn snapshot(&self) -> Vec<BusSnapshot> {
        let mut rows: Vec<BusSnapshot> = self
            .registry
            .iter()
            .map(|(kind, name, strip)| BusSnapshot {
                name: name.to_string(),
                kind,
                volume: strip.fader.volume(),
                target_volume: strip.fader.target_volume(),
                fading: strip.fader.is_fading(),
                fading_to_silence: strip.fading_to_silence,
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.kind.cmp(&b.kind)));
        rows
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
