//! Control-rate volume fader
//!
//! [`VolumeFader`] moves a volume toward a target over a fixed duration,
//! stepped from the engine tick. Interpolation happens in "alpha" space:
//! a normalized value for the shaped curves, or decibels for
//! [`FadeCurve::Logarithmic`]. Converting the interpolation domain instead
//! of the output keeps logarithmic fades perceptually even.
//!
//! A fader also carries an activity allowance: a fade may be limited to a
//! number of seconds of updates, after which it freezes in place. Fade-outs
//! use this so a newer, longer fade cannot keep a bus audible past the
//! point an earlier fade-out would have silenced it.

use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::level;

/// Shape applied to a volume fade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// Constant-rate interpolation.
    #[default]
    Linear,
    /// Slow start and finish with a steep middle.
    SCurve,
    /// Fast start easing into the target.
    Sin,
    /// Interpolates in decibels for a perceptually even sweep.
    Logarithmic,
}

impl fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FadeCurve::Linear => "linear",
            FadeCurve::SCurve => "s_curve",
            FadeCurve::Sin => "sin",
            FadeCurve::Logarithmic => "logarithmic",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for FadeCurve {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(FadeCurve::Linear),
            "s_curve" | "s-curve" | "scurve" => Ok(FadeCurve::SCurve),
            "sin" | "sine" => Ok(FadeCurve::Sin),
            "logarithmic" | "log" => Ok(FadeCurve::Logarithmic),
            other => Err(format!(
                "unknown fade curve '{}' (expected linear, s_curve, sin or logarithmic)",
                other
            )),
        }
    }
}

/// Interpolates a volume toward a target at control rate.
///
/// The fader is idle until [`start_fade`](VolumeFader::start_fade) is called
/// and returns to idle once the target is reached. While idle, updates are
/// no-ops and the volume holds steady.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeFader {
    /// Interpolation value. Normalized for shaped curves, decibels for
    /// `Logarithmic`.
    current_alpha: f32,
    /// Fade destination, in the same domain as `current_alpha`.
    target_alpha: f32,
    /// Total fade length in seconds. Negative while idle.
    fade_duration: f32,
    /// Seconds elapsed since the fade started.
    elapsed: f32,
    curve: FadeCurve,
    /// Seconds of updates the fader may still consume. Negative means
    /// unlimited.
    active_duration: f32,
}

impl VolumeFader {
    /// Creates an idle fader at unity volume.
    pub fn new() -> Self {
        Self {
            current_alpha: 1.0,
            target_alpha: 1.0,
            fade_duration: -1.0,
            elapsed: 0.0,
            curve: FadeCurve::Linear,
            active_duration: -1.0,
        }
    }

    fn alpha_to_volume(alpha: f32, curve: FadeCurve) -> f32 {
        match curve {
            FadeCurve::Linear => alpha,
            FadeCurve::SCurve => (0.5 * (PI * alpha - FRAC_PI_2).sin() + 0.5).max(0.0),
            FadeCurve::Sin => (FRAC_PI_2 * alpha).sin().max(0.0),
            FadeCurve::Logarithmic => level::to_linear(alpha),
        }
    }

    /// Current volume as a linear amplitude multiplier.
    pub fn volume(&self) -> f32 {
        Self::alpha_to_volume(self.current_alpha, self.curve)
    }

    /// Volume the fader is heading toward, as a linear amplitude.
    pub fn target_volume(&self) -> f32 {
        match self.curve {
            FadeCurve::Logarithmic => level::to_linear(self.target_alpha),
            _ => self.target_alpha,
        }
    }

    /// Total length of the fade in progress. Negative while idle.
    pub fn fade_duration(&self) -> f32 {
        self.fade_duration
    }

    /// Curve shape of the fade in progress.
    pub fn curve(&self) -> FadeCurve {
        self.curve
    }

    /// Remaining activity allowance in seconds. Negative means unlimited.
    pub fn active_duration(&self) -> f32 {
        self.active_duration
    }

    /// True while a fade is in progress and the fader may still advance.
    pub fn is_fading(&self) -> bool {
        self.is_active() && self.elapsed < self.fade_duration
    }

    /// True while fading toward a louder volume.
    pub fn is_fading_in(&self) -> bool {
        self.is_fading() && self.target_alpha > self.current_alpha
    }

    /// True while fading toward a quieter volume.
    pub fn is_fading_out(&self) -> bool {
        self.is_fading() && self.target_alpha < self.current_alpha
    }

    /// True unless the activity allowance has been consumed.
    pub fn is_active(&self) -> bool {
        self.active_duration != 0.0
    }

    /// Limits how many more seconds of updates the fader will consume.
    ///
    /// # Arguments
    ///
    /// * `seconds` - Remaining allowance. Negative removes the limit.
    pub fn set_active_duration(&mut self, seconds: f32) {
        self.active_duration = seconds;
    }

    /// Sets the volume immediately and aborts any fade in progress.
    ///
    /// The fader returns to an idle, unrestricted state with the given
    /// volume as both current and target.
    pub fn set_volume(&mut self, volume: f32) {
        self.current_alpha = volume;
        self.target_alpha = volume;
        self.curve = FadeCurve::Linear;
        self.fade_duration = -1.0;
        self.elapsed = 0.0;
        self.active_duration = -1.0;
    }

    /// Begins a fade toward `volume` over `duration` seconds.
    ///
    /// A fade started while another is in progress continues from the
    /// current alpha, converted across the decibel boundary when the curve
    /// changes to or from [`FadeCurve::Logarithmic`]. A non-positive
    /// duration applies the volume immediately.
    ///
    /// Starting a fade restores an exhausted activity allowance; an
    /// allowance set explicitly beforehand is preserved.
    ///
    /// # Arguments
    ///
    /// * `volume` - Target as a linear amplitude multiplier
    /// * `duration` - Fade length in seconds
    /// * `curve` - Shape of the fade
    pub fn start_fade(&mut self, volume: f32, duration: f32, curve: FadeCurve) {
        if duration <= 0.0 {
            self.set_volume(volume);
            return;
        }

        if self.active_duration == 0.0 {
            self.active_duration = -1.0;
        }

        if curve != FadeCurve::Logarithmic {
            if self.curve == FadeCurve::Logarithmic {
                self.current_alpha = level::to_linear(self.current_alpha);
            }
            self.target_alpha = volume;
        } else {
            if self.curve != FadeCurve::Logarithmic {
                self.current_alpha = level::to_decibels(self.current_alpha);
            }
            self.target_alpha = level::to_decibels(volume);
        }

        self.curve = curve;
        self.fade_duration = duration;
        self.elapsed = 0.0;
    }

    /// Aborts the fade in progress, holding the alpha where it is.
    ///
    /// The held alpha is reinterpreted as a linear volume. For a fade that
    /// just snapped to its target this lands exactly on the requested
    /// level, whatever the curve shape was.
    pub fn stop_fade(&mut self) {
        if self.curve == FadeCurve::Logarithmic {
            self.current_alpha = level::to_linear(self.current_alpha);
        }
        self.target_alpha = self.current_alpha;
        self.curve = FadeCurve::Linear;
        self.fade_duration = -1.0;
        self.elapsed = 0.0;
    }

    /// Advances the fade by `delta` seconds.
    ///
    /// Idle or exhausted faders ignore updates. When the fade duration is
    /// reached the volume snaps to the target and the fader goes idle.
    pub fn update(&mut self, delta: f32) {
        if !self.is_fading() {
            return;
        }

        let delta = if self.active_duration < 0.0 {
            delta
        } else {
            let step = delta.min(self.active_duration);
            self.active_duration -= step;
            step
        };

        self.elapsed += delta;
        if self.elapsed >= self.fade_duration {
            self.current_alpha = self.target_alpha;
            self.stop_fade();
            return;
        }

        let low = self.current_alpha.min(self.target_alpha);
        let high = self.current_alpha.max(self.target_alpha);
        let remaining = self.fade_duration - self.elapsed;
        self.current_alpha += (self.target_alpha - self.current_alpha) * delta / remaining;
        self.current_alpha = self.current_alpha.clamp(low, high);
    }

    /// Predicts the volume `delta` seconds from now without advancing.
    ///
    /// Past the end of the fade this returns the target volume. The
    /// prediction assumes the fader stays active for the whole window.
    ///
    /// # Arguments
    ///
    /// * `delta` - Lookahead in seconds (negative values read as zero)
    ///
    /// # Returns
    ///
    /// The predicted linear volume.
    pub fn volume_after(&self, delta: f32) -> f32 {
        let delta = delta.max(0.0);
        if !self.is_fading() {
            return self.volume();
        }
        if self.elapsed + delta >= self.fade_duration {
            return self.target_volume();
        }

        let low = self.current_alpha.min(self.target_alpha);
        let high = self.current_alpha.max(self.target_alpha);
        let remaining = self.fade_duration - self.elapsed;
        let future = self.current_alpha
            + (self.target_alpha - self.current_alpha) * delta / remaining;
        Self::alpha_to_volume(future.clamp(low, high), self.curve)
    }
}

impl Default for VolumeFader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "fader_tests.rs"]
mod tests;
