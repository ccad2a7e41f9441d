//! Linear/decibel level conversions.
//!
//! Volumes are linear amplitude multipliers (1.0 = unity gain). The decibel
//! domain is floored at [`MIN_DECIBELS`] so that silence stays representable:
//! every linear value at or below [`LINEAR_FLOOR`] maps to the same floor.

/// Smallest linear level still distinguished from silence.
pub const LINEAR_FLOOR: f32 = 1.0e-4;

/// Decibel value of [`LINEAR_FLOOR`]; the bottom of the decibel domain.
pub const MIN_DECIBELS: f32 = -80.0;

/// Converts a linear amplitude to decibels, flooring at [`MIN_DECIBELS`].
///
/// # Arguments
///
/// * `linear` - Linear amplitude multiplier (1.0 = unity)
///
/// # Returns
///
/// The level in decibels, never below [`MIN_DECIBELS`].
pub fn to_decibels(linear: f32) -> f32 {
    20.0 * linear.max(LINEAR_FLOOR).log10()
}

/// Converts a decibel level back to a linear amplitude.
///
/// # Arguments
///
/// * `decibels` - Level in decibels (0.0 = unity)
///
/// # Returns
///
/// The linear amplitude multiplier.
pub fn to_linear(decibels: f32) -> f32 {
    10.0f32.powf(decibels / 20.0)
}
