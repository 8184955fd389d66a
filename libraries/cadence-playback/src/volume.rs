//! Volume and seek clamping
//!
//! Out-of-range input is clamped, never rejected. NaN maps to zero.

/// Output gain in `[0.0, 1.0]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume(f32);

impl Volume {
    /// Create a volume, clamping the level
    pub fn new(level: f32) -> Self {
        Self(clamp_level(level))
    }

    pub fn level(self) -> f32 {
        self.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self(0.5)
    }
}

/// Clamp a volume level to `[0, 1]`
pub fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

/// Clamp a seek target to `[0, duration]`
///
/// While the duration is unknown only the lower bound applies.
pub fn clamp_position(seconds: f64, duration: Option<f64>) -> f64 {
    if seconds.is_nan() {
        return 0.0;
    }
    let lower = seconds.max(0.0);
    match duration {
        Some(d) if d.is_finite() => lower.min(d.max(0.0)),
        _ => lower,
    }
}
