//! # Analog Normalizer
//!
//! Converts raw 12-bit ADC pairs into signed normalized stick positions.
//!
//! ## Pipeline
//!
//! 1. Raw ADC (0-4095, 2048 = center) is normalized to -1.0..1.0
//! 2. A deadzone maps small deflection to center and rescales the rest
//! 3. Invert flags negate X and/or Y independently
//! 4. The value is scaled to the signed axis range (-32767..32767)
//!
//! The pair's [`StickMode`] decides what happens next: `LeftAnalog` and
//! `RightAnalog` forward the position to that stick, `Digital` turns it into
//! directions through a threshold test.
//!
//! ## Usage
//!
//! ```
//! use gamepad_pipeline::input::analog::{normalize_adc, Calibration};
//!
//! let cal = Calibration::new(0.05);
//!
//! // Near center (within deadzone)
//! assert_eq!(cal.apply(normalize_adc(2060)), 0.0);
//!
//! // Full deflection preserved
//! assert!((cal.apply(normalize_adc(4095)) - 1.0).abs() < 0.001);
//! ```

use serde::{Deserialize, Serialize};

use super::directional::DirectionalResult;

/// Maximum raw ADC reading (12-bit).
pub const ADC_MAX: u16 = 4095;
/// Raw ADC reading at stick center.
pub const ADC_CENTER: u16 = 2048;

/// Maximum normalized axis magnitude.
pub const AXIS_MAX: i16 = 32767;

/// How a directional or analog source is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StickMode {
    /// Digital directions (hat)
    #[default]
    Digital,
    /// Left analog stick
    LeftAnalog,
    /// Right analog stick
    RightAnalog,
}

/// Axis inversion for one ADC pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Invert {
    #[default]
    None,
    X,
    Y,
    Xy,
}

impl Invert {
    #[must_use]
    pub const fn x(self) -> bool {
        matches!(self, Self::X | Self::Xy)
    }

    #[must_use]
    pub const fn y(self) -> bool {
        matches!(self, Self::Y | Self::Xy)
    }
}

/// Signed stick position. Negative X is left, negative Y is up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct StickPosition {
    pub x: i16,
    pub y: i16,
}

impl StickPosition {
    /// Stick at rest.
    pub const CENTER: StickPosition = StickPosition { x: 0, y: 0 };

    #[must_use]
    pub const fn is_centered(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Full deflection toward the active directions.
    #[must_use]
    pub const fn from_directions(dirs: DirectionalResult) -> Self {
        let x = if dirs.left {
            -AXIS_MAX
        } else if dirs.right {
            AXIS_MAX
        } else {
            0
        };
        let y = if dirs.up {
            -AXIS_MAX
        } else if dirs.down {
            AXIS_MAX
        } else {
            0
        };
        Self { x, y }
    }
}

/// A normalized ADC pair and how it is to be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalogAxis {
    pub position: StickPosition,
    pub mode: StickMode,
}

/// Applies a deadzone to a normalized input.
///
/// Input and output are in the range -1.0 to 1.0, where 0.0 is center.
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    /// Deadzone as a fraction (0.0 to 0.25).
    deadzone: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self { deadzone: 0.05 }
    }
}

impl Calibration {
    /// Creates a calibration with the given deadzone, clamped to 0.0..=0.25.
    #[must_use]
    pub fn new(deadzone: f32) -> Self {
        Self {
            deadzone: deadzone.clamp(0.0, 0.25),
        }
    }

    #[must_use]
    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    /// Applies the deadzone to a normalized input (-1.0 to 1.0).
    #[must_use]
    pub fn apply(&self, input: f32) -> f32 {
        let abs_input = input.abs();
        if abs_input <= self.deadzone {
            0.0
        } else {
            input.signum() * (abs_input - self.deadzone) / (1.0 - self.deadzone)
        }
    }
}

/// Converts a raw ADC reading (0-4095) to -1.0..1.0.
///
/// ```
/// use gamepad_pipeline::input::analog::normalize_adc;
///
/// assert!((normalize_adc(0) - (-1.0)).abs() < 0.001);
/// assert_eq!(normalize_adc(2048), 0.0);
/// assert!((normalize_adc(4095) - 1.0).abs() < 0.001);
/// ```
#[must_use]
pub fn normalize_adc(raw: u16) -> f32 {
    let centered = f32::from(raw.min(ADC_MAX)) - f32::from(ADC_CENTER);
    (centered / f32::from(ADC_MAX - ADC_CENTER)).clamp(-1.0, 1.0)
}

/// Scales a normalized value to the signed axis range.
#[must_use]
pub fn to_axis(normalized: f32) -> i16 {
    (normalized.clamp(-1.0, 1.0) * f32::from(AXIS_MAX)).round() as i16
}

/// Per-pair settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairSettings {
    pub mode: StickMode,
    pub invert: Invert,
    /// Whether either channel of the pair is bound to a pin.
    pub bound: bool,
}

/// Normalizes both ADC pairs for a cycle.
#[derive(Debug, Clone)]
pub struct AnalogNormalizer {
    calibration: Calibration,
    /// Minimum deflection (in axis units) that registers a digital direction.
    threshold: i16,
    pairs: [PairSettings; 2],
}

impl AnalogNormalizer {
    /// Creates a normalizer.
    ///
    /// # Arguments
    ///
    /// * `deadzone` - Deadzone fraction (0.0 to 0.25)
    /// * `digital_threshold` - Fraction of full deflection that counts as a press in digital mode
    /// * `pairs` - Settings for ADC pair 1 and 2
    #[must_use]
    pub fn new(deadzone: f32, digital_threshold: f32, pairs: [PairSettings; 2]) -> Self {
        Self {
            calibration: Calibration::new(deadzone),
            threshold: to_axis(digital_threshold.clamp(0.0, 1.0)).max(1),
            pairs,
        }
    }

    /// Normalizes one raw pair. Unbound pairs are `None`.
    #[must_use]
    pub fn normalize_pair(&self, pair: usize, raw_x: u16, raw_y: u16) -> Option<AnalogAxis> {
        let settings = self.pairs.get(pair)?;
        if !settings.bound {
            return None;
        }

        let mut x = to_axis(self.calibration.apply(normalize_adc(raw_x)));
        let mut y = to_axis(self.calibration.apply(normalize_adc(raw_y)));
        if settings.invert.x() {
            x = -x;
        }
        if settings.invert.y() {
            y = -y;
        }

        Some(AnalogAxis {
            position: StickPosition { x, y },
            mode: settings.mode,
        })
    }

    /// Normalizes both pairs from raw channels `[adc1_x, adc1_y, adc2_x, adc2_y]`.
    #[must_use]
    pub fn normalize(&self, raw: &[u16; 4]) -> [Option<AnalogAxis>; 2] {
        [
            self.normalize_pair(0, raw[0], raw[1]),
            self.normalize_pair(1, raw[2], raw[3]),
        ]
    }

    /// Threshold test turning a digital-mode axis into directions.
    #[must_use]
    pub fn to_directions(&self, position: StickPosition) -> DirectionalResult {
        DirectionalResult {
            up: position.y <= -self.threshold,
            down: position.y >= self.threshold,
            left: position.x <= -self.threshold,
            right: position.x >= self.threshold,
        }
    }

    /// Directions from every pair in digital mode, OR-merged.
    #[must_use]
    pub fn digital_directions(&self, axes: &[Option<AnalogAxis>; 2]) -> DirectionalResult {
        axes.iter()
            .flatten()
            .filter(|axis| axis.mode == StickMode::Digital)
            .fold(DirectionalResult::NEUTRAL, |acc, axis| {
                acc.or(self.to_directions(axis.position))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(mode: StickMode, invert: Invert) -> PairSettings {
        PairSettings { mode, invert, bound: true }
    }

    // ==================== Calibration Tests ====================

    #[test]
    fn test_calibration_clamps_deadzone() {
        assert!((Calibration::new(0.5).deadzone() - 0.25).abs() < 0.001);
        assert_eq!(Calibration::new(-0.1).deadzone(), 0.0);
    }

    #[test]
    fn test_deadzone_within_zone() {
        let cal = Calibration::new(0.1);
        assert_eq!(cal.apply(0.05), 0.0);
        assert_eq!(cal.apply(-0.1), 0.0);
    }

    #[test]
    fn test_deadzone_rescales_outside_zone() {
        let cal = Calibration::new(0.1);
        assert!((cal.apply(0.55) - 0.5).abs() < 0.001);
        assert!((cal.apply(-0.55) + 0.5).abs() < 0.001);
        assert!((cal.apply(1.0) - 1.0).abs() < 0.001);
    }

    // ==================== Normalization Tests ====================

    #[test]
    fn test_normalize_adc_range() {
        assert_eq!(normalize_adc(0), -1.0);
        assert_eq!(normalize_adc(ADC_CENTER), 0.0);
        assert_eq!(normalize_adc(ADC_MAX), 1.0);
        assert_eq!(normalize_adc(u16::MAX), 1.0);
    }

    #[test]
    fn test_to_axis_bounds() {
        assert_eq!(to_axis(1.0), AXIS_MAX);
        assert_eq!(to_axis(-1.0), -AXIS_MAX);
        assert_eq!(to_axis(0.0), 0);
        assert_eq!(to_axis(5.0), AXIS_MAX);
    }

    #[test]
    fn test_unbound_pair_is_none() {
        let normalizer = AnalogNormalizer::new(0.05, 0.5, [PairSettings::default(); 2]);
        assert_eq!(normalizer.normalize(&[0, 0, ADC_MAX, ADC_MAX]), [None, None]);
    }

    #[test]
    fn test_centered_pair_reports_center() {
        let normalizer =
            AnalogNormalizer::new(0.05, 0.5, [pair(StickMode::LeftAnalog, Invert::None), PairSettings::default()]);
        let axis = normalizer.normalize_pair(0, ADC_CENTER, ADC_CENTER).unwrap();
        assert!(axis.position.is_centered());
        assert_eq!(axis.mode, StickMode::LeftAnalog);
    }

    #[test]
    fn test_invert_is_independent_per_axis() {
        let plain = AnalogNormalizer::new(0.0, 0.5, [pair(StickMode::LeftAnalog, Invert::None); 2]);
        let inv_x = AnalogNormalizer::new(0.0, 0.5, [pair(StickMode::LeftAnalog, Invert::X); 2]);
        let inv_y = AnalogNormalizer::new(0.0, 0.5, [pair(StickMode::LeftAnalog, Invert::Y); 2]);
        let inv_xy = AnalogNormalizer::new(0.0, 0.5, [pair(StickMode::LeftAnalog, Invert::Xy); 2]);

        let p = plain.normalize_pair(0, ADC_MAX, 0).unwrap().position;
        assert_eq!(p, StickPosition { x: AXIS_MAX, y: -AXIS_MAX });

        assert_eq!(inv_x.normalize_pair(0, ADC_MAX, 0).unwrap().position, StickPosition { x: -AXIS_MAX, y: -AXIS_MAX });
        assert_eq!(inv_y.normalize_pair(0, ADC_MAX, 0).unwrap().position, StickPosition { x: AXIS_MAX, y: AXIS_MAX });
        assert_eq!(inv_xy.normalize_pair(0, ADC_MAX, 0).unwrap().position, StickPosition { x: -AXIS_MAX, y: AXIS_MAX });
    }

    // ==================== Digital Emulation Tests ====================

    #[test]
    fn test_threshold_directions() {
        let normalizer = AnalogNormalizer::new(0.0, 0.5, [pair(StickMode::Digital, Invert::None); 2]);

        let dirs = normalizer.to_directions(StickPosition { x: 20000, y: -20000 });
        assert!(dirs.right && dirs.up);
        assert!(!dirs.left && !dirs.down);

        let dirs = normalizer.to_directions(StickPosition { x: 10000, y: 0 });
        assert!(!dirs.any());
    }

    #[test]
    fn test_digital_directions_skips_passthrough_pairs() {
        let normalizer = AnalogNormalizer::new(
            0.0,
            0.5,
            [pair(StickMode::Digital, Invert::None), pair(StickMode::RightAnalog, Invert::None)],
        );
        let axes = normalizer.normalize(&[ADC_MAX, ADC_CENTER, 0, ADC_CENTER]);
        let dirs = normalizer.digital_directions(&axes);
        assert!(dirs.right);
        assert!(!dirs.left);
    }
}
