//! # SOCD Resolver
//!
//! Resolves simultaneous opposing cardinal directions for one directional
//! source.
//!
//! ## Modes
//!
//! | Mode | Up + Down | Left + Right |
//! |------|-----------|--------------|
//! | `neutral` | neither | neither |
//! | `up_priority` | up | neither |
//! | `second_input_priority` | most recently pressed | most recently pressed |
//! | `first_input_priority` | first pressed | first pressed |
//!
//! Press order is remembered per axis as the direction that was last held on
//! its own. When both directions of a pair go down in the same cycle there is
//! no order to go by, and the pair stays neutral until one is released.
//!
//! ## Usage
//!
//! ```
//! use gamepad_pipeline::input::directional::DirectionalResult;
//! use gamepad_pipeline::input::socd::{SocdMode, SocdResolver};
//!
//! let mut resolver = SocdResolver::new();
//! let up = DirectionalResult { up: true, ..DirectionalResult::NEUTRAL };
//! let both = DirectionalResult { up: true, down: true, ..DirectionalResult::NEUTRAL };
//!
//! resolver.resolve(up, SocdMode::SecondInputPriority);
//! let out = resolver.resolve(both, SocdMode::SecondInputPriority);
//! assert!(out.down && !out.up);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::directional::DirectionalResult;

/// SOCD cleaning policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SocdMode {
    #[default]
    Neutral,
    UpPriority,
    SecondInputPriority,
    FirstInputPriority,
}

impl SocdMode {
    /// Every mode.
    pub const ALL: [SocdMode; 4] = [
        Self::Neutral,
        Self::UpPriority,
        Self::SecondInputPriority,
        Self::FirstInputPriority,
    ];
}

impl fmt::Display for SocdMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Neutral => "neutral",
            Self::UpPriority => "up_priority",
            Self::SecondInputPriority => "second_input_priority",
            Self::FirstInputPriority => "first_input_priority",
        })
    }
}

/// Which direction of a pair was last held on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum LastHeld {
    #[default]
    None,
    /// Up or left
    Negative,
    /// Down or right
    Positive,
}

/// Stateful resolver for one directional source.
///
/// The only state is press order; everything else is a function of the
/// current input and mode.
#[derive(Debug, Clone, Default)]
pub struct SocdResolver {
    vertical: LastHeld,
    horizontal: LastHeld,
}

impl SocdResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves one cycle of debounced directions.
    ///
    /// The result never has both directions of a pair active.
    pub fn resolve(&mut self, input: DirectionalResult, mode: SocdMode) -> DirectionalResult {
        let (up, down) = resolve_pair(input.up, input.down, &mut self.vertical, mode, true);
        let (left, right) = resolve_pair(input.left, input.right, &mut self.horizontal, mode, false);
        DirectionalResult { up, down, left, right }
    }

    /// Forgets press order.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn resolve_pair(
    negative: bool,
    positive: bool,
    last: &mut LastHeld,
    mode: SocdMode,
    vertical: bool,
) -> (bool, bool) {
    match (negative, positive) {
        (true, true) => match mode {
            SocdMode::UpPriority if vertical => (true, false),
            SocdMode::SecondInputPriority => match *last {
                LastHeld::Negative => (false, true),
                LastHeld::Positive => (true, false),
                LastHeld::None => (false, false),
            },
            SocdMode::FirstInputPriority => match *last {
                LastHeld::Negative => (true, false),
                LastHeld::Positive => (false, true),
                LastHeld::None => (false, false),
            },
            _ => (false, false),
        },
        (true, false) => {
            *last = LastHeld::Negative;
            (true, false)
        }
        (false, true) => {
            *last = LastHeld::Positive;
            (false, true)
        }
        (false, false) => {
            *last = LastHeld::None;
            (false, false)
        }
    }
}

/// Slot modes selectable with the SOCD sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocdSlots {
    pub slot_one: SocdMode,
    pub slot_two: SocdMode,
    /// Mode when sliders are bound but neither is active. Falls back to the
    /// runtime default when unset.
    pub slot_default: Option<SocdMode>,
}

impl Default for SocdSlots {
    fn default() -> Self {
        Self {
            slot_one: SocdMode::UpPriority,
            slot_two: SocdMode::SecondInputPriority,
            slot_default: None,
        }
    }
}

/// Selects the SOCD mode for this cycle.
///
/// Slider states are `None` when the slider is unbound. Slot one wins when
/// both sliders are active.
///
/// ```
/// use gamepad_pipeline::input::socd::{select_socd_mode, SocdMode, SocdSlots};
///
/// let slots = SocdSlots::default();
/// assert_eq!(select_socd_mode(None, None, &slots, SocdMode::Neutral), SocdMode::Neutral);
/// assert_eq!(select_socd_mode(Some(true), Some(true), &slots, SocdMode::Neutral), slots.slot_one);
/// ```
#[must_use]
pub fn select_socd_mode(
    slider_one: Option<bool>,
    slider_two: Option<bool>,
    slots: &SocdSlots,
    default: SocdMode,
) -> SocdMode {
    match (slider_one, slider_two) {
        (None, None) => default,
        (Some(true), _) => slots.slot_one,
        (_, Some(true)) => slots.slot_two,
        _ => slots.slot_default.unwrap_or(default),
    }
}
