//! # Logical Inputs
//!
//! Identifiers for every controller function a board can bind to a pin.
//!
//! ## Digital Inputs
//!
//! | Group | Inputs |
//! |-------|--------|
//! | D-Pad | `dpad_up`, `dpad_down`, `dpad_left`, `dpad_right` |
//! | Face / shoulder | `b1`..`b4`, `l1`, `r1`, `l2`, `r2` |
//! | System | `s1`, `s2`, `l3`, `r3`, `a1`, `a2` |
//! | Modifiers | `fn`, `reverse`, `turbo` |
//! | Sliders | `slider_one`, `slider_two`, `slider_socd_one`, `slider_socd_two` |
//! | Dual directional | `dual_up`, `dual_down`, `dual_left`, `dual_right` |
//!
//! The snake_case names are the keys used in the `[pins]` config table.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::state::Button;

/// A single digital controller function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalInput {
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    B1,
    B2,
    B3,
    B4,
    L1,
    R1,
    L2,
    R2,
    S1,
    S2,
    L3,
    R3,
    A1,
    A2,
    Fn,
    Reverse,
    Turbo,
    SliderOne,
    SliderTwo,
    SliderSocdOne,
    SliderSocdTwo,
    DualUp,
    DualDown,
    DualLeft,
    DualRight,
}

impl LogicalInput {
    /// Number of digital logical inputs.
    pub const COUNT: usize = 29;

    /// Every logical input in index order.
    pub const ALL: [LogicalInput; Self::COUNT] = [
        Self::DpadUp,
        Self::DpadDown,
        Self::DpadLeft,
        Self::DpadRight,
        Self::B1,
        Self::B2,
        Self::B3,
        Self::B4,
        Self::L1,
        Self::R1,
        Self::L2,
        Self::R2,
        Self::S1,
        Self::S2,
        Self::L3,
        Self::R3,
        Self::A1,
        Self::A2,
        Self::Fn,
        Self::Reverse,
        Self::Turbo,
        Self::SliderOne,
        Self::SliderTwo,
        Self::SliderSocdOne,
        Self::SliderSocdTwo,
        Self::DualUp,
        Self::DualDown,
        Self::DualLeft,
        Self::DualRight,
    ];

    /// Stable array index of this input.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Config key for this input.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DpadUp => "dpad_up",
            Self::DpadDown => "dpad_down",
            Self::DpadLeft => "dpad_left",
            Self::DpadRight => "dpad_right",
            Self::B1 => "b1",
            Self::B2 => "b2",
            Self::B3 => "b3",
            Self::B4 => "b4",
            Self::L1 => "l1",
            Self::R1 => "r1",
            Self::L2 => "l2",
            Self::R2 => "r2",
            Self::S1 => "s1",
            Self::S2 => "s2",
            Self::L3 => "l3",
            Self::R3 => "r3",
            Self::A1 => "a1",
            Self::A2 => "a2",
            Self::Fn => "fn",
            Self::Reverse => "reverse",
            Self::Turbo => "turbo",
            Self::SliderOne => "slider_one",
            Self::SliderTwo => "slider_two",
            Self::SliderSocdOne => "slider_socd_one",
            Self::SliderSocdTwo => "slider_socd_two",
            Self::DualUp => "dual_up",
            Self::DualDown => "dual_down",
            Self::DualLeft => "dual_left",
            Self::DualRight => "dual_right",
        }
    }

    /// The reportable button this input drives, if any.
    ///
    /// Directions, modifiers and sliders are not buttons.
    #[must_use]
    pub const fn as_button(self) -> Option<Button> {
        match self {
            Self::B1 => Some(Button::B1),
            Self::B2 => Some(Button::B2),
            Self::B3 => Some(Button::B3),
            Self::B4 => Some(Button::B4),
            Self::L1 => Some(Button::L1),
            Self::R1 => Some(Button::R1),
            Self::L2 => Some(Button::L2),
            Self::R2 => Some(Button::R2),
            Self::S1 => Some(Button::S1),
            Self::S2 => Some(Button::S2),
            Self::L3 => Some(Button::L3),
            Self::R3 => Some(Button::R3),
            Self::A1 => Some(Button::A1),
            Self::A2 => Some(Button::A2),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An analog channel of one of the two ADC stick pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalogInput {
    Adc1X,
    Adc1Y,
    Adc2X,
    Adc2Y,
}

impl AnalogInput {
    /// Number of analog channels.
    pub const COUNT: usize = 4;

    /// Every analog channel in index order.
    pub const ALL: [AnalogInput; Self::COUNT] = [Self::Adc1X, Self::Adc1Y, Self::Adc2X, Self::Adc2Y];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Adc1X => "adc1.x_pin",
            Self::Adc1Y => "adc1.y_pin",
            Self::Adc2X => "adc2.x_pin",
            Self::Adc2Y => "adc2.y_pin",
        }
    }
}

impl fmt::Display for AnalogInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The four cardinal inputs of one directional source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionalInputs {
    pub up: LogicalInput,
    pub down: LogicalInput,
    pub left: LogicalInput,
    pub right: LogicalInput,
}

/// Main d-pad inputs.
pub const DPAD: DirectionalInputs = DirectionalInputs {
    up: LogicalInput::DpadUp,
    down: LogicalInput::DpadDown,
    left: LogicalInput::DpadLeft,
    right: LogicalInput::DpadRight,
};

/// Dual directional add-on inputs.
pub const DUAL: DirectionalInputs = DirectionalInputs {
    up: LogicalInput::DualUp,
    down: LogicalInput::DualDown,
    left: LogicalInput::DualLeft,
    right: LogicalInput::DualRight,
};
