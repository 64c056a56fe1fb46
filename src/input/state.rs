//! # Controller State
//!
//! The canonical, protocol-agnostic snapshot produced once per cycle, and the
//! aggregation step that assembles it.
//!
//! A [`ControllerState`] is `Copy` and is always built whole by [`aggregate`].
//! Consumers (report encoders, display) only ever see a complete snapshot of a
//! single cycle.
//!
//! ## Stick Routing
//!
//! | Source | Target |
//! |--------|--------|
//! | Analog pair in passthrough mode | Its stick, continuous value |
//! | Secondary directional output | Hat or full stick deflection per its mode |
//! | Primary directional output | Hat or full stick deflection per the d-pad mode |
//!
//! Later rows win over earlier ones, but only when they carry an active
//! direction. The hat never reports both directions of a pair.
//!
//! ## Usage
//!
//! ```
//! use gamepad_pipeline::input::state::{Button, ControllerState};
//!
//! let state = ControllerState::default();
//! assert!(!state.buttons.is_pressed(Button::B1));
//! assert!(state.is_neutral());
//! ```

use serde::{Deserialize, Serialize};

use super::analog::{AnalogAxis, StickMode, StickPosition};
use super::directional::{DirectionalOutputs, DirectionalResult};
use super::socd::SocdMode;
use super::source::DegradedMask;

/// A reportable controller button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
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
}

impl Button {
    /// Number of reportable buttons.
    pub const COUNT: usize = 14;

    /// Every button in bit order.
    pub const ALL: [Button; Self::COUNT] = [
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
    ];

    #[inline]
    #[must_use]
    pub const fn mask(self) -> u16 {
        1 << (self as u16)
    }
}

/// Pressed state of every reportable button, one bit each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Buttons(u16);

impl Buttons {
    /// No buttons pressed.
    pub const NONE: Buttons = Buttons(0);

    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & ((1 << Button::COUNT) - 1))
    }

    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_pressed(self, button: Button) -> bool {
        self.0 & button.mask() != 0
    }

    /// Sets or clears a single button.
    #[inline]
    pub fn set(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.0 |= button.mask();
        } else {
            self.0 &= !button.mask();
        }
    }

    /// Returns a copy with `button` pressed.
    #[must_use]
    pub fn with(mut self, button: Button) -> Self {
        self.set(button, true);
        self
    }

    #[must_use]
    pub const fn any(self) -> bool {
        self.0 != 0
    }

    #[must_use]
    pub const fn intersection(self, other: Buttons) -> Buttons {
        Buttons(self.0 & other.0)
    }

    #[must_use]
    pub const fn difference(self, other: Buttons) -> Buttons {
        Buttons(self.0 & !other.0)
    }

    /// Iterates the pressed buttons in bit order.
    pub fn iter(self) -> impl Iterator<Item = Button> {
        Button::ALL.into_iter().filter(move |b| self.is_pressed(*b))
    }
}

impl FromIterator<Button> for Buttons {
    fn from_iter<I: IntoIterator<Item = Button>>(iter: I) -> Self {
        iter.into_iter().fold(Buttons::NONE, Buttons::with)
    }
}

/// Flags owned by the modifier overlay, plus input health.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModifierFlags {
    /// SOCD mode used this cycle.
    pub socd_mode: SocdMode,
    /// Where the primary directional output was routed this cycle.
    pub dpad_mode: StickMode,
    /// Turbo phase for this cycle (`true` = reported on). Always `false`
    /// when turbo is not configured.
    pub turbo_phase: bool,
    /// Buttons with turbo enabled.
    pub turbo_buttons: Buttons,
    /// Whether directional reversal was applied this cycle.
    pub reversed: bool,
    /// Inputs whose reads have been failing for longer than the fault threshold.
    pub degraded: DegradedMask,
}

/// Canonical controller state for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ControllerState {
    /// Cycle number this snapshot was produced on.
    pub cycle: u64,
    /// Digital directional output (hat).
    pub hat: DirectionalResult,
    /// Reportable buttons.
    pub buttons: Buttons,
    /// Left stick position.
    pub left_stick: StickPosition,
    /// Right stick position.
    pub right_stick: StickPosition,
    /// Modifier and health flags.
    pub modifiers: ModifierFlags,
}

impl ControllerState {
    /// True when no direction, button or stick deflection is reported.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        !self.hat.any()
            && !self.buttons.any()
            && self.left_stick.is_centered()
            && self.right_stick.is_centered()
    }

    /// Compares everything except the cycle number.
    #[must_use]
    pub fn same_input(&self, other: &ControllerState) -> bool {
        ControllerState { cycle: 0, ..*self } == ControllerState { cycle: 0, ..*other }
    }
}

/// Everything the aggregator needs from one cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleOutputs {
    pub cycle: u64,
    pub directions: DirectionalOutputs,
    pub buttons: Buttons,
    pub analog: [Option<AnalogAxis>; 2],
    pub modifiers: ModifierFlags,
}

/// Assembles the canonical state for a cycle.
#[must_use]
pub fn aggregate(outputs: &CycleOutputs) -> ControllerState {
    let mut state = ControllerState {
        cycle: outputs.cycle,
        hat: DirectionalResult::NEUTRAL,
        buttons: outputs.buttons,
        left_stick: StickPosition::CENTER,
        right_stick: StickPosition::CENTER,
        modifiers: outputs.modifiers,
    };

    for axis in outputs.analog.iter().flatten() {
        match axis.mode {
            StickMode::LeftAnalog => state.left_stick = axis.position,
            StickMode::RightAnalog => state.right_stick = axis.position,
            StickMode::Digital => {}
        }
    }

    if let Some((secondary, mode)) = outputs.directions.secondary {
        place(&mut state, secondary, mode);
    }
    place(&mut state, outputs.directions.primary, outputs.modifiers.dpad_mode);

    state
}

fn place(state: &mut ControllerState, dirs: DirectionalResult, mode: StickMode) {
    if !dirs.any() {
        return;
    }
    match mode {
        StickMode::Digital => state.hat = dirs,
        StickMode::LeftAnalog => state.left_stick = StickPosition::from_directions(dirs),
        StickMode::RightAnalog => state.right_stick = StickPosition::from_directions(dirs),
    }
}
