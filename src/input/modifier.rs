//! # Modifier Overlay
//!
//! Turbo and hotkey-triggered runtime mode changes.
//!
//! ## Turbo
//!
//! Turbo only exists when the turbo pin is bound. A turbo-enabled button held
//! down is reported on for the first half of each turbo period and off for the
//! second half. The phase comes from the pipeline's cycle counter, so every
//! turbo button toggles in step with the others.
//!
//! Holding the turbo button and pressing a button toggles turbo for that
//! button. Nothing is reported for buttons pressed while turbo is held.
//!
//! ## Hotkeys
//!
//! | Combo | Direction | Effect |
//! |-------|-----------|--------|
//! | `S1 + S2` or `Fn` | Left | D-pad mode: left analog |
//! | `S1 + S2` or `Fn` | Down | D-pad mode: digital |
//! | `S1 + S2` or `Fn` | Right | D-pad mode: right analog |
//! | `S2 + A1` | Up | SOCD: up priority |
//! | `S2 + A1` | Down | SOCD: neutral |
//! | `S2 + A1` | Left | SOCD: second input priority |
//! | `S2 + A1` | Right | SOCD: first input priority |
//!
//! D-pad mode hotkeys are disabled when the LS/RS sliders are bound. While a
//! hotkey is held its combo buttons and all directions are left out of the
//! report. Mode changes take effect from the next cycle.

use tracing::{debug, info};

use super::analog::StickMode;
use super::directional::DirectionalOutputs;
use super::logical::LogicalInput;
use super::socd::SocdMode;
use super::state::{Button, Buttons};

/// Stable digital state of every input.
type Stable = [bool; LogicalInput::COUNT];

/// Turbo timing derived from the cycle rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurboClock {
    /// Cycles per on/off period.
    period: u64,
}

impl TurboClock {
    /// Creates a clock toggling `shots_per_second` times per second at `cycle_hz`.
    ///
    /// The period is rounded to the nearest whole cycle and is at least two
    /// cycles, so there is always an on and an off half.
    #[must_use]
    pub fn new(cycle_hz: u32, shots_per_second: u32) -> Self {
        let shots = u64::from(shots_per_second.max(1));
        let period = (u64::from(cycle_hz) + shots / 2) / shots;
        Self { period: period.max(2) }
    }

    #[must_use]
    pub fn period(&self) -> u64 {
        self.period
    }

    /// Turbo phase on `cycle`: `true` while turbo buttons are reported.
    #[inline]
    #[must_use]
    pub fn phase(&self, cycle: u64) -> bool {
        cycle % self.period < self.period / 2
    }
}

/// A runtime mode change requested by a hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    DpadMode(StickMode),
    SocdMode(SocdMode),
}

/// Finds the hotkey held this cycle, with the buttons that make up its combo.
///
/// The d-pad combo is checked before the SOCD combo. Directions are checked
/// in up, down, left, right order.
#[must_use]
pub fn detect_hotkey(stable: &Stable, dpad_hotkeys: bool) -> Option<(Hotkey, Buttons)> {
    let held = |input: LogicalInput| stable[input.index()];
    let up = held(LogicalInput::DpadUp);
    let down = held(LogicalInput::DpadDown);
    let left = held(LogicalInput::DpadLeft);
    let right = held(LogicalInput::DpadRight);

    let s1_s2 = held(LogicalInput::S1) && held(LogicalInput::S2);
    if dpad_hotkeys && (s1_s2 || held(LogicalInput::Fn)) {
        let mode = if down {
            Some(StickMode::Digital)
        } else if left {
            Some(StickMode::LeftAnalog)
        } else if right {
            Some(StickMode::RightAnalog)
        } else {
            None
        };
        if let Some(mode) = mode {
            let combo = if s1_s2 {
                [Button::S1, Button::S2].into_iter().collect()
            } else {
                Buttons::NONE
            };
            return Some((Hotkey::DpadMode(mode), combo));
        }
    }

    if held(LogicalInput::S2) && held(LogicalInput::A1) {
        let mode = if up {
            Some(SocdMode::UpPriority)
        } else if down {
            Some(SocdMode::Neutral)
        } else if left {
            Some(SocdMode::SecondInputPriority)
        } else if right {
            Some(SocdMode::FirstInputPriority)
        } else {
            None
        };
        if let Some(mode) = mode {
            let combo = [Button::S2, Button::A1].into_iter().collect();
            return Some((Hotkey::SocdMode(mode), combo));
        }
    }

    None
}

/// Selects the d-pad mode for this cycle from the LS/RS sliders.
///
/// Slider states are `None` when unbound. Slider one wins when both are held.
#[must_use]
pub fn select_dpad_mode(slider_one: Option<bool>, slider_two: Option<bool>, default: StickMode) -> StickMode {
    match (slider_one, slider_two) {
        (None, None) => default,
        (Some(true), _) => StickMode::LeftAnalog,
        (_, Some(true)) => StickMode::RightAnalog,
        _ => StickMode::Digital,
    }
}

/// Overlay settings.
#[derive(Debug, Clone)]
pub struct OverlaySettings {
    /// Turbo clock, `None` when the turbo pin is unbound.
    pub turbo: Option<TurboClock>,
    /// Buttons with turbo enabled at startup.
    pub turbo_buttons: Buttons,
    /// Disables every hotkey.
    pub hotkeys_locked: bool,
    /// Whether the LS/RS sliders are bound (disables d-pad hotkeys).
    pub dpad_sliders_bound: bool,
}

/// What the overlay reports for a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayOutput {
    pub buttons: Buttons,
    pub turbo_phase: bool,
    pub turbo_buttons: Buttons,
}

/// Turbo and hotkey state.
#[derive(Debug, Clone)]
pub struct ModifierOverlay {
    settings: OverlaySettings,
    turbo_buttons: Buttons,
    previous_buttons: Buttons,
    socd_override: Option<SocdMode>,
    dpad_override: Option<StickMode>,
}

impl ModifierOverlay {
    #[must_use]
    pub fn new(settings: OverlaySettings) -> Self {
        Self {
            turbo_buttons: settings.turbo_buttons,
            settings,
            previous_buttons: Buttons::NONE,
            socd_override: None,
            dpad_override: None,
        }
    }

    /// Runtime SOCD default: the hotkey override, or `configured`.
    #[must_use]
    pub fn socd_default(&self, configured: SocdMode) -> SocdMode {
        self.socd_override.unwrap_or(configured)
    }

    /// Runtime d-pad mode default: the hotkey override, or `configured`.
    #[must_use]
    pub fn dpad_default(&self, configured: StickMode) -> StickMode {
        self.dpad_override.unwrap_or(configured)
    }

    #[must_use]
    pub fn turbo_buttons(&self) -> Buttons {
        self.turbo_buttons
    }

    /// Applies hotkeys and turbo to one cycle.
    ///
    /// `buttons` are the debounced buttons. Directions are cleared in place
    /// while a hotkey is held.
    pub fn apply(
        &mut self,
        cycle: u64,
        stable: &Stable,
        buttons: Buttons,
        directions: &mut DirectionalOutputs,
    ) -> OverlayOutput {
        let mut reported = buttons;

        if !self.settings.hotkeys_locked {
            if let Some((hotkey, combo)) = detect_hotkey(stable, !self.settings.dpad_sliders_bound) {
                self.trigger(hotkey);
                reported = reported.difference(combo);
                *directions = DirectionalOutputs::default();
            }
        }

        let (turbo_phase, turbo_buttons) = match self.settings.turbo {
            Some(clock) => {
                if stable[LogicalInput::Turbo.index()] {
                    let pressed = buttons.difference(self.previous_buttons);
                    for button in pressed.iter() {
                        let enabled = !self.turbo_buttons.is_pressed(button);
                        self.turbo_buttons.set(button, enabled);
                        info!("Turbo {} for {:?}", if enabled { "enabled" } else { "disabled" }, button);
                    }
                    reported = Buttons::NONE;
                }
                let phase = clock.phase(cycle);
                if !phase {
                    reported = reported.difference(self.turbo_buttons);
                }
                (phase, self.turbo_buttons)
            }
            None => (false, Buttons::NONE),
        };

        self.previous_buttons = buttons;

        OverlayOutput {
            buttons: reported,
            turbo_phase,
            turbo_buttons,
        }
    }

    fn trigger(&mut self, hotkey: Hotkey) {
        match hotkey {
            Hotkey::DpadMode(mode) => {
                if self.dpad_override != Some(mode) {
                    info!("Hotkey: d-pad mode set to {:?}", mode);
                    self.dpad_override = Some(mode);
                }
            }
            Hotkey::SocdMode(mode) => {
                if self.socd_override != Some(mode) {
                    info!("Hotkey: SOCD mode set to {}", mode);
                    self.socd_override = Some(mode);
                }
            }
        }
        debug!("Hotkey held: {:?}", hotkey);
    }
}
