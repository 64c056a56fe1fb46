//! # Configuration Module
//!
//! Handles loading and validating board configuration from TOML files.
//!
//! A configuration binds logical inputs to GPIO/ADC pins (`-1` or an absent
//! key means disabled) and selects the default behavior of every pipeline
//! stage:
//!
//! ```toml
//! [pipeline]
//! cycle_hz = 1000
//!
//! [pins]
//! dpad_up = 10
//! dpad_down = 12
//! b1 = 9
//! turbo = -1
//!
//! [socd]
//! default_mode = "neutral"
//!
//! [analog.adc1]
//! x_pin = 26
//! y_pin = 27
//! mode = "left_analog"
//! ```
//!
//! Validation builds a fixed-size [`BindingTable`] and rejects any pin bound
//! to more than one input.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::input::analog::{Invert, StickMode};
use crate::input::directional::{CombineMode, ReverseMask};
use crate::input::logical::{AnalogInput, LogicalInput};
use crate::input::socd::{SocdMode, SocdSlots};
use crate::input::state::{Button, Buttons};

/// Highest GPIO number on the board.
pub const MAX_GPIO_PIN: i32 = 29;

/// GPIO pins wired to the ADC.
pub const ADC_PINS: std::ops::RangeInclusive<i32> = 26..=29;

/// Config value for an unbound input.
pub const DISABLED: i32 = -1;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Pin per logical input. Absent keys are disabled.
    #[serde(default)]
    pub pins: BTreeMap<LogicalInput, i32>,

    #[serde(default)]
    pub socd: SocdConfig,

    #[serde(default)]
    pub dpad: DpadConfig,

    #[serde(default)]
    pub reverse: ReverseConfig,

    #[serde(default)]
    pub analog: AnalogConfig,

    #[serde(default)]
    pub dual_directional: DualDirectionalConfig,

    #[serde(default)]
    pub turbo: TurboConfig,

    #[serde(default)]
    pub debounce: DebounceConfig,

    #[serde(default)]
    pub hotkeys: HotkeyConfig,
}

/// Cycle timing and fault handling
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_cycle_hz")]
    pub cycle_hz: u32,

    #[serde(default = "default_fault_threshold")]
    pub fault_threshold: u16,
}

/// SOCD defaults and slider slots
#[derive(Debug, Deserialize, Clone)]
pub struct SocdConfig {
    #[serde(default)]
    pub default_mode: SocdMode,

    #[serde(default = "default_slot_one")]
    pub slot_one: SocdMode,

    #[serde(default = "default_slot_two")]
    pub slot_two: SocdMode,

    #[serde(default)]
    pub slot_default: Option<SocdMode>,
}

/// Main d-pad routing
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DpadConfig {
    #[serde(default)]
    pub default_mode: StickMode,
}

/// Directional reversal
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReverseConfig {
    #[serde(default)]
    pub up: bool,

    #[serde(default)]
    pub down: bool,

    #[serde(default)]
    pub left: bool,

    #[serde(default)]
    pub right: bool,

    /// Apply the mask permanently instead of while the reverse button is held.
    #[serde(default)]
    pub always: bool,
}

/// ADC stick pairs
#[derive(Debug, Deserialize, Clone)]
pub struct AnalogConfig {
    #[serde(default = "default_deadzone")]
    pub deadzone: f32,

    #[serde(default = "default_digital_threshold")]
    pub digital_threshold: f32,

    #[serde(default)]
    pub adc1: AdcPairConfig,

    #[serde(default)]
    pub adc2: AdcPairConfig,
}

/// One ADC pair
#[derive(Debug, Deserialize, Clone)]
pub struct AdcPairConfig {
    #[serde(default = "default_disabled")]
    pub x_pin: i32,

    #[serde(default = "default_disabled")]
    pub y_pin: i32,

    /// Defaults to left analog for pair 1 and right analog for pair 2.
    #[serde(default)]
    pub mode: Option<StickMode>,

    #[serde(default)]
    pub invert: Invert,
}

/// Dual directional add-on
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DualDirectionalConfig {
    #[serde(default)]
    pub stick_mode: StickMode,

    #[serde(default)]
    pub combine_mode: CombineMode,
}

/// Turbo
#[derive(Debug, Deserialize, Clone)]
pub struct TurboConfig {
    #[serde(default = "default_shots_per_second")]
    pub shots_per_second: u32,

    /// Buttons with turbo enabled at startup.
    #[serde(default)]
    pub buttons: Vec<Button>,
}

/// Debounce window
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DebounceConfig {
    /// Minimum time a new level must hold before it is accepted. Unset means
    /// a single sample.
    #[serde(default)]
    pub window_ms: Option<u32>,
}

/// Hotkeys
#[derive(Debug, Deserialize, Clone, Default)]
pub struct HotkeyConfig {
    #[serde(default)]
    pub lock: bool,
}

// Default value functions
fn default_cycle_hz() -> u32 { 1000 }
fn default_fault_threshold() -> u16 { 8 }

fn default_slot_one() -> SocdMode { SocdMode::UpPriority }
fn default_slot_two() -> SocdMode { SocdMode::SecondInputPriority }

fn default_deadzone() -> f32 { 0.05 }
fn default_digital_threshold() -> f32 { 0.5 }
fn default_disabled() -> i32 { DISABLED }

fn default_shots_per_second() -> u32 { 10 }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cycle_hz: default_cycle_hz(),
            fault_threshold: default_fault_threshold(),
        }
    }
}

impl Default for SocdConfig {
    fn default() -> Self {
        Self {
            default_mode: SocdMode::default(),
            slot_one: default_slot_one(),
            slot_two: default_slot_two(),
            slot_default: None,
        }
    }
}

impl Default for AnalogConfig {
    fn default() -> Self {
        Self {
            deadzone: default_deadzone(),
            digital_threshold: default_digital_threshold(),
            adc1: AdcPairConfig::default(),
            adc2: AdcPairConfig::default(),
        }
    }
}

impl Default for AdcPairConfig {
    fn default() -> Self {
        Self {
            x_pin: DISABLED,
            y_pin: DISABLED,
            mode: None,
            invert: Invert::None,
        }
    }
}

impl Default for TurboConfig {
    fn default() -> Self {
        Self {
            shots_per_second: default_shots_per_second(),
            buttons: Vec::new(),
        }
    }
}

impl SocdConfig {
    /// Slider slot modes.
    #[must_use]
    pub fn slots(&self) -> SocdSlots {
        SocdSlots {
            slot_one: self.slot_one,
            slot_two: self.slot_two,
            slot_default: self.slot_default,
        }
    }
}

impl ReverseConfig {
    #[must_use]
    pub fn mask(&self) -> ReverseMask {
        ReverseMask {
            up: self.up,
            down: self.down,
            left: self.left,
            right: self.right,
        }
    }
}

impl AnalogConfig {
    /// Stick mode of pair `0` or `1`, with the per-pair default applied.
    #[must_use]
    pub fn pair_mode(&self, pair: usize) -> StickMode {
        match pair {
            0 => self.adc1.mode.unwrap_or(StickMode::LeftAnalog),
            _ => self.adc2.mode.unwrap_or(StickMode::RightAnalog),
        }
    }

    fn pin(&self, input: AnalogInput) -> i32 {
        match input {
            AnalogInput::Adc1X => self.adc1.x_pin,
            AnalogInput::Adc1Y => self.adc1.y_pin,
            AnalogInput::Adc2X => self.adc2.x_pin,
            AnalogInput::Adc2Y => self.adc2.y_pin,
        }
    }
}

impl TurboConfig {
    #[must_use]
    pub fn button_mask(&self) -> Buttons {
        self.buttons.iter().copied().collect()
    }
}

/// Immutable pin assignment for every logical input, built at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTable {
    digital: [Option<u8>; LogicalInput::COUNT],
    analog: [Option<u8>; AnalogInput::COUNT],
}

impl Default for BindingTable {
    fn default() -> Self {
        Self {
            digital: [None; LogicalInput::COUNT],
            analog: [None; AnalogInput::COUNT],
        }
    }
}

impl BindingTable {
    /// Pin bound to a digital input.
    #[inline]
    #[must_use]
    pub fn digital(&self, input: LogicalInput) -> Option<u8> {
        self.digital[input.index()]
    }

    /// Pin bound to an ADC channel.
    #[inline]
    #[must_use]
    pub fn analog(&self, input: AnalogInput) -> Option<u8> {
        self.analog[input.index()]
    }

    #[inline]
    #[must_use]
    pub fn is_bound(&self, input: LogicalInput) -> bool {
        self.digital(input).is_some()
    }

    /// Number of bound inputs, digital and analog.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.digital.iter().chain(self.analog.iter()).filter(|p| p.is_some()).count()
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gamepad_pipeline::config::Config;
    ///
    /// let config = Config::load("config/flatbox-rev5-southpaw.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// ```
    /// use gamepad_pipeline::config::Config;
    /// use gamepad_pipeline::input::logical::LogicalInput;
    ///
    /// let config = Config::from_toml("[pins]\ndpad_up = 10\n")?;
    /// assert_eq!(config.binding_table()?.digital(LogicalInput::DpadUp), Some(10));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration and builds its binding table.
    ///
    /// # Errors
    ///
    /// - `PinOutOfRange` for a pin outside the board's range
    /// - `ConfigurationConflict` for a pin bound to two inputs
    pub fn binding_table(&self) -> Result<BindingTable> {
        let mut table = BindingTable::default();
        // Which input claimed each pin first.
        let mut owners: [Option<String>; (MAX_GPIO_PIN + 1) as usize] = Default::default();

        for (&input, &pin) in &self.pins {
            if pin == DISABLED {
                continue;
            }
            if !(0..=MAX_GPIO_PIN).contains(&pin) {
                return Err(PipelineError::out_of_range(input, pin));
            }
            table.digital[input.index()] = Some(pin as u8);
        }

        for input in LogicalInput::ALL {
            if let Some(pin) = table.digital(input) {
                claim(&mut owners, pin, input.to_string())?;
            }
        }

        for input in AnalogInput::ALL {
            let pin = self.analog.pin(input);
            if pin == DISABLED {
                continue;
            }
            if !ADC_PINS.contains(&pin) {
                return Err(PipelineError::PinOutOfRange {
                    input: input.to_string(),
                    pin,
                });
            }
            claim(&mut owners, pin as u8, input.to_string())?;
            table.analog[input.index()] = Some(pin as u8);
        }

        Ok(table)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range or any
    /// pin is bound twice
    pub(crate) fn validate(&self) -> Result<()> {
        if self.pipeline.cycle_hz < 50 || self.pipeline.cycle_hz > 8000 {
            return Err(invalid("cycle_hz must be between 50 and 8000"));
        }

        if self.pipeline.fault_threshold == 0 || self.pipeline.fault_threshold > 1000 {
            return Err(invalid("fault_threshold must be between 1 and 1000"));
        }

        if let Some(window) = self.debounce.window_ms {
            if window > 100 {
                return Err(invalid("debounce window_ms must be at most 100"));
            }
        }

        if !(0.0..=0.25).contains(&self.analog.deadzone) {
            return Err(invalid("analog deadzone must be between 0.0 and 0.25"));
        }

        if !(0.1..=0.95).contains(&self.analog.digital_threshold) {
            return Err(invalid("analog digital_threshold must be between 0.1 and 0.95"));
        }

        if self.turbo.shots_per_second == 0 || self.turbo.shots_per_second > 30 {
            return Err(invalid("turbo shots_per_second must be between 1 and 30"));
        }

        if self.turbo.shots_per_second * 2 > self.pipeline.cycle_hz {
            return Err(invalid("turbo shots_per_second must be at most half of cycle_hz"));
        }

        self.binding_table()?;
        Ok(())
    }
}

fn invalid(message: &str) -> PipelineError {
    PipelineError::InvalidConfig(message.to_string())
}

fn claim(owners: &mut [Option<String>], pin: u8, name: String) -> Result<()> {
    if let Some(first) = &owners[pin as usize] {
        return Err(PipelineError::conflict(pin, first, name));
    }
    owners[pin as usize] = Some(name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        let mut config = Config::default();
        config.pins.insert(LogicalInput::DpadUp, 10);
        config.pins.insert(LogicalInput::DpadDown, 12);
        config.pins.insert(LogicalInput::B1, 9);
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.binding_table().unwrap().bound_count(), 0);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.pipeline.cycle_hz, 1000);
        assert_eq!(config.socd.default_mode, SocdMode::Neutral);
        assert_eq!(config.dpad.default_mode, StickMode::Digital);
        assert_eq!(config.dual_directional.combine_mode, CombineMode::Mixed);
        assert_eq!(config.debounce.window_ms, None);
        assert!(!config.hotkeys.lock);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[pipeline]
cycle_hz = 500

[pins]
dpad_up = 10
dpad_down = 12
dpad_left = 13
dpad_right = 11
b1 = 9
turbo = -1

[socd]
default_mode = "second_input_priority"
slot_default = "neutral"

[reverse]
up = true
down = true

[analog.adc1]
x_pin = 26
y_pin = 27
invert = "y"

[dual_directional]
combine_mode = "none"
stick_mode = "right_analog"

[turbo]
shots_per_second = 20
buttons = ["b1", "r1"]

[debounce]
window_ms = 5
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        let table = config.binding_table().unwrap();

        assert_eq!(config.pipeline.cycle_hz, 500);
        assert_eq!(table.digital(LogicalInput::DpadLeft), Some(13));
        assert_eq!(table.digital(LogicalInput::Turbo), None);
        assert_eq!(table.analog(AnalogInput::Adc1Y), Some(27));
        assert_eq!(table.bound_count(), 7);
        assert_eq!(config.socd.default_mode, SocdMode::SecondInputPriority);
        assert_eq!(config.socd.slots().slot_default, Some(SocdMode::Neutral));
        assert_eq!(config.reverse.mask(), ReverseMask { up: true, down: true, ..ReverseMask::default() });
        assert_eq!(config.analog.adc1.invert, Invert::Y);
        assert_eq!(config.analog.pair_mode(0), StickMode::LeftAnalog);
        assert_eq!(config.analog.pair_mode(1), StickMode::RightAnalog);
        assert_eq!(config.dual_directional.combine_mode, CombineMode::None);
        assert_eq!(config.turbo.button_mask(), [Button::B1, Button::R1].into_iter().collect());
        assert_eq!(config.debounce.window_ms, Some(5));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/board.toml");
        assert!(matches!(result, Err(PipelineError::Io(_))));
    }

    #[test]
    fn test_unknown_pin_key_rejected() {
        let result = Config::from_toml("[pins]\nbutton_z = 3\n");
        assert!(matches!(result, Err(PipelineError::Parse(_))));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result = Config::from_toml("[socd]\ndefault_mode = \"last_win\"\n");
        assert!(matches!(result, Err(PipelineError::Parse(_))));
    }

    // ==================== Binding Tests ====================

    #[test]
    fn test_shared_digital_pin_is_conflict() {
        let mut config = create_valid_config();
        config.pins.insert(LogicalInput::B2, 10);
        match config.validate() {
            Err(PipelineError::ConfigurationConflict { pin, first, second }) => {
                assert_eq!(pin, 10);
                assert_eq!(first, "dpad_up");
                assert_eq!(second, "b2");
            }
            other => panic!("Expected ConfigurationConflict, got: {:?}", other),
        }
    }

    #[test]
    fn test_analog_pin_shared_with_digital_is_conflict() {
        let mut config = create_valid_config();
        config.pins.insert(LogicalInput::B4, 26);
        config.analog.adc1.x_pin = 26;
        assert!(matches!(config.validate(), Err(PipelineError::ConfigurationConflict { pin: 26, .. })));
    }

    #[test]
    fn test_analog_pin_shared_between_channels_is_conflict() {
        let mut config = create_valid_config();
        config.analog.adc1.x_pin = 27;
        config.analog.adc2.y_pin = 27;
        assert!(matches!(config.validate(), Err(PipelineError::ConfigurationConflict { pin: 27, .. })));
    }

    #[test]
    fn test_disabled_pins_never_conflict() {
        let mut config = create_valid_config();
        config.pins.insert(LogicalInput::Fn, DISABLED);
        config.pins.insert(LogicalInput::Turbo, DISABLED);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_digital_pin_out_of_range() {
        let mut config = create_valid_config();
        config.pins.insert(LogicalInput::A2, 30);
        assert!(matches!(config.validate(), Err(PipelineError::PinOutOfRange { pin: 30, .. })));

        let mut config = create_valid_config();
        config.pins.insert(LogicalInput::A2, -2);
        assert!(matches!(config.validate(), Err(PipelineError::PinOutOfRange { pin: -2, .. })));
    }

    #[test]
    fn test_analog_pin_must_be_adc_capable() {
        let mut config = create_valid_config();
        config.analog.adc2.x_pin = 20;
        assert!(matches!(config.validate(), Err(PipelineError::PinOutOfRange { pin: 20, .. })));
    }

    #[test]
    fn test_binding_table_lookup() {
        let table = create_valid_config().binding_table().unwrap();
        assert_eq!(table.digital(LogicalInput::DpadDown), Some(12));
        assert!(table.is_bound(LogicalInput::B1));
        assert!(!table.is_bound(LogicalInput::B2));
        assert_eq!(table.analog(AnalogInput::Adc2X), None);
    }

    // ==================== Range Tests ====================

    #[test]
    fn test_cycle_hz_range() {
        let mut config = create_valid_config();
        config.pipeline.cycle_hz = 49;
        assert!(config.validate().is_err());
        config.pipeline.cycle_hz = 8001;
        assert!(config.validate().is_err());
        config.pipeline.cycle_hz = 8000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fault_threshold_zero() {
        let mut config = create_valid_config();
        config.pipeline.fault_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debounce_window_too_long() {
        let mut config = create_valid_config();
        config.debounce.window_ms = Some(101);
        assert!(config.validate().is_err());
        config.debounce.window_ms = Some(0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deadzone_range() {
        let mut config = create_valid_config();
        config.analog.deadzone = -0.1;
        assert!(config.validate().is_err());
        config.analog.deadzone = 0.3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_digital_threshold_range() {
        let mut config = create_valid_config();
        config.analog.digital_threshold = 0.05;
        assert!(config.validate().is_err());
        config.analog.digital_threshold = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_turbo_rate_range() {
        let mut config = create_valid_config();
        config.turbo.shots_per_second = 0;
        assert!(config.validate().is_err());
        config.turbo.shots_per_second = 31;
        assert!(config.validate().is_err());

        config.turbo.shots_per_second = 30;
        config.pipeline.cycle_hz = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_cycle_hz(), 1000);
        assert_eq!(default_fault_threshold(), 8);
        assert_eq!(default_slot_one(), SocdMode::UpPriority);
        assert_eq!(default_slot_two(), SocdMode::SecondInputPriority);
        assert_eq!(default_deadzone(), 0.05);
        assert_eq!(default_digital_threshold(), 0.5);
        assert_eq!(default_disabled(), -1);
        assert_eq!(default_shots_per_second(), 10);
    }
}
