//! # Input Pipeline
//!
//! Runs one resolution pass per cycle:
//!
//! ```text
//! sample -> debounce -> SOCD (d-pad, dual) -> analog normalize
//!        -> combine + reverse -> turbo/hotkeys -> aggregate
//! ```
//!
//! The [`Pipeline`] owns every stage and the cycle counter. It is driven by a
//! single task; a replacement configuration is handed over with
//! [`Pipeline::stage`] and swapped in before the next cycle starts, so a
//! cycle never sees a mix of old and new settings.

use std::time::Duration;
use tracing::{debug, info};

use crate::config::{BindingTable, Config};
use crate::error::{PipelineError, Result};
use crate::input::analog::{AnalogNormalizer, PairSettings};
use crate::input::debounce::{window_cycles, Debouncer};
use crate::input::directional::{CombinerInputs, DirectionalCombiner, DirectionalResult};
use crate::input::logical::{AnalogInput, DirectionalInputs, LogicalInput, DPAD, DUAL};
use crate::input::modifier::{select_dpad_mode, ModifierOverlay, OverlaySettings, TurboClock};
use crate::input::socd::{select_socd_mode, SocdResolver};
use crate::input::source::{SampleSource, Sampler};
use crate::input::state::{aggregate, Buttons, ControllerState, CycleOutputs, ModifierFlags};

type Stable = [bool; LogicalInput::COUNT];

/// The input resolution pipeline.
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    bindings: BindingTable,
    sampler: Sampler,
    debouncer: Debouncer,
    dpad: SocdResolver,
    dual: SocdResolver,
    dual_bound: bool,
    normalizer: AnalogNormalizer,
    combiner: DirectionalCombiner,
    overlay: ModifierOverlay,
    cycle: u64,
    last: ControllerState,
    staged: Option<(Config, BindingTable)>,
}

impl Pipeline {
    /// Builds a pipeline from a configuration.
    ///
    /// # Errors
    ///
    /// Returns the validation error if the configuration is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepad_pipeline::config::Config;
    /// use gamepad_pipeline::input::source::IdleSource;
    /// use gamepad_pipeline::pipeline::Pipeline;
    ///
    /// let config = Config::from_toml("[pins]\ndpad_up = 10\n")?;
    /// let mut pipeline = Pipeline::new(config)?;
    /// let state = pipeline.run_cycle(&mut IdleSource);
    /// assert!(state.is_neutral());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let bindings = config.binding_table()?;
        let pipeline = Self::build(config, bindings, 0, ControllerState::default());

        info!(
            "Pipeline ready: {} inputs bound, {} Hz",
            pipeline.bindings.bound_count(),
            pipeline.config.pipeline.cycle_hz
        );
        Ok(pipeline)
    }

    /// Builds every stage from `config`, continuing from `cycle` and `last`.
    fn build(config: Config, bindings: BindingTable, cycle: u64, last: ControllerState) -> Self {
        let cycle_hz = config.pipeline.cycle_hz;
        let pair_bound = |x, y| bindings.analog(x).is_some() || bindings.analog(y).is_some();

        let normalizer = AnalogNormalizer::new(
            config.analog.deadzone,
            config.analog.digital_threshold,
            [
                PairSettings {
                    mode: config.analog.pair_mode(0),
                    invert: config.analog.adc1.invert,
                    bound: pair_bound(AnalogInput::Adc1X, AnalogInput::Adc1Y),
                },
                PairSettings {
                    mode: config.analog.pair_mode(1),
                    invert: config.analog.adc2.invert,
                    bound: pair_bound(AnalogInput::Adc2X, AnalogInput::Adc2Y),
                },
            ],
        );
        let overlay = ModifierOverlay::new(OverlaySettings {
            turbo: bindings
                .is_bound(LogicalInput::Turbo)
                .then(|| TurboClock::new(cycle_hz, config.turbo.shots_per_second)),
            turbo_buttons: config.turbo.button_mask(),
            hotkeys_locked: config.hotkeys.lock,
            dpad_sliders_bound: bindings.is_bound(LogicalInput::SliderOne)
                || bindings.is_bound(LogicalInput::SliderTwo),
        });

        Self {
            sampler: Sampler::new(config.pipeline.fault_threshold),
            debouncer: Debouncer::new(window_cycles(config.debounce.window_ms, cycle_hz)),
            dpad: SocdResolver::new(),
            dual: SocdResolver::new(),
            dual_bound: [DUAL.up, DUAL.down, DUAL.left, DUAL.right]
                .into_iter()
                .any(|input| bindings.is_bound(input)),
            normalizer,
            combiner: DirectionalCombiner::new(
                config.dual_directional.combine_mode,
                config.dual_directional.stick_mode,
            ),
            overlay,
            config,
            bindings,
            cycle,
            last,
            staged: None,
        }
    }

    /// Validates `config` and stages it for the start of the next cycle.
    ///
    /// A later call replaces a configuration that has not been applied yet.
    ///
    /// # Errors
    ///
    /// Returns the validation error; the running configuration is untouched.
    pub fn stage(&mut self, config: Config) -> Result<()> {
        config.validate()?;
        let bindings = config.binding_table()?;
        if self.staged.replace((config, bindings)).is_some() {
            debug!("Replaced previously staged configuration");
        }
        info!("Configuration staged for cycle {}", self.cycle);
        Ok(())
    }

    /// Swaps in a staged configuration.
    ///
    /// Inputs held through the swap stay held: debounced state of inputs that
    /// are still bound carries over, as does SOCD press order. Hotkey
    /// overrides and turbo toggles start fresh.
    fn apply_staged(&mut self, config: Config, bindings: BindingTable) {
        let mut next = Self::build(config, bindings, self.cycle, self.last);
        let bound = &next.bindings;
        next.debouncer.resume_from(&self.debouncer, |input| bound.is_bound(input));
        next.dpad = self.dpad.clone();
        next.dual = self.dual.clone();
        next.combiner.resume_from(&self.combiner);
        *self = next;
        info!("Applied staged configuration at cycle {}", self.cycle);
    }

    /// Runs one full pass and returns the committed state.
    pub fn run_cycle<S: SampleSource + ?Sized>(&mut self, source: &mut S) -> ControllerState {
        if let Some((config, bindings)) = self.staged.take() {
            self.apply_staged(config, bindings);
        }

        let cycle = self.cycle;
        let raw = self.sampler.sample(&self.bindings, source);
        let stable: Stable = *self.debouncer.update(&raw.digital);
        let held = |input: LogicalInput| stable[input.index()];
        let slider = |input: LogicalInput| self.bindings.is_bound(input).then(|| held(input));

        let socd_mode = select_socd_mode(
            slider(LogicalInput::SliderSocdOne),
            slider(LogicalInput::SliderSocdTwo),
            &self.config.socd.slots(),
            self.overlay.socd_default(self.config.socd.default_mode),
        );
        let dpad_mode = select_dpad_mode(
            slider(LogicalInput::SliderOne),
            slider(LogicalInput::SliderTwo),
            self.overlay.dpad_default(self.config.dpad.default_mode),
        );

        let dpad = self.dpad.resolve(directions(&stable, &DPAD), socd_mode);
        let dual = if self.dual_bound {
            Some(self.dual.resolve(directions(&stable, &DUAL), socd_mode))
        } else {
            None
        };

        let analog = self.normalizer.normalize(&raw.analog);
        let mask = self.config.reverse.mask();
        let reversed = mask.any() && (self.config.reverse.always || held(LogicalInput::Reverse));

        let mut combined = self.combiner.combine(&CombinerInputs {
            dpad,
            dual,
            analog: self.normalizer.digital_directions(&analog),
            socd_mode,
            reverse: reversed.then_some(mask),
        });

        let buttons: Buttons = LogicalInput::ALL
            .into_iter()
            .filter(|&input| held(input))
            .filter_map(LogicalInput::as_button)
            .collect();
        let overlay = self.overlay.apply(cycle, &stable, buttons, &mut combined);

        let state = aggregate(&CycleOutputs {
            cycle,
            directions: combined,
            buttons: overlay.buttons,
            analog,
            modifiers: ModifierFlags {
                socd_mode,
                dpad_mode,
                turbo_phase: overlay.turbo_phase,
                turbo_buttons: overlay.turbo_buttons,
                reversed,
                degraded: raw.degraded,
            },
        });

        if !state.same_input(&self.last) {
            debug!("Cycle {}: hat {:?}, buttons {:#06x}", cycle, state.hat, state.buttons.bits());
        }

        self.last = state;
        self.cycle += 1;
        state
    }

    /// Last committed state.
    #[must_use]
    pub fn snapshot(&self) -> ControllerState {
        self.last
    }

    /// Number of completed cycles.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }
}

fn directions(stable: &Stable, inputs: &DirectionalInputs) -> DirectionalResult {
    DirectionalResult {
        up: stable[inputs.up.index()],
        down: stable[inputs.down.index()],
        left: stable[inputs.left.index()],
        right: stable[inputs.right.index()],
    }
}

/// Time allowed for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleBudget {
    budget: Duration,
}

impl CycleBudget {
    /// Budget of one cycle period at `cycle_hz`.
    #[must_use]
    pub fn new(cycle_hz: u32) -> Self {
        Self {
            budget: Duration::from_micros(1_000_000 / u64::from(cycle_hz.max(1))),
        }
    }

    #[must_use]
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Checks how long a cycle took.
    ///
    /// # Errors
    ///
    /// Returns `SchedulingOverrun` if `elapsed` exceeds the budget.
    pub fn check(&self, elapsed: Duration) -> Result<()> {
        if elapsed > self.budget {
            return Err(PipelineError::SchedulingOverrun {
                elapsed_us: elapsed.as_micros() as u64,
                budget_us: self.budget.as_micros() as u64,
            });
        }
        Ok(())
    }
}
