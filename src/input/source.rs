//! # Sample Source
//!
//! Abstracts raw digital pin and analog channel reads into a per-cycle
//! snapshot.
//!
//! The pipeline never touches hardware. It asks a [`SampleSource`] for the
//! level of each bound pin; the [`Sampler`] turns those reads into a
//! [`RawSnapshot`] and absorbs read faults:
//!
//! - Unbound digital inputs read as released
//! - Unbound ADC channels read as centered (2048)
//! - A failed read reuses the last known value for that input
//! - After `fault_threshold` consecutive failures the input is flagged as
//!   degraded until a read succeeds again
//!
//! ## Sources
//!
//! | Source | Use |
//! |--------|-----|
//! | [`IdleSource`] | Nothing pressed, sticks centered |
//! | [`ReplaySource`] | Frames from a JSON-lines script, one per cycle |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

use super::analog::ADC_CENTER;
use super::logical::{AnalogInput, LogicalInput};
use crate::config::BindingTable;
use crate::error::{PipelineError, Result};

const DIGITAL: usize = LogicalInput::COUNT;
const ANALOG: usize = AnalogInput::COUNT;

/// Reads physical pin levels.
///
/// Implementations perform the actual hardware (or simulated) read and must
/// return within a bounded time. `read_digital` reports the logical level:
/// `true` = switch closed, whatever the electrical polarity.
#[cfg_attr(test, mockall::automock)]
pub trait SampleSource {
    /// Reads a digital pin.
    fn read_digital(&mut self, pin: u8) -> Result<bool>;

    /// Reads an ADC pin (0-4095).
    fn read_analog(&mut self, pin: u8) -> Result<u16>;
}

/// Inputs currently degraded by sustained read faults, one bit each.
///
/// Bits `0..29` are digital inputs in [`LogicalInput`] order, the next four
/// are ADC channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DegradedMask(u64);

impl DegradedMask {
    #[must_use]
    pub const fn any(self) -> bool {
        self.0 != 0
    }

    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    #[must_use]
    pub const fn is_digital_degraded(self, input: LogicalInput) -> bool {
        self.0 & (1 << input.index()) != 0
    }

    #[must_use]
    pub const fn is_analog_degraded(self, input: AnalogInput) -> bool {
        self.0 & (1 << (DIGITAL + input.index())) != 0
    }

    fn set(&mut self, slot: usize, degraded: bool) {
        if degraded {
            self.0 |= 1 << slot;
        } else {
            self.0 &= !(1 << slot);
        }
    }
}

/// Raw values for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSnapshot {
    /// Digital levels in [`LogicalInput`] order.
    pub digital: [bool; DIGITAL],
    /// ADC readings in [`AnalogInput`] order.
    pub analog: [u16; ANALOG],
    pub degraded: DegradedMask,
}

impl Default for RawSnapshot {
    fn default() -> Self {
        Self {
            digital: [false; DIGITAL],
            analog: [ADC_CENTER; ANALOG],
            degraded: DegradedMask::default(),
        }
    }
}

/// Reads every bound input once per cycle and absorbs read faults.
#[derive(Debug, Clone)]
pub struct Sampler {
    last: RawSnapshot,
    /// Consecutive faults per slot (digital, then analog).
    faults: [u16; DIGITAL + ANALOG],
    threshold: u16,
}

impl Sampler {
    /// Creates a sampler that flags an input after `threshold` consecutive faults.
    #[must_use]
    pub fn new(threshold: u16) -> Self {
        Self {
            last: RawSnapshot::default(),
            faults: [0; DIGITAL + ANALOG],
            threshold: threshold.max(1),
        }
    }

    /// Takes this cycle's snapshot.
    pub fn sample<S: SampleSource + ?Sized>(&mut self, bindings: &BindingTable, source: &mut S) -> RawSnapshot {
        let mut snapshot = RawSnapshot {
            degraded: self.last.degraded,
            ..RawSnapshot::default()
        };

        for input in LogicalInput::ALL {
            let i = input.index();
            let Some(pin) = bindings.digital(input) else {
                continue;
            };
            snapshot.digital[i] = match source.read_digital(pin) {
                Ok(level) => {
                    self.record_success(i, &mut snapshot.degraded, input);
                    level
                }
                Err(e) => {
                    debug!("Read of {} (pin {}) failed: {}", input, pin, e);
                    self.record_fault(i, &mut snapshot.degraded, input);
                    self.last.digital[i]
                }
            };
        }

        for input in AnalogInput::ALL {
            let i = input.index();
            let Some(pin) = bindings.analog(input) else {
                continue;
            };
            snapshot.analog[i] = match source.read_analog(pin) {
                Ok(value) => {
                    self.record_success(DIGITAL + i, &mut snapshot.degraded, input);
                    value
                }
                Err(e) => {
                    debug!("Read of {} (pin {}) failed: {}", input, pin, e);
                    self.record_fault(DIGITAL + i, &mut snapshot.degraded, input);
                    self.last.analog[i]
                }
            };
        }

        self.last = snapshot;
        snapshot
    }

    fn record_success(&mut self, slot: usize, degraded: &mut DegradedMask, name: impl std::fmt::Display) {
        if self.faults[slot] >= self.threshold {
            info!("{} recovered after {} failed reads", name, self.faults[slot]);
        }
        self.faults[slot] = 0;
        degraded.set(slot, false);
    }

    fn record_fault(&mut self, slot: usize, degraded: &mut DegradedMask, name: impl std::fmt::Display) {
        self.faults[slot] = self.faults[slot].saturating_add(1);
        if self.faults[slot] == self.threshold {
            warn!("{} degraded after {} consecutive failed reads", name, self.threshold);
        }
        if self.faults[slot] >= self.threshold {
            degraded.set(slot, true);
        }
    }
}

/// A source with nothing pressed and sticks centered.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleSource;

impl SampleSource for IdleSource {
    fn read_digital(&mut self, _pin: u8) -> Result<bool> {
        Ok(false)
    }

    fn read_analog(&mut self, _pin: u8) -> Result<u16> {
        Ok(ADC_CENTER)
    }
}

/// One frame of a replay script.
///
/// ```json
/// {"pressed": [10, 12], "adc": {"26": 4095}, "faults": [9]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReplayFrame {
    /// Pins reading closed.
    #[serde(default)]
    pub pressed: Vec<u8>,
    /// ADC readings by pin; missing pins read centered.
    #[serde(default)]
    pub adc: BTreeMap<u8, u16>,
    /// Pins whose reads fail this frame.
    #[serde(default)]
    pub faults: Vec<u8>,
}

/// Replays recorded frames, one per cycle, looping at the end.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    frames: Vec<ReplayFrame>,
    position: usize,
}

impl ReplaySource {
    /// Creates a replay from frames.
    ///
    /// # Errors
    ///
    /// Returns `Replay` if `frames` is empty.
    pub fn new(frames: Vec<ReplayFrame>) -> Result<Self> {
        if frames.is_empty() {
            return Err(PipelineError::Replay("script has no frames".to_string()));
        }
        Ok(Self { frames, position: 0 })
    }

    /// Parses a JSON-lines script. Blank lines are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut frames = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let frame = serde_json::from_str(&line)
                .map_err(|e| PipelineError::Replay(format!("line {}: {}", number + 1, e)))?;
            frames.push(frame);
        }
        Self::new(frames)
    }

    /// Loads a JSON-lines script from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Number of frames in one pass of the script. Never zero.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Moves to the next frame, wrapping to the first.
    pub fn advance(&mut self) {
        self.position = (self.position + 1) % self.frames.len();
    }

    fn frame(&self) -> &ReplayFrame {
        &self.frames[self.position]
    }
}

impl SampleSource for ReplaySource {
    fn read_digital(&mut self, pin: u8) -> Result<bool> {
        let frame = self.frame();
        if frame.faults.contains(&pin) {
            return Err(PipelineError::SampleFault { pin });
        }
        Ok(frame.pressed.contains(&pin))
    }

    fn read_analog(&mut self, pin: u8) -> Result<u16> {
        let frame = self.frame();
        if frame.faults.contains(&pin) {
            return Err(PipelineError::SampleFault { pin });
        }
        Ok(frame.adc.get(&pin).copied().unwrap_or(ADC_CENTER))
    }
}
