//! # Debouncer
//!
//! Per-input debounce logic.
//!
//! Each input has a counter of consecutive raw samples that disagree with its
//! stable value. The stable value flips once the counter reaches the window
//! length; any agreeing sample resets it. An input that toggles faster than
//! the window therefore holds its last stable value, and the output can change
//! at most once per window.
//!
//! A window of one sample means "stable after one sample": raw changes pass
//! straight through.

use super::logical::LogicalInput;

/// Number of digital inputs the debouncer tracks.
const INPUTS: usize = LogicalInput::COUNT;

/// Converts an optional debounce time into a window length in cycles.
///
/// `None` gives the one-sample window. Otherwise the time is rounded up to
/// whole cycles, with a minimum of one.
///
/// ```
/// use gamepad_pipeline::input::debounce::window_cycles;
///
/// assert_eq!(window_cycles(None, 1000), 1);
/// assert_eq!(window_cycles(Some(5), 1000), 5);
/// assert_eq!(window_cycles(Some(5), 500), 3);
/// ```
#[must_use]
pub fn window_cycles(window_ms: Option<u32>, cycle_hz: u32) -> u16 {
    match window_ms {
        None => 1,
        Some(ms) => {
            let cycles = (u64::from(ms) * u64::from(cycle_hz)).div_ceil(1000);
            cycles.clamp(1, u64::from(u16::MAX)) as u16
        }
    }
}

/// Debounced state of every digital input.
#[derive(Debug, Clone)]
pub struct Debouncer {
    /// Stable values: true = pressed.
    stable: [bool; INPUTS],
    /// Consecutive raw samples differing from the stable value.
    pending: [u16; INPUTS],
    /// Samples required to flip a stable value.
    window: u16,
}

impl Debouncer {
    /// Creates a debouncer with every input released.
    #[must_use]
    pub fn new(window: u16) -> Self {
        Self {
            stable: [false; INPUTS],
            pending: [0; INPUTS],
            window: window.max(1),
        }
    }

    #[must_use]
    pub fn window(&self) -> u16 {
        self.window
    }

    /// Feeds one cycle of raw samples and returns the stable state.
    pub fn update(&mut self, raw: &[bool; INPUTS]) -> &[bool; INPUTS] {
        for i in 0..INPUTS {
            if raw[i] == self.stable[i] {
                self.pending[i] = 0;
            } else {
                self.pending[i] += 1;
                if self.pending[i] >= self.window {
                    self.stable[i] = raw[i];
                    self.pending[i] = 0;
                }
            }
        }

        &self.stable
    }

    /// Continues from the state of `previous` for every input `keep` accepts.
    ///
    /// Stable values always carry over. In-flight counters carry over only
    /// when both windows match, since a count toward one window says nothing
    /// about another. Rejected inputs start released.
    pub fn resume_from<F: Fn(LogicalInput) -> bool>(&mut self, previous: &Debouncer, keep: F) {
        let same_window = previous.window == self.window;
        for input in LogicalInput::ALL {
            let i = input.index();
            if keep(input) {
                self.stable[i] = previous.stable[i];
                self.pending[i] = if same_window { previous.pending[i] } else { 0 };
            } else {
                self.stable[i] = false;
                self.pending[i] = 0;
            }
        }
    }

    #[must_use]
    pub fn is_active(&self, input: LogicalInput) -> bool {
        self.stable[input.index()]
    }
}
