//! # Directional Combiner
//!
//! Merges every directional source into the primary (and optional secondary)
//! directional output, then applies reversal.
//!
//! ## Sources
//!
//! - Main d-pad, already SOCD-resolved
//! - Dual directional add-on pad, already SOCD-resolved (optional)
//! - Analog pairs in digital mode, after their threshold test
//!
//! ## Combine Modes
//!
//! | Mode | Primary output | Secondary output |
//! |------|----------------|------------------|
//! | `mixed` | d-pad OR dual, re-resolved | none |
//! | `gamepad` | d-pad if active, else dual | none |
//! | `dual` | dual if active, else d-pad | none |
//! | `none` | d-pad | dual, routed by its own stick mode |
//!
//! Analog-as-digital directions are always OR-merged into the primary output
//! and the merged result goes through a dedicated SOCD resolver, so no
//! combination of sources can report both directions of a pair.

use serde::{Deserialize, Serialize};

use super::analog::StickMode;
use super::socd::{SocdMode, SocdResolver};

/// Resolved state of the four cardinal directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct DirectionalResult {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionalResult {
    /// No direction active.
    pub const NEUTRAL: DirectionalResult = DirectionalResult {
        up: false,
        down: false,
        left: false,
        right: false,
    };

    #[must_use]
    pub const fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Per-direction OR of two results.
    #[must_use]
    pub const fn or(self, other: DirectionalResult) -> DirectionalResult {
        DirectionalResult {
            up: self.up || other.up,
            down: self.down || other.down,
            left: self.left || other.left,
            right: self.right || other.right,
        }
    }

    /// True when neither opposing pair is fully active.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !(self.up && self.down) && !(self.left && self.right)
    }

    /// Applies a reverse mask. A flagged direction reports as its opposite.
    ///
    /// Flagging both directions of a pair swaps the pair. A resolved input
    /// stays resolved.
    #[must_use]
    pub const fn reversed(self, mask: ReverseMask) -> DirectionalResult {
        DirectionalResult {
            up: (self.up && !mask.up) || (self.down && mask.down),
            down: (self.down && !mask.down) || (self.up && mask.up),
            left: (self.left && !mask.left) || (self.right && mask.right),
            right: (self.right && !mask.right) || (self.left && mask.left),
        }
    }
}

/// Which directions are reversed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReverseMask {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl ReverseMask {
    #[must_use]
    pub const fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

/// How the dual directional pad combines with the main d-pad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    #[default]
    Mixed,
    Gamepad,
    Dual,
    None,
}

/// Combiner output for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionalOutputs {
    /// Primary directional output, routed by the d-pad mode.
    pub primary: DirectionalResult,
    /// Dual pad output when it is not merged, with its stick mode.
    pub secondary: Option<(DirectionalResult, StickMode)>,
}

/// Per-cycle combiner inputs.
#[derive(Debug, Clone, Copy)]
pub struct CombinerInputs {
    pub dpad: DirectionalResult,
    pub dual: Option<DirectionalResult>,
    pub analog: DirectionalResult,
    pub socd_mode: SocdMode,
    /// Reverse mask to apply this cycle, if reversal is active.
    pub reverse: Option<ReverseMask>,
}

/// Merges directional sources into one result per output.
#[derive(Debug, Clone)]
pub struct DirectionalCombiner {
    combine_mode: CombineMode,
    dual_mode: StickMode,
    merged: SocdResolver,
}

impl DirectionalCombiner {
    #[must_use]
    pub fn new(combine_mode: CombineMode, dual_mode: StickMode) -> Self {
        Self {
            combine_mode,
            dual_mode,
            merged: SocdResolver::new(),
        }
    }

    /// Continues the press order of `previous`'s merged output.
    pub fn resume_from(&mut self, previous: &DirectionalCombiner) {
        self.merged = previous.merged.clone();
    }

    /// Combines all sources for one cycle.
    pub fn combine(&mut self, inputs: &CombinerInputs) -> DirectionalOutputs {
        let (primary, secondary) = match inputs.dual {
            None => (inputs.dpad, None),
            Some(dual) => match self.combine_mode {
                CombineMode::Mixed => (inputs.dpad.or(dual), None),
                CombineMode::Gamepad if inputs.dpad.any() => (inputs.dpad, None),
                CombineMode::Gamepad => (dual, None),
                CombineMode::Dual if dual.any() => (dual, None),
                CombineMode::Dual => (inputs.dpad, None),
                CombineMode::None => (inputs.dpad, Some(dual)),
            },
        };

        let primary = self.merged.resolve(primary.or(inputs.analog), inputs.socd_mode);

        match inputs.reverse {
            Some(mask) => DirectionalOutputs {
                primary: primary.reversed(mask),
                secondary: secondary.map(|dual| (dual.reversed(mask), self.dual_mode)),
            },
            None => DirectionalOutputs {
                primary,
                secondary: secondary.map(|dual| (dual, self.dual_mode)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UP: DirectionalResult = DirectionalResult { up: true, down: false, left: false, right: false };
    const DOWN: DirectionalResult = DirectionalResult { up: false, down: true, left: false, right: false };
    const LEFT: DirectionalResult = DirectionalResult { up: false, down: false, left: true, right: false };
    const RIGHT: DirectionalResult = DirectionalResult { up: false, down: false, left: false, right: true };

    fn inputs(dpad: DirectionalResult, dual: Option<DirectionalResult>) -> CombinerInputs {
        CombinerInputs {
            dpad,
            dual,
            analog: DirectionalResult::NEUTRAL,
            socd_mode: SocdMode::Neutral,
            reverse: None,
        }
    }

    /// Every combination of the four directions.
    fn all_inputs() -> impl Iterator<Item = DirectionalResult> {
        (0u8..16).map(|bits| DirectionalResult {
            up: bits & 1 != 0,
            down: bits & 2 != 0,
            left: bits & 4 != 0,
            right: bits & 8 != 0,
        })
    }

    // ==================== Reversal Tests ====================

    #[test]
    fn test_vertical_reversal_swaps_up_down_only() {
        let mask = ReverseMask { up: true, down: true, ..ReverseMask::default() };
        for input in all_inputs() {
            let out = input.reversed(mask);
            assert_eq!(out.up, input.down, "input {:?}", input);
            assert_eq!(out.down, input.up, "input {:?}", input);
            assert_eq!(out.left, input.left, "input {:?}", input);
            assert_eq!(out.right, input.right, "input {:?}", input);
        }
    }

    #[test]
    fn test_horizontal_reversal_swaps_left_right_only() {
        let mask = ReverseMask { left: true, right: true, ..ReverseMask::default() };
        for input in all_inputs() {
            let out = input.reversed(mask);
            assert_eq!(out.left, input.right);
            assert_eq!(out.right, input.left);
            assert_eq!(out.up, input.up);
            assert_eq!(out.down, input.down);
        }
    }

    #[test]
    fn test_single_flag_reversal_keeps_result_resolved() {
        let mask = ReverseMask { up: true, ..ReverseMask::default() };
        assert_eq!(UP.reversed(mask), DOWN);
        assert_eq!(DOWN.reversed(mask), DOWN);
        for input in all_inputs().filter(DirectionalResult::is_resolved) {
            assert!(input.reversed(mask).is_resolved());
        }
    }

    #[test]
    fn test_empty_mask_is_identity() {
        for input in all_inputs() {
            assert_eq!(input.reversed(ReverseMask::default()), input);
        }
    }

    // ==================== Combine Mode Tests ====================

    #[test]
    fn test_no_dual_passes_dpad_through() {
        let mut combiner = DirectionalCombiner::new(CombineMode::Mixed, StickMode::Digital);
        let out = combiner.combine(&inputs(UP, None));
        assert_eq!(out.primary, UP);
        assert_eq!(out.secondary, None);
    }

    #[test]
    fn test_mixed_merge_never_reports_opposing_pair() {
        for mode in SocdMode::ALL {
            let mut combiner = DirectionalCombiner::new(CombineMode::Mixed, StickMode::Digital);
            let mut cycle = inputs(UP, Some(DOWN));
            cycle.socd_mode = mode;
            let out = combiner.combine(&cycle);
            assert!(out.primary.is_resolved(), "mode {:?} gave {:?}", mode, out.primary);
        }
    }

    #[test]
    fn test_mixed_merge_neutral_cancels() {
        let mut combiner = DirectionalCombiner::new(CombineMode::Mixed, StickMode::Digital);
        let out = combiner.combine(&inputs(LEFT, Some(RIGHT)));
        assert_eq!(out.primary, DirectionalResult::NEUTRAL);
    }

    #[test]
    fn test_mixed_merge_combines_axes() {
        let mut combiner = DirectionalCombiner::new(CombineMode::Mixed, StickMode::Digital);
        let out = combiner.combine(&inputs(UP, Some(RIGHT)));
        assert_eq!(out.primary, UP.or(RIGHT));
    }

    #[test]
    fn test_resume_keeps_merged_press_order() {
        let mut previous = DirectionalCombiner::new(CombineMode::Mixed, StickMode::Digital);
        let mut cycle = inputs(LEFT, None);
        cycle.socd_mode = SocdMode::SecondInputPriority;
        previous.combine(&cycle);
        cycle.dual = Some(RIGHT);
        assert_eq!(previous.combine(&cycle).primary, RIGHT);

        let mut fresh = DirectionalCombiner::new(CombineMode::Mixed, StickMode::Digital);
        assert_eq!(fresh.combine(&cycle).primary, DirectionalResult::NEUTRAL);

        let mut resumed = DirectionalCombiner::new(CombineMode::Mixed, StickMode::Digital);
        resumed.resume_from(&previous);
        assert_eq!(resumed.combine(&cycle).primary, RIGHT);
    }

    #[test]
    fn test_gamepad_mode_prefers_dpad() {
        let mut combiner = DirectionalCombiner::new(CombineMode::Gamepad, StickMode::Digital);
        assert_eq!(combiner.combine(&inputs(UP, Some(LEFT))).primary, UP);
        assert_eq!(combiner.combine(&inputs(DirectionalResult::NEUTRAL, Some(LEFT))).primary, LEFT);
    }

    #[test]
    fn test_dual_mode_prefers_dual() {
        let mut combiner = DirectionalCombiner::new(CombineMode::Dual, StickMode::Digital);
        assert_eq!(combiner.combine(&inputs(UP, Some(LEFT))).primary, LEFT);
        assert_eq!(combiner.combine(&inputs(UP, Some(DirectionalResult::NEUTRAL))).primary, UP);
    }

    #[test]
    fn test_none_mode_emits_secondary() {
        let mut combiner = DirectionalCombiner::new(CombineMode::None, StickMode::RightAnalog);
        let out = combiner.combine(&inputs(UP, Some(LEFT)));
        assert_eq!(out.primary, UP);
        assert_eq!(out.secondary, Some((LEFT, StickMode::RightAnalog)));
    }

    #[test]
    fn test_analog_source_merged_and_resolved() {
        let mut combiner = DirectionalCombiner::new(CombineMode::Mixed, StickMode::Digital);
        let mut cycle = inputs(UP, None);
        cycle.analog = RIGHT;
        assert_eq!(combiner.combine(&cycle).primary, UP.or(RIGHT));

        cycle.analog = DOWN;
        assert_eq!(combiner.combine(&cycle).primary, DirectionalResult::NEUTRAL);
    }

    #[test]
    fn test_reversal_is_final_step() {
        let mut combiner = DirectionalCombiner::new(CombineMode::None, StickMode::Digital);
        let mut cycle = inputs(UP, Some(LEFT));
        cycle.reverse = Some(ReverseMask { up: true, down: true, left: true, right: true });
        let out = combiner.combine(&cycle);
        assert_eq!(out.primary, DOWN);
        assert_eq!(out.secondary, Some((RIGHT, StickMode::Digital)));
    }
}
