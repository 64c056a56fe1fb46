//! # Input Module
//!
//! The stages of the input pipeline, in the order a cycle runs them.
//!
//! This module handles:
//! - Reading bound pins from a sample source (`source`)
//! - Debouncing digital inputs (`debounce`)
//! - SOCD resolution of opposing directions (`socd`)
//! - ADC normalization and stick routing (`analog`)
//! - Merging directional sources and reversal (`directional`)
//! - Turbo and hotkeys (`modifier`)
//! - Building the committed controller state (`state`)

pub mod analog;
pub mod debounce;
pub mod directional;
pub mod logical;
pub mod modifier;
pub mod socd;
pub mod source;
pub mod state;
