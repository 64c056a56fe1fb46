//! # Gamepad Pipeline Library
//!
//! Input resolution for game-controller firmware.
//!
//! Each cycle the pipeline samples raw pin and ADC state, debounces it,
//! resolves opposing directions (SOCD), merges directional sources, applies
//! turbo and hotkeys, and commits one canonical [`ControllerState`] snapshot
//! for a report encoder to consume.
//!
//! [`ControllerState`]: input::state::ControllerState

pub mod config;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod trace;
