//! # Error Types
//!
//! Custom error types for the input pipeline using `thiserror`.

use thiserror::Error;

use crate::input::logical::LogicalInput;

/// Main error type for the input pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// TOML parse errors
    #[error("Configuration error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A configuration value outside its valid range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Two logical inputs bound to the same physical pin
    #[error("Pin {pin} is bound to both {first} and {second}")]
    ConfigurationConflict {
        pin: u8,
        first: String,
        second: String,
    },

    /// A binding outside the pins the board exposes
    #[error("Pin {pin} for {input} is out of range")]
    PinOutOfRange { input: String, pin: i32 },

    /// A read from a physical source failed or timed out
    #[error("Sample fault on pin {pin}")]
    SampleFault { pin: u8 },

    /// A cycle took longer than its time budget
    #[error("Cycle overrun: {elapsed_us}us exceeds budget of {budget_us}us")]
    SchedulingOverrun { elapsed_us: u64, budget_us: u64 },

    /// Malformed replay script
    #[error("Replay error: {0}")]
    Replay(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Builds a conflict error for two inputs sharing `pin`.
    pub(crate) fn conflict(pin: u8, first: impl ToString, second: impl ToString) -> Self {
        Self::ConfigurationConflict {
            pin,
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    /// Builds an out-of-range error for a digital input binding.
    pub(crate) fn out_of_range(input: LogicalInput, pin: i32) -> Self {
        Self::PinOutOfRange {
            input: input.to_string(),
            pin,
        }
    }
}

/// Result type alias for the input pipeline
pub type Result<T> = std::result::Result<T, PipelineError>;
