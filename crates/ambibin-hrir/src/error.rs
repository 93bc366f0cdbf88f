//! Error types for the HRIR dataset crate.

use thiserror::Error;

/// Errors that can occur when reading, writing, or validating HRIR datasets.
#[derive(Error, Debug)]
pub enum HrirFormatError {
    #[error("Invalid magic bytes: expected AHRD (0x41485244)")]
    InvalidMagic,

    #[error("Unsupported dataset version: {0}")]
    UnsupportedVersion(u16),

    #[error("Dataset contains no measurement directions")]
    EmptyDataset,

    #[error("Dataset declares a zero-length impulse response")]
    ZeroIrLength,

    #[error("Invalid sample rate: {0} (must be positive and finite)")]
    InvalidSampleRate(f64),

    #[error("Direction count exceeded maximum (max {max}, got {got})")]
    TooManyDirections { max: u32, got: u32 },

    #[error("Impulse response length exceeded maximum (max {max}, got {got})")]
    IrLengthExceeded { max: u32, got: u32 },

    #[error("Truncated {section} section: need {expected} bytes, {available} remain")]
    SectionTruncated {
        section: &'static str,
        expected: u64,
        available: u64,
    },

    #[error("Impulse response length mismatch: expected {expected} samples, got {got}")]
    IrLengthMismatch { expected: usize, got: usize },

    #[error("Ear length mismatch within one measurement: left {left}, right {right}")]
    EarLengthMismatch { left: usize, right: usize },

    #[error("Delay values must be provided for all measurements or none")]
    InconsistentDelay,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for HRIR dataset operations.
pub type Result<T> = std::result::Result<T, HrirFormatError>;
