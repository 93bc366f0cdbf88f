//! Error types for the renderer crate.

use thiserror::Error;

/// Errors that can occur during a render.
///
/// All of these abort the render before or without leaving partial output;
/// mid-stream channel-count anomalies are recovered locally instead and
/// never surface here.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The input channel count cannot be an Ambisonic channel layout.
    #[error("Input channel count {0} is not a perfect square; cannot infer Ambisonic order")]
    OrderInference(usize),

    /// The directional dataset failed to load or validate.
    #[error("Dataset error: {0}")]
    Dataset(#[from] ambibin_hrir::HrirFormatError),

    /// The modal filter bank could not be built.
    #[error("Filter bank error: {0}")]
    Modal(#[from] ambibin_modal::ModalError),

    /// Unreadable input or unwritable output audio.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Other I/O failure (temporary file, rename).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;
