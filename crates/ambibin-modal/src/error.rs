//! Error types for the modal filter crate.

use thiserror::Error;

/// Errors that can occur while building modal filter banks.
#[derive(Error, Debug)]
pub enum ModalError {
    /// The SVD underlying the least-squares decoder did not converge.
    #[error("Pseudoinverse computation failed: {0}")]
    DecompositionFailed(String),

    /// The dataset has no measurements to project.
    #[error("Cannot build a filter bank from an empty dataset")]
    EmptyDataset,
}

/// Convenience Result type for modal filter operations.
pub type Result<T> = std::result::Result<T, ModalError>;
