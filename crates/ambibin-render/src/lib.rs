//! # ambibin-render: streaming binaural rendering
//!
//! Turns a multichannel Ambisonic WAV into a stereo binaural WAV by
//! convolving each harmonic channel against a modal filter bank.
//!
//! ## Architecture
//!
//! - **[`convolver`]**: overlap-add FFT convolution of one block of
//!   channel-major samples against precomputed filter spectra.
//! - **[`renderer`]**: the two-pass driver. Pass one scans the convolved
//!   peak; pass two writes the normalized output through a temporary
//!   file that is renamed into place on success.
//! - **[`progress`]**: integer-percentage progress reporting shared by
//!   both passes, always ending at 100.
//! - **[`error`]**: error types for the render pipeline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ambibin_render::{BinauralRenderer, NullProgress, RenderOptions};
//! use std::path::Path;
//!
//! let mut renderer = BinauralRenderer::new();
//! let summary = renderer
//!     .render(
//!         Path::new("scene.wav"),
//!         Path::new("binaural.wav"),
//!         Path::new("kemar.hrir"),
//!         &RenderOptions::default(),
//!         &mut NullProgress,
//!     )
//!     .unwrap();
//! println!("rendered {} frames at gain {}", summary.frames, summary.gain);
//! ```

pub mod convolver;
pub mod error;
pub mod progress;
pub mod renderer;

pub use convolver::BlockConvolver;
pub use error::{RenderError, Result};
pub use progress::{NullProgress, ProgressReporter, ProgressSink};
pub use renderer::{
    infer_order, BinauralRenderer, RenderOptions, RenderSummary, DEFAULT_BLOCK_SIZE,
};
