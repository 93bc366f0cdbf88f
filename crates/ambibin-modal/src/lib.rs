//! # ambibin-modal — modal HRTF filter banks
//!
//! Converts a sparse directional HRIR dataset into the dense
//! per-harmonic-channel filter bank the streaming renderer convolves
//! against.
//!
//! ## Architecture
//!
//! - **[`basis`]**: real SN3D spherical harmonics in ACN order for
//!   arbitrary direction sets and orders. A pure function with no state.
//! - **[`filter`]**: the virtual-loudspeaker least-squares projection —
//!   Fibonacci grid, nearest-measurement mapping, SVD pseudoinverse
//!   decoder, Max-rE tapering — plus [`ModalFilterCache`], the
//!   single-entry memo keyed by `(dataset identity, order)`.
//! - **[`error`]**: error types for filter-bank construction.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ambibin_hrir::HrirLoader;
//! use ambibin_modal::ModalFilterCache;
//! use std::path::Path;
//!
//! let mut loader = HrirLoader::new();
//! let dataset = loader.load(Path::new("kemar.hrir")).unwrap();
//!
//! let mut cache = ModalFilterCache::new();
//! let bank = cache.get_or_build(&dataset, 3).unwrap();
//! assert_eq!(bank.channels(), 16);
//! ```

pub mod basis;
pub mod error;
pub mod filter;

pub use basis::{channel_count, compute_basis};
pub use error::{ModalError, Result};
pub use filter::{build_filter_bank, fibonacci_grid, ModalFilterBank, ModalFilterCache};
