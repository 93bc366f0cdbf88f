//! # ambibin-hrir — HRIR measurement datasets for the ambibin renderer
//!
//! Reads and writes `.hrir` files: sparse, irregularly-sampled sets of
//! binaural impulse responses indexed by measurement direction, as produced
//! from head-related transfer function measurements.
//!
//! ## Architecture
//!
//! - **[`dataset`]**: the immutable in-memory measurement table
//!   ([`HrirDataset`]) plus angle-unit normalization.
//! - **[`reader`]** / **[`writer`]**: the binary container format
//!   (magic `AHRD`, fixed header, positions / impulse responses / optional
//!   delays), with strict shape validation on read.
//! - **[`loader`]**: [`HrirLoader`], a single-entry cache keyed by path so
//!   repeated renders against the same head model skip re-parsing.
//! - **[`error`]**: error types for all dataset operations.
//!
//! Angles in a container may be stored in degrees or radians; the reader
//! detects the unit per angle column (any magnitude above 2π implies
//! degrees) and exposes radians throughout.

pub mod dataset;
pub mod error;
pub mod header;
pub mod loader;
pub mod reader;
pub mod writer;

pub use dataset::{Direction, HrirDataset, DELAY_EPSILON};
pub use error::{HrirFormatError, Result};
pub use header::{DatasetFlags, HrirHeader};
pub use loader::HrirLoader;
pub use reader::read_dataset;
pub use writer::HrirWriter;
