//! Path-cached dataset loader.
//!
//! Rendering sessions tend to reuse one head model across many files, so the
//! loader remembers the last successfully loaded path and hands back the same
//! shared dataset for repeated requests. Loading a different path fully
//! replaces the cached entry; there is no merging.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dataset::HrirDataset;
use crate::error::Result;
use crate::reader::read_dataset;

/// Loads `.hrir` datasets with single-entry caching by path.
///
/// # Example
///
/// ```rust,no_run
/// use ambibin_hrir::HrirLoader;
/// use std::path::Path;
///
/// let mut loader = HrirLoader::new();
/// let dataset = loader.load(Path::new("kemar.hrir")).unwrap();
/// // A second load of the same path is a no-op returning the same Arc.
/// let again = loader.load(Path::new("kemar.hrir")).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&dataset, &again));
/// ```
#[derive(Default)]
pub struct HrirLoader {
    /// The last successfully loaded path and its dataset.
    current: Option<(PathBuf, Arc<HrirDataset>)>,
}

impl HrirLoader {
    /// Create a loader with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the dataset at `path`, reusing the cached copy when the path
    /// matches the previous successful load.
    ///
    /// A failed load leaves the existing cache entry untouched.
    pub fn load(&mut self, path: &Path) -> Result<Arc<HrirDataset>> {
        if let Some((cached_path, dataset)) = &self.current {
            if cached_path == path {
                tracing::debug!("Dataset already loaded: {}", path.display());
                return Ok(Arc::clone(dataset));
            }
        }

        let dataset = Arc::new(read_dataset(path)?);
        self.current = Some((path.to_path_buf(), Arc::clone(&dataset)));
        Ok(dataset)
    }

    /// The currently cached dataset, if any.
    pub fn current(&self) -> Option<&Arc<HrirDataset>> {
        self.current.as_ref().map(|(_, dataset)| dataset)
    }
}
