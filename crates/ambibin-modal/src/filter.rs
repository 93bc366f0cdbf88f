//! Modal HRTF filter bank — dense per-harmonic-channel binaural filters.
//!
//! A sparse measurement set cannot be convolved with an Ambisonic signal
//! directly; it first has to be projected into the harmonic domain. The
//! builder here does that with a virtual-loudspeaker decomposition:
//!
//! 1. Generate a quasi-uniform Fibonacci-spiral grid of `V = 2C + 8`
//!    virtual points (always over-determined, since `C = (order + 1)²`).
//! 2. Assign each virtual point the measured impulse-response pair of its
//!    nearest measurement direction.
//! 3. Solve the least-squares modal decoder `D = pinv(Yᵗ)` at the virtual
//!    directions via an SVD-based pseudoinverse.
//! 4. Project the per-speaker impulse responses into `C` harmonic-domain
//!    filters per ear, and taper each degree with Max-rE weights to
//!    suppress the side-lobes of the truncated expansion.
//!
//! Building is deterministic and pure per `(dataset, order)`, so the result
//! is memoized by [`ModalFilterCache`].

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::sync::{Arc, Weak};

use ambibin_hrir::{Direction, HrirDataset};

use crate::basis::{channel_count, compute_basis};
use crate::error::{ModalError, Result};

/// Singular values below this are treated as zero by the pseudoinverse.
const PINV_EPSILON: f64 = 1e-9;

/// A dense per-harmonic-channel, per-ear filter set derived from one
/// dataset at one Ambisonic order.
#[derive(Debug, Clone)]
pub struct ModalFilterBank {
    /// The Ambisonic order this bank was built for.
    order: usize,
    /// Sample rate inherited from the source dataset.
    sample_rate: f64,
    /// One `[left, right]` filter pair per ACN channel, each the same
    /// length as the dataset's impulse responses.
    filters: Vec<[Vec<f32>; 2]>,
}

impl ModalFilterBank {
    /// The Ambisonic order this bank was built for.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of harmonic channels: `(order + 1)²`.
    pub fn channels(&self) -> usize {
        self.filters.len()
    }

    /// Filter length in samples.
    pub fn ir_length(&self) -> usize {
        self.filters.first().map_or(0, |pair| pair[0].len())
    }

    /// Sample rate in Hz inherited from the source dataset.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Per-channel `[left, right]` filter pairs in ACN order.
    pub fn filters(&self) -> &[[Vec<f32>; 2]] {
        &self.filters
    }
}

/// Max-rE tapering weight for degree `n` at the given truncation order:
/// `g(n) = cos(n·π / (2·order + 2))`, identical for all m within a degree.
pub fn max_re_weight(order: usize, degree: usize) -> f64 {
    (degree as f64 * PI / (2.0 * order as f64 + 2.0)).cos()
}

/// Quasi-uniform Fibonacci-spiral point set on the sphere.
///
/// For index i in [0, count): colatitude = arccos(1 − 2(i + 0.5)/count),
/// azimuth = (π(1 + √5)(i + 0.5) mod 2π) − π. Returned as directions in
/// radians (elevation = π/2 − colatitude).
pub fn fibonacci_grid(count: usize) -> Vec<Direction> {
    let golden = PI * (1.0 + 5.0f64.sqrt());
    (0..count)
        .map(|i| {
            let idx = i as f64 + 0.5;
            let colatitude = (1.0 - 2.0 * idx / count as f64).acos();
            let azimuth = (golden * idx) % TAU - PI;
            Direction {
                azimuth: azimuth as f32,
                elevation: (FRAC_PI_2 - colatitude) as f32,
            }
        })
        .collect()
}

/// Build the modal filter bank for `order` from a loaded dataset.
///
/// The least-squares solve is attempted even for degenerate, near-empty
/// datasets (fewer measurements than harmonic channels); that situation is
/// logged rather than treated as a hard failure.
pub fn build_filter_bank(dataset: &HrirDataset, order: usize) -> Result<ModalFilterBank> {
    if dataset.direction_count() == 0 {
        return Err(ModalError::EmptyDataset);
    }

    let channels = channel_count(order);
    let virtual_count = 2 * channels + 8;
    tracing::info!(
        order,
        channels,
        virtual_count,
        measurements = dataset.direction_count(),
        "Building modal filter bank"
    );
    if virtual_count <= channels {
        tracing::warn!(
            virtual_count,
            channels,
            "Virtual grid does not over-determine the modal solve"
        );
    }
    if dataset.direction_count() < channels {
        tracing::warn!(
            measurements = dataset.direction_count(),
            channels,
            "Dataset is sparser than the harmonic channel count; \
             expect a poorly conditioned projection"
        );
    }

    // Nearest measured direction per virtual point, by maximal dot product
    // of unit vectors (equivalently, minimal angular distance). Ties go to
    // the first-encountered index.
    let grid = fibonacci_grid(virtual_count);
    let measured: Vec<[f64; 3]> = dataset.directions().iter().map(|d| d.unit_vector()).collect();
    let nearest: Vec<usize> = grid
        .iter()
        .map(|point| {
            let v = point.unit_vector();
            let mut best = 0;
            let mut best_dot = f64::NEG_INFINITY;
            for (i, m) in measured.iter().enumerate() {
                let dot = v[0] * m[0] + v[1] * m[1] + v[2] * m[2];
                if dot > best_dot {
                    best_dot = dot;
                    best = i;
                }
            }
            best
        })
        .collect();

    // Least-squares modal decoder at the virtual directions: D = pinv(Yᵗ),
    // V × C, so that column c of D holds the per-speaker weights recovering
    // harmonic channel c.
    let azimuths: Vec<f64> = grid.iter().map(|d| d.azimuth as f64).collect();
    let elevations: Vec<f64> = grid.iter().map(|d| d.elevation as f64).collect();
    let basis = compute_basis(order, &azimuths, &elevations);
    let decoder = basis
        .transpose()
        .pseudo_inverse(PINV_EPSILON)
        .map_err(|e| ModalError::DecompositionFailed(e.to_string()))?;

    // Project the virtual-speaker impulse responses into the harmonic
    // domain, one weighted sum per channel per ear, then taper by degree.
    let ir_length = dataset.ir_length();
    let irs = dataset.impulse_responses();
    let mut filters = Vec::with_capacity(channels);
    for channel in 0..channels {
        let degree = (channel as f64).sqrt().floor() as usize;
        let weight = max_re_weight(order, degree);

        let mut pair = [vec![0.0f32; ir_length], vec![0.0f32; ir_length]];
        for (ear, filter) in pair.iter_mut().enumerate() {
            let mut accum = vec![0.0f64; ir_length];
            for (v, &source) in nearest.iter().enumerate() {
                let gain = decoder[(v, channel)];
                for (acc, &sample) in accum.iter_mut().zip(irs[source][ear].iter()) {
                    *acc += gain * sample as f64;
                }
            }
            for (out, acc) in filter.iter_mut().zip(accum.iter()) {
                *out = (acc * weight) as f32;
            }
        }
        filters.push(pair);
    }

    Ok(ModalFilterBank {
        order,
        sample_rate: dataset.sample_rate(),
        filters,
    })
}

/// Single-entry memo for filter banks, keyed by dataset identity and order.
///
/// Rebuilding for the same `(dataset, order)` pair is a no-op returning the
/// shared bank; requesting a different order or dataset replaces the entry.
/// The build counter makes idempotence observable in tests.
#[derive(Default)]
pub struct ModalFilterCache {
    entry: Option<CacheEntry>,
    builds: usize,
}

struct CacheEntry {
    dataset: Weak<HrirDataset>,
    order: usize,
    bank: Arc<ModalFilterBank>,
}

impl ModalFilterCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the bank for `(dataset, order)`, building it on a miss.
    pub fn get_or_build(
        &mut self,
        dataset: &Arc<HrirDataset>,
        order: usize,
    ) -> Result<Arc<ModalFilterBank>> {
        if let Some(entry) = &self.entry {
            if entry.order == order && entry.dataset.ptr_eq(&Arc::downgrade(dataset)) {
                tracing::debug!(order, "Filter bank cache hit");
                return Ok(Arc::clone(&entry.bank));
            }
        }

        let bank = Arc::new(build_filter_bank(dataset, order)?);
        self.builds += 1;
        self.entry = Some(CacheEntry {
            dataset: Arc::downgrade(dataset),
            order,
            bank: Arc::clone(&bank),
        });
        Ok(bank)
    }

    /// How many banks this cache has built (test observability).
    pub fn builds(&self) -> usize {
        self.builds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambibin_hrir::{read_dataset, HrirWriter};
    use std::path::Path;

    /// A dataset whose impulse response is the same unit delta in every
    /// direction. Projecting it must put all energy in the W channel.
    fn write_delta_dataset(path: &Path, directions: usize, ir_length: usize) {
        let mut writer = HrirWriter::new(48_000.0);
        let grid = fibonacci_grid(directions);
        for d in grid {
            let mut ir = vec![0.0f32; ir_length];
            ir[0] = 1.0;
            writer
                .add_measurement(d.azimuth, d.elevation, ir.clone(), ir)
                .unwrap();
        }
        writer.finalize(path).unwrap();
    }

    #[test]
    fn test_fibonacci_grid_shape() {
        let grid = fibonacci_grid(26);
        assert_eq!(grid.len(), 26);
        for d in &grid {
            let [x, y, z] = d.unit_vector();
            let norm = (x * x + y * y + z * z).sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
            assert!(d.azimuth >= -(std::f32::consts::PI) && d.azimuth <= std::f32::consts::PI);
        }
        // Poles are approached but never hit exactly (half-integer offset).
        assert!(grid[0].elevation.abs() < std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_grid_over_determines_solve() {
        for order in 0..=7 {
            let channels = channel_count(order);
            assert!(2 * channels + 8 > channels);
        }
    }

    #[test]
    fn test_max_re_weights() {
        // Degree 0 is never attenuated; the top degree is tapered hardest.
        assert!((max_re_weight(3, 0) - 1.0).abs() < 1e-12);
        let g3 = max_re_weight(3, 3);
        assert!(g3 > 0.0 && g3 < 1.0);
        assert!(max_re_weight(3, 1) > max_re_weight(3, 2));
        assert!((g3 - (3.0 * std::f64::consts::PI / 8.0).cos()).abs() < 1e-12);
    }

    #[test]
    fn test_delta_dataset_collapses_to_w() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delta.hrir");
        write_delta_dataset(&path, 64, 8);
        let dataset = read_dataset(&path).unwrap();

        let bank = build_filter_bank(&dataset, 1).unwrap();
        assert_eq!(bank.channels(), 4);
        assert_eq!(bank.ir_length(), 8);

        // Direction-independent measurements have only an omnidirectional
        // component: W recovers the delta, higher channels stay silent.
        let w = &bank.filters()[0];
        assert!((w[0][0] - 1.0).abs() < 1e-4, "W left = {}", w[0][0]);
        assert!((w[1][0] - 1.0).abs() < 1e-4);
        for channel in 1..4 {
            for ear in 0..2 {
                for &sample in &bank.filters()[channel][ear] {
                    assert!(
                        sample.abs() < 1e-4,
                        "channel {} ear {} leaked {}",
                        channel,
                        ear,
                        sample
                    );
                }
            }
        }
    }

    #[test]
    fn test_cache_idempotence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delta.hrir");
        write_delta_dataset(&path, 32, 4);
        let dataset = std::sync::Arc::new(read_dataset(&path).unwrap());

        let mut cache = ModalFilterCache::new();
        let first = cache.get_or_build(&dataset, 1).unwrap();
        let second = cache.get_or_build(&dataset, 1).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.builds(), 1);

        // A different order rebuilds and replaces the entry.
        let third = cache.get_or_build(&dataset, 2).unwrap();
        assert_eq!(third.channels(), 9);
        assert_eq!(cache.builds(), 2);

        // Coming back to the evicted order rebuilds again (single entry).
        cache.get_or_build(&dataset, 1).unwrap();
        assert_eq!(cache.builds(), 3);
    }

    #[test]
    fn test_cache_distinguishes_datasets() {
        let dir = tempfile::tempdir().unwrap();
        let path_a = dir.path().join("a.hrir");
        let path_b = dir.path().join("b.hrir");
        write_delta_dataset(&path_a, 32, 4);
        write_delta_dataset(&path_b, 32, 4);
        let a = std::sync::Arc::new(read_dataset(&path_a).unwrap());
        let b = std::sync::Arc::new(read_dataset(&path_b).unwrap());

        let mut cache = ModalFilterCache::new();
        cache.get_or_build(&a, 1).unwrap();
        cache.get_or_build(&b, 1).unwrap();
        assert_eq!(cache.builds(), 2);
    }

    #[test]
    fn test_sparse_dataset_still_builds() {
        // Fewer measurements than harmonic channels is degenerate but
        // accepted: the solve proceeds.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparse.hrir");
        write_delta_dataset(&path, 3, 4);
        let dataset = read_dataset(&path).unwrap();

        let bank = build_filter_bank(&dataset, 2).unwrap();
        assert_eq!(bank.channels(), 9);
    }
}
