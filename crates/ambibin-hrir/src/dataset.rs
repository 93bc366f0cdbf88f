//! In-memory representation of a loaded HRIR measurement set.
//!
//! A dataset is a table of binaural impulse responses indexed by measurement
//! direction, plus the shared sample rate and an optional per-direction delay
//! component. It is immutable after load and cheap to share behind an `Arc`.

use std::f32::consts::TAU;

/// Delays with no entry larger than this are considered absent — the delay
/// component is then assumed to be embedded in the impulse responses.
pub const DELAY_EPSILON: f32 = 1e-9;

/// A measurement direction in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    /// Azimuth in radians, counter-clockwise from front.
    pub azimuth: f32,
    /// Elevation in radians, upward from the horizontal plane.
    pub elevation: f32,
}

impl Direction {
    /// Unit vector for this direction: `[x, y, z]` with x front, y left, z up.
    pub fn unit_vector(&self) -> [f64; 3] {
        let az = self.azimuth as f64;
        let el = self.elevation as f64;
        [el.cos() * az.cos(), el.cos() * az.sin(), el.sin()]
    }
}

/// One loaded HRIR measurement set.
///
/// All impulse responses share a single fixed length and sample rate.
/// Directions are stored in radians; the degrees-vs-radians detection rule
/// (see [`normalize_angles`]) has already been applied by the reader.
#[derive(Debug, Clone)]
pub struct HrirDataset {
    /// Measurement directions, one per impulse-response pair.
    directions: Vec<Direction>,
    /// Impulse responses per direction: `[left, right]` sample sequences.
    impulse_responses: Vec<[Vec<f32>; 2]>,
    /// Sample rate in Hz shared by all impulse responses.
    sample_rate: f64,
    /// Optional per-direction `[left, right]` delays in samples.
    /// `None` when the stored delay section was absent or all-zero.
    delays: Option<Vec<[f32; 2]>>,
}

impl HrirDataset {
    /// Assemble a dataset from already-validated parts.
    ///
    /// Callers are expected to have checked shape invariants (equal IR
    /// lengths, directions matching measurements); the reader and writer in
    /// this crate do so before constructing a dataset.
    pub(crate) fn from_parts(
        directions: Vec<Direction>,
        impulse_responses: Vec<[Vec<f32>; 2]>,
        sample_rate: f64,
        delays: Option<Vec<[f32; 2]>>,
    ) -> Self {
        debug_assert_eq!(directions.len(), impulse_responses.len());
        Self {
            directions,
            impulse_responses,
            sample_rate,
            delays,
        }
    }

    /// Number of measurement directions.
    pub fn direction_count(&self) -> usize {
        self.directions.len()
    }

    /// Impulse response length in samples (shared by every measurement).
    pub fn ir_length(&self) -> usize {
        self.impulse_responses
            .first()
            .map_or(0, |pair| pair[0].len())
    }

    /// Measurement directions in radians.
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// Impulse responses, one `[left, right]` pair per direction.
    pub fn impulse_responses(&self) -> &[[Vec<f32>; 2]] {
        &self.impulse_responses
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Per-direction `[left, right]` delays in samples, if the dataset
    /// stores a non-trivial delay component.
    pub fn delays(&self) -> Option<&[[f32; 2]]> {
        self.delays.as_deref()
    }
}

/// Convert a column of stored angles to radians in place.
///
/// The container does not record its angle unit. Any component with
/// magnitude above 2π cannot be a radian value, so such a column is taken
/// to be degrees and converted. This threshold is a compatibility
/// heuristic inherited from common measurement-set tooling, not a
/// guaranteed marker of the format.
pub fn normalize_angles(values: &mut [f32]) {
    let max_abs = values.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    if max_abs > TAU {
        for v in values.iter_mut() {
            *v = v.to_radians();
        }
    }
}

/// True when every delay entry is within [`DELAY_EPSILON`] of zero.
pub fn delays_are_trivial(delays: &[[f32; 2]]) -> bool {
    delays
        .iter()
        .all(|d| d[0].abs() <= DELAY_EPSILON && d[1].abs() <= DELAY_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_angles_degrees() {
        let mut angles = vec![0.0f32, 90.0, -180.0];
        normalize_angles(&mut angles);
        assert!((angles[1] - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((angles[2] + std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_angles_radians_untouched() {
        // All values within ±2π are treated as radians already.
        let mut angles = vec![0.0f32, 1.5, -3.1, 6.2];
        let before = angles.clone();
        normalize_angles(&mut angles);
        assert_eq!(angles, before);
    }

    #[test]
    fn test_normalize_angles_mixed_column() {
        // A single out-of-range value forces the whole column to degrees.
        let mut angles = vec![0.0f32, 7.0, 1.0];
        normalize_angles(&mut angles);
        assert!((angles[1] - 7.0f32.to_radians()).abs() < 1e-6);
        assert!((angles[2] - 1.0f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_trivial_delays() {
        assert!(delays_are_trivial(&[[0.0, 0.0], [1e-10, -1e-10]]));
        assert!(!delays_are_trivial(&[[0.0, 0.0], [0.5, 0.0]]));
    }

    #[test]
    fn test_direction_unit_vector() {
        let front = Direction {
            azimuth: 0.0,
            elevation: 0.0,
        };
        let [x, y, z] = front.unit_vector();
        assert!((x - 1.0).abs() < 1e-9);
        assert!(y.abs() < 1e-9);
        assert!(z.abs() < 1e-9);

        let up = Direction {
            azimuth: 0.0,
            elevation: std::f32::consts::FRAC_PI_2,
        };
        let [_, _, z] = up.unit_vector();
        assert!((z - 1.0).abs() < 1e-6);
    }
}
