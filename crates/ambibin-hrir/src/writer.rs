//! Dataset file writer — serializes measurement sets into the `.hrir` format.
//!
//! The writer uses a builder pattern: create an [`HrirWriter`], add
//! measurements, then call [`HrirWriter::finalize`] to write the complete
//! file to disk. Primarily used by dataset conversion tooling and tests.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{HrirFormatError, Result};
use crate::header::{DatasetFlags, HRIR_MAGIC, HRIR_VERSION};

/// One pending measurement: direction, impulse-response pair, optional delay.
#[derive(Debug, Clone)]
struct Measurement {
    azimuth: f32,
    elevation: f32,
    left: Vec<f32>,
    right: Vec<f32>,
    delay: Option<[f32; 2]>,
}

/// Builder for creating `.hrir` dataset files.
///
/// Collects per-direction measurements and writes the binary container in a
/// single [`finalize`](HrirWriter::finalize) call. Angles may be given in
/// degrees or radians; the reader's unit detection handles either, as long
/// as one unit is used consistently per angle column.
///
/// # Example
///
/// ```rust,no_run
/// use ambibin_hrir::HrirWriter;
/// use std::path::Path;
///
/// let mut writer = HrirWriter::new(48_000.0);
/// writer.add_measurement(0.0, 0.0, vec![1.0, 0.5], vec![1.0, 0.5]).unwrap();
/// writer.finalize(Path::new("front.hrir")).unwrap();
/// ```
pub struct HrirWriter {
    /// Sample rate in Hz shared by all impulse responses.
    sample_rate: f64,
    /// Measurements in insertion order.
    measurements: Vec<Measurement>,
}

impl HrirWriter {
    /// Create a new writer for a dataset at the given sample rate.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            measurements: Vec::new(),
        }
    }

    /// Add one measurement: a direction and its `[left, right]` impulse
    /// response pair.
    ///
    /// # Errors
    ///
    /// Fails if the two ears differ in length, or if the length differs
    /// from previously added measurements (all impulse responses in a
    /// dataset share one fixed length).
    pub fn add_measurement(
        &mut self,
        azimuth: f32,
        elevation: f32,
        left: Vec<f32>,
        right: Vec<f32>,
    ) -> Result<&mut Self> {
        self.push_measurement(azimuth, elevation, left, right, None)
    }

    /// Add one measurement with an explicit `[left, right]` delay in samples.
    ///
    /// Either every measurement carries a delay or none does; mixing the
    /// two fails at [`finalize`](HrirWriter::finalize).
    pub fn add_measurement_with_delay(
        &mut self,
        azimuth: f32,
        elevation: f32,
        left: Vec<f32>,
        right: Vec<f32>,
        delay: [f32; 2],
    ) -> Result<&mut Self> {
        self.push_measurement(azimuth, elevation, left, right, Some(delay))
    }

    fn push_measurement(
        &mut self,
        azimuth: f32,
        elevation: f32,
        left: Vec<f32>,
        right: Vec<f32>,
        delay: Option<[f32; 2]>,
    ) -> Result<&mut Self> {
        if left.len() != right.len() {
            return Err(HrirFormatError::EarLengthMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        if let Some(first) = self.measurements.first() {
            if left.len() != first.left.len() {
                return Err(HrirFormatError::IrLengthMismatch {
                    expected: first.left.len(),
                    got: left.len(),
                });
            }
        }
        self.measurements.push(Measurement {
            azimuth,
            elevation,
            left,
            right,
            delay,
        });
        Ok(self)
    }

    /// Write the complete `.hrir` file to `path`.
    ///
    /// # Errors
    ///
    /// Fails if no measurements were added, the sample rate is invalid,
    /// delays were provided for only some measurements, or on I/O errors.
    pub fn finalize(&self, path: &Path) -> Result<()> {
        let first = self
            .measurements
            .first()
            .ok_or(HrirFormatError::EmptyDataset)?;
        let ir_length = first.left.len();
        if ir_length == 0 {
            return Err(HrirFormatError::ZeroIrLength);
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(HrirFormatError::InvalidSampleRate(self.sample_rate));
        }

        let with_delay = self.measurements.iter().filter(|m| m.delay.is_some()).count();
        let has_delay = match with_delay {
            0 => false,
            n if n == self.measurements.len() => true,
            _ => return Err(HrirFormatError::InconsistentDelay),
        };

        let mut flags = DatasetFlags::new();
        if has_delay {
            flags.set(DatasetFlags::DELAY);
        }

        tracing::debug!(
            directions = self.measurements.len(),
            ir_length,
            has_delay,
            "Writing HRIR dataset: {}",
            path.display()
        );

        let mut out = BufWriter::new(File::create(path)?);

        // --- Header ---
        out.write_all(&HRIR_MAGIC)?;
        out.write_u16::<LittleEndian>(HRIR_VERSION)?;
        out.write_u16::<LittleEndian>(flags.0)?;
        out.write_u32::<LittleEndian>(self.measurements.len() as u32)?;
        out.write_u32::<LittleEndian>(ir_length as u32)?;
        out.write_f64::<LittleEndian>(self.sample_rate)?;
        out.write_all(&[0u8; 8])?;

        // --- Source positions ---
        for m in &self.measurements {
            out.write_f32::<LittleEndian>(m.azimuth)?;
            out.write_f32::<LittleEndian>(m.elevation)?;
        }

        // --- Impulse responses ---
        for m in &self.measurements {
            for sample in m.left.iter().chain(m.right.iter()) {
                out.write_f32::<LittleEndian>(*sample)?;
            }
        }

        // --- Delay section ---
        if has_delay {
            for m in &self.measurements {
                let delay = m.delay.expect("checked above");
                out.write_f32::<LittleEndian>(delay[0])?;
                out.write_f32::<LittleEndian>(delay[1])?;
            }
        }

        out.flush()?;
        Ok(())
    }
}
