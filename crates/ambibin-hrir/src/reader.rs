//! Dataset file reader — deserializes `.hrir` measurement sets.
//!
//! The reader parses the 32-byte header and the position, impulse-response,
//! and optional delay sections. It validates magic bytes, format version,
//! and the declared shape against the actual file size before exposing the
//! data as an immutable [`HrirDataset`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::dataset::{delays_are_trivial, normalize_angles, Direction, HrirDataset};
use crate::error::{HrirFormatError, Result};
use crate::header::{DatasetFlags, HrirHeader, HEADER_SIZE, HRIR_MAGIC};

/// Maximum number of measurement directions per file (security limit).
const MAX_DIRECTIONS: u32 = 65_536;

/// Maximum impulse response length in samples (security limit).
const MAX_IR_LENGTH: u32 = 1 << 20;

/// Open and fully parse a `.hrir` dataset file.
///
/// This performs the following steps:
/// 1. Reads and validates the 32-byte header (magic, version, shape).
/// 2. Checks that every declared section fits within the file.
/// 3. Reads source positions and applies the degrees-vs-radians rule
///    per angle column.
/// 4. Reads the impulse-response tensor (directions × ears × samples).
/// 5. Reads the delay section if flagged, dropping it when all-zero.
///
/// # Errors
///
/// Returns [`HrirFormatError`] if the file is missing, truncated, or does
/// not conform to the dataset format.
pub fn read_dataset(path: &Path) -> Result<HrirDataset> {
    tracing::info!("Opening HRIR dataset: {}", path.display());

    let file = File::open(path)?;
    let file_size = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let header = read_header(&mut reader)?;
    tracing::info!(
        version = header.version,
        directions = header.direction_count,
        ir_length = header.ir_length,
        sample_rate = header.sample_rate,
        "Parsed dataset header"
    );

    let n = header.direction_count as u64;
    let s = header.ir_length as u64;

    // Every section size is derivable from the header; verify the file is
    // large enough before allocating anything.
    let position_bytes = n * 2 * 4;
    let ir_bytes = n * 2 * s * 4;
    let delay_bytes = if header.flags.has(DatasetFlags::DELAY) {
        n * 2 * 4
    } else {
        0
    };

    let mut offset = HEADER_SIZE as u64;
    for (section, bytes) in [
        ("position", position_bytes),
        ("impulse-response", ir_bytes),
        ("delay", delay_bytes),
    ] {
        if offset + bytes > file_size {
            return Err(HrirFormatError::SectionTruncated {
                section,
                expected: bytes,
                available: file_size.saturating_sub(offset),
            });
        }
        offset += bytes;
    }

    // --- Source positions ---
    let count = header.direction_count as usize;
    let mut azimuths = Vec::with_capacity(count);
    let mut elevations = Vec::with_capacity(count);
    for _ in 0..count {
        azimuths.push(reader.read_f32::<LittleEndian>()?);
        elevations.push(reader.read_f32::<LittleEndian>()?);
    }
    normalize_angles(&mut azimuths);
    normalize_angles(&mut elevations);
    let directions: Vec<Direction> = azimuths
        .iter()
        .zip(elevations.iter())
        .map(|(&azimuth, &elevation)| Direction { azimuth, elevation })
        .collect();

    // --- Impulse responses ---
    let ir_length = header.ir_length as usize;
    let mut impulse_responses = Vec::with_capacity(count);
    for _ in 0..count {
        let left = read_f32_block(&mut reader, ir_length)?;
        let right = read_f32_block(&mut reader, ir_length)?;
        impulse_responses.push([left, right]);
    }

    // --- Optional delay section ---
    let delays = if header.flags.has(DatasetFlags::DELAY) {
        let mut delays = Vec::with_capacity(count);
        for _ in 0..count {
            let left = reader.read_f32::<LittleEndian>()?;
            let right = reader.read_f32::<LittleEndian>()?;
            delays.push([left, right]);
        }
        if delays_are_trivial(&delays) {
            tracing::debug!("Delay section is all-zero, treating as absent");
            None
        } else {
            tracing::warn!(
                "Dataset stores a non-trivial delay component; delays are \
                 assumed to be embedded in the impulse responses and are \
                 not applied separately"
            );
            Some(delays)
        }
    } else {
        None
    };

    Ok(HrirDataset::from_parts(
        directions,
        impulse_responses,
        header.sample_rate,
        delays,
    ))
}

/// Read and validate the fixed 32-byte header.
fn read_header<R: Read>(reader: &mut R) -> Result<HrirHeader> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != HRIR_MAGIC {
        return Err(HrirFormatError::InvalidMagic);
    }

    let version = reader.read_u16::<LittleEndian>()?;
    if version != crate::header::HRIR_VERSION {
        return Err(HrirFormatError::UnsupportedVersion(version));
    }

    let flags = DatasetFlags(reader.read_u16::<LittleEndian>()?);
    let direction_count = reader.read_u32::<LittleEndian>()?;
    let ir_length = reader.read_u32::<LittleEndian>()?;
    let sample_rate = reader.read_f64::<LittleEndian>()?;

    let mut reserved = [0u8; 8];
    reader.read_exact(&mut reserved)?;

    if direction_count == 0 {
        return Err(HrirFormatError::EmptyDataset);
    }
    if direction_count > MAX_DIRECTIONS {
        return Err(HrirFormatError::TooManyDirections {
            max: MAX_DIRECTIONS,
            got: direction_count,
        });
    }
    if ir_length == 0 {
        return Err(HrirFormatError::ZeroIrLength);
    }
    if ir_length > MAX_IR_LENGTH {
        return Err(HrirFormatError::IrLengthExceeded {
            max: MAX_IR_LENGTH,
            got: ir_length,
        });
    }
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(HrirFormatError::InvalidSampleRate(sample_rate));
    }

    Ok(HrirHeader {
        version,
        flags,
        direction_count,
        ir_length,
        sample_rate,
    })
}

/// Read `len` little-endian f32 samples.
fn read_f32_block<R: Read>(reader: &mut R, len: usize) -> Result<Vec<f32>> {
    let mut block = vec![0.0f32; len];
    reader.read_f32_into::<LittleEndian>(&mut block)?;
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::HrirWriter;
    use std::io::Write;

    #[test]
    fn test_invalid_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.hrir");
        std::fs::write(&path, b"WAVExxxxxxxxxxxxxxxxxxxxxxxxxxxx").unwrap();

        let result = read_dataset(&path);
        assert!(matches!(result, Err(HrirFormatError::InvalidMagic)));
    }

    #[test]
    fn test_truncated_ir_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trunc.hrir");

        // Write a valid header claiming 4 directions of 64 samples, then
        // only the position section.
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&HRIR_MAGIC).unwrap();
        file.write_all(&1u16.to_le_bytes()).unwrap(); // version
        file.write_all(&0u16.to_le_bytes()).unwrap(); // flags
        file.write_all(&4u32.to_le_bytes()).unwrap(); // directions
        file.write_all(&64u32.to_le_bytes()).unwrap(); // ir_length
        file.write_all(&48_000.0f64.to_le_bytes()).unwrap();
        file.write_all(&[0u8; 8]).unwrap(); // reserved
        file.write_all(&vec![0u8; 4 * 2 * 4]).unwrap(); // positions only
        drop(file);

        let result = read_dataset(&path);
        assert!(matches!(
            result,
            Err(HrirFormatError::SectionTruncated {
                section: "impulse-response",
                ..
            })
        ));
    }

    #[test]
    fn test_round_trip_radian_positions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.hrir");

        let mut writer = HrirWriter::new(44_100.0);
        writer
            .add_measurement(0.5, -0.25, vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0])
            .unwrap();
        writer
            .add_measurement(-1.5, 0.75, vec![0.5, 0.5, 0.0], vec![0.25, 0.0, 0.25])
            .unwrap();
        writer.finalize(&path).unwrap();

        let dataset = read_dataset(&path).unwrap();
        assert_eq!(dataset.direction_count(), 2);
        assert_eq!(dataset.ir_length(), 3);
        assert_eq!(dataset.sample_rate(), 44_100.0);
        assert!(dataset.delays().is_none());
        assert!((dataset.directions()[0].azimuth - 0.5).abs() < 1e-6);
        assert!((dataset.directions()[1].elevation - 0.75).abs() < 1e-6);
        assert_eq!(dataset.impulse_responses()[0][0], vec![1.0, 0.0, 0.0]);
        assert_eq!(dataset.impulse_responses()[1][1], vec![0.25, 0.0, 0.25]);
    }

    #[test]
    fn test_degree_positions_converted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("degrees.hrir");

        let mut writer = HrirWriter::new(48_000.0);
        // 90 and 45 exceed 2π, so both columns read back as degrees.
        writer
            .add_measurement(90.0, 45.0, vec![1.0], vec![1.0])
            .unwrap();
        writer
            .add_measurement(-90.0, 0.0, vec![0.5], vec![0.5])
            .unwrap();
        writer.finalize(&path).unwrap();

        let dataset = read_dataset(&path).unwrap();
        let dirs = dataset.directions();
        assert!((dirs[0].azimuth - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((dirs[0].elevation - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
        assert!((dirs[1].azimuth + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_all_zero_delay_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zerodelay.hrir");

        let mut writer = HrirWriter::new(48_000.0);
        writer
            .add_measurement_with_delay(0.0, 0.0, vec![1.0, 0.0], vec![1.0, 0.0], [0.0, 0.0])
            .unwrap();
        writer.finalize(&path).unwrap();

        let dataset = read_dataset(&path).unwrap();
        assert!(dataset.delays().is_none());
    }

    #[test]
    fn test_nontrivial_delay_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delay.hrir");

        let mut writer = HrirWriter::new(48_000.0);
        writer
            .add_measurement_with_delay(0.0, 0.0, vec![1.0, 0.0], vec![1.0, 0.0], [3.5, 0.0])
            .unwrap();
        writer.finalize(&path).unwrap();

        let dataset = read_dataset(&path).unwrap();
        let delays = dataset.delays().expect("delay section should survive");
        assert_eq!(delays[0], [3.5, 0.0]);
    }
}
