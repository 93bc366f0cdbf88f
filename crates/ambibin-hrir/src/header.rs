//! Dataset file header — the first 32 bytes of every `.hrir` file.

use serde::{Deserialize, Serialize};

/// Magic bytes identifying an HRIR dataset file: `AHRD` (0x41485244)
pub const HRIR_MAGIC: [u8; 4] = [0x41, 0x48, 0x52, 0x44];

/// Current dataset format version
pub const HRIR_VERSION: u16 = 1;

/// Size of the fixed header in bytes
pub const HEADER_SIZE: usize = 32;

/// The fixed-size header at the beginning of every `.hrir` file.
///
/// Layout (32 bytes, little-endian):
/// - `[0..4]`   magic: `AHRD`
/// - `[4..6]`   version: u16
/// - `[6..8]`   flags: u16
/// - `[8..12]`  direction_count: u32
/// - `[12..16]` ir_length: u32 (samples per ear per direction)
/// - `[16..24]` sample_rate: f64
/// - `[24..32]` reserved: [u8; 8] (zero-filled, future use)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrirHeader {
    /// Dataset format version (currently 1)
    pub version: u16,
    /// Flags bitfield
    pub flags: DatasetFlags,
    /// Number of measurement directions
    pub direction_count: u32,
    /// Impulse response length in samples, shared by every measurement
    pub ir_length: u32,
    /// Sample rate in Hz shared by all impulse responses
    pub sample_rate: f64,
}

/// Dataset flags stored as a u16 bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFlags(pub u16);

impl DatasetFlags {
    /// File carries a per-direction, per-ear delay section.
    pub const DELAY: u16 = 1 << 0;

    pub fn new() -> Self {
        Self(0)
    }

    pub fn set(&mut self, flag: u16) {
        self.0 |= flag;
    }

    pub fn has(&self, flag: u16) -> bool {
        self.0 & flag != 0
    }
}

impl Default for DatasetFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl HrirHeader {
    /// Create a new header for a dataset with the given shape.
    pub fn new(direction_count: u32, ir_length: u32, sample_rate: f64) -> Self {
        Self {
            version: HRIR_VERSION,
            flags: DatasetFlags::new(),
            direction_count,
            ir_length,
            sample_rate,
        }
    }
}
