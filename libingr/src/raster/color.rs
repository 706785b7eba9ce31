use itertools::Itertools;
use tracing::trace;

use crate::serde::{self, encode_vlt_entries, finish, parse_vlt_entries, SIZEOF_CTAB, SIZEOF_VLT};
use crate::Error;

/// Full scale of the 12-bit Environ-V channels
const VLT_CHANNEL_MAX: f64 = 4095.0;

/// One normalized RGBA color table entry
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct ColorEntry {
    /// Red, 0-255
    pub r: u8,
    /// Green, 0-255
    pub g: u8,
    /// Blue, 0-255
    pub b: u8,
    /// Alpha, 0-255; the on-disk encodings have no alpha channel, so this
    /// is always opaque after a read
    pub a: u8,
}

impl ColorEntry {
    /// The placeholder entry used for gap-filling
    pub const OPAQUE_BLACK: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };
}

/// One record of the variable-length "Environ-V" color table encoding
///
/// Slots are explicit and not guaranteed sorted on disk; channels use a
/// 12-bit range
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct VltEntry {
    /// Target slot index
    pub slot: u16,
    /// Red, 0-4095
    pub r: u16,
    /// Green, 0-4095
    pub g: u16,
    /// Blue, 0-4095
    pub b: u16,
}

/// An ordered indexed color table, one entry per pixel value
#[derive(Default, Debug, Eq, PartialEq, Clone)]
pub struct ColorTable {
    entries: Vec<ColorEntry>,
}

impl ColorTable {
    /// Creates a color table from a list of entries
    #[must_use]
    pub fn new(entries: Vec<ColorEntry>) -> Self {
        Self { entries }
    }

    /// Returns the table entries in slot order
    #[must_use]
    pub fn entries(&self) -> &[ColorEntry] {
        &self.entries
    }

    /// Returns the number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads a fixed 256-entry IGDS color table block
    ///
    /// Every slot becomes one entry; the implicit index is the array
    /// position and alpha is always opaque.
    ///
    /// # Errors
    ///
    /// Errors if `bytes` holds fewer than 768 bytes
    pub fn from_igds(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < SIZEOF_CTAB {
            return Err(serde::error::Error::Truncated.into());
        }
        let entries = bytes[..SIZEOF_CTAB]
            .chunks_exact(3)
            .map(|rgb| ColorEntry {
                r: rgb[0],
                g: rgb[1],
                b: rgb[2],
                a: 255,
            })
            .collect();
        Ok(Self { entries })
    }

    /// Writes the table as a fixed 256-entry IGDS block, zero-filling the
    /// slots past the last entry. Alpha is not representable and dropped.
    ///
    /// # Errors
    ///
    /// Errors if the table holds more than 256 entries
    pub fn to_igds(&self) -> Result<Vec<u8>, Error> {
        if self.entries.len() > 256 {
            return Err(serde::error::Error::OversizedColorTable(self.entries.len()).into());
        }
        let mut bytes = vec![0u8; SIZEOF_CTAB];
        for (slot, entry) in self.entries.iter().enumerate() {
            bytes[slot * 3] = entry.r;
            bytes[slot * 3 + 1] = entry.g;
            bytes[slot * 3 + 2] = entry.b;
        }
        Ok(bytes)
    }

    /// Builds a table from Environ-V records
    ///
    /// Records are stable-sorted by slot (they are usually already sorted,
    /// but that is not guaranteed), channels are rescaled from the shared
    /// 12-bit maximum to 0-255, and any slot between 0 and the highest
    /// referenced slot with no record becomes an opaque black placeholder.
    #[must_use]
    pub fn from_environ_v(records: &[VltEntry]) -> Self {
        let Some(max_slot) = records.iter().map(|e| e.slot).max() else {
            return Self::default();
        };

        let max_channel = records
            .iter()
            .map(|e| e.r.max(e.g).max(e.b))
            .max()
            .unwrap_or(0);
        // An all-zero table normalizes to all-zero output, not a division
        let factor = if max_channel == 0 {
            0.0
        } else {
            255.0 / f64::from(max_channel)
        };
        trace!("normalizing {} records with factor {factor}", records.len());

        let sorted: Vec<&VltEntry> = records.iter().sorted_by_key(|e| e.slot).collect();
        let mut next = 0usize;
        let mut entries = Vec::with_capacity(usize::from(max_slot) + 1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        for slot in 0..=max_slot {
            match sorted.get(next) {
                Some(record) if record.slot == slot => {
                    entries.push(ColorEntry {
                        r: (f64::from(record.r) * factor) as u8,
                        g: (f64::from(record.g) * factor) as u8,
                        b: (f64::from(record.b) * factor) as u8,
                        a: 255,
                    });
                    next += 1;
                }
                _ => entries.push(ColorEntry::OPAQUE_BLACK),
            }
        }
        Self { entries }
    }

    /// Writes the table as Environ-V records, one per entry in order, with
    /// channels rescaled to the 12-bit range
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_environ_v(&self) -> Vec<VltEntry> {
        self.entries
            .iter()
            .enumerate()
            .map(|(slot, entry)| VltEntry {
                slot: slot as u16,
                r: (f64::from(entry.r) * (VLT_CHANNEL_MAX / 255.0)) as u16,
                g: (f64::from(entry.g) * (VLT_CHANNEL_MAX / 255.0)) as u16,
                b: (f64::from(entry.b) * (VLT_CHANNEL_MAX / 255.0)) as u16,
            })
            .collect()
    }

    /// Decodes `count` raw Environ-V records and builds the table
    ///
    /// # Errors
    ///
    /// Errors if `bytes` is shorter than `count` records
    pub fn from_environ_v_bytes(bytes: &[u8], count: usize) -> Result<Self, Error> {
        let records = finish(parse_vlt_entries(bytes, count))?;
        Ok(Self::from_environ_v(&records))
    }

    /// Encodes the table into raw Environ-V record bytes
    #[must_use]
    pub fn to_environ_v_bytes(&self) -> Vec<u8> {
        encode_vlt_entries(&self.to_environ_v())
    }

    /// Number of 512-byte blocks an Environ-V encoding of this table
    /// occupies on disk
    #[must_use]
    pub fn environ_v_blocks(&self) -> usize {
        (self.entries.len() * SIZEOF_VLT).div_ceil(512)
    }
}
