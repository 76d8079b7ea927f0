//! Broadcast metadata (`bext`) chunk
//!
//! Fixed-layout chunk carrying description, originator, and
//! timecode-reference fields. The version/UMID/loudness bytes are not
//! interpreted; they are preserved opaquely so a parse/serialize cycle
//! leaves them unmodified.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use wavedeck_common::{Error, Result};

const DESCRIPTION_LEN: usize = 256;
const ORIGINATOR_LEN: usize = 32;
const ORIGINATOR_REFERENCE_LEN: usize = 32;
const ORIGINATION_DATE_LEN: usize = 10;
const ORIGINATION_TIME_LEN: usize = 8;
const UMID_LEN: usize = 64;
const LOUDNESS_LEN: usize = 10;
const RESERVED_LEN: usize = 180;

// Everything before the variable-length coding history
const FIXED_LEN: usize = DESCRIPTION_LEN
    + ORIGINATOR_LEN
    + ORIGINATOR_REFERENCE_LEN
    + ORIGINATION_DATE_LEN
    + ORIGINATION_TIME_LEN
    + 4 // time reference low
    + 4 // time reference high
    + 2 // version
    + UMID_LEN
    + LOUDNESS_LEN
    + RESERVED_LEN;

/// Parsed broadcast metadata chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BextChunk {
    pub description: String,
    pub originator: String,
    pub originator_reference: String,
    pub origination_date: String,
    pub origination_time: String,
    /// Low 32 bits of the sample-accurate time reference
    pub time_reference_low: u32,
    /// High 32 bits of the sample-accurate time reference
    pub time_reference_high: u32,
    pub coding_history: String,
    // Not interpreted, preserved opaquely across parse/serialize
    pub(crate) version: u16,
    pub(crate) umid: Vec<u8>,
    pub(crate) loudness: Vec<u8>,
    pub(crate) reserved: Vec<u8>,
}

impl Default for BextChunk {
    fn default() -> Self {
        Self {
            description: String::new(),
            originator: String::new(),
            originator_reference: String::new(),
            origination_date: String::new(),
            origination_time: String::new(),
            time_reference_low: 0,
            time_reference_high: 0,
            coding_history: String::new(),
            version: 1,
            umid: vec![0; UMID_LEN],
            loudness: vec![0; LOUDNESS_LEN],
            reserved: vec![0; RESERVED_LEN],
        }
    }
}

impl BextChunk {
    /// Parse the chunk payload. A payload shorter than the fixed layout is
    /// corrupt.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < FIXED_LEN {
            return Err(Error::CorruptChunk(format!(
                "bext chunk is {} bytes, expected at least {}",
                data.len(),
                FIXED_LEN
            )));
        }

        let mut cursor = Cursor::new(data);
        let description = read_fixed_str(&mut cursor, DESCRIPTION_LEN)?;
        let originator = read_fixed_str(&mut cursor, ORIGINATOR_LEN)?;
        let originator_reference = read_fixed_str(&mut cursor, ORIGINATOR_REFERENCE_LEN)?;
        let origination_date = read_fixed_str(&mut cursor, ORIGINATION_DATE_LEN)?;
        let origination_time = read_fixed_str(&mut cursor, ORIGINATION_TIME_LEN)?;
        let time_reference_low = cursor.read_u32::<LittleEndian>()?;
        let time_reference_high = cursor.read_u32::<LittleEndian>()?;
        let version = cursor.read_u16::<LittleEndian>()?;

        let mut umid = vec![0u8; UMID_LEN];
        cursor.read_exact(&mut umid)?;
        let mut loudness = vec![0u8; LOUDNESS_LEN];
        cursor.read_exact(&mut loudness)?;
        let mut reserved = vec![0u8; RESERVED_LEN];
        cursor.read_exact(&mut reserved)?;

        let coding_history = String::from_utf8_lossy(&data[FIXED_LEN..])
            .trim_end_matches('\0')
            .to_string();

        Ok(Self {
            description,
            originator,
            originator_reference,
            origination_date,
            origination_time,
            time_reference_low,
            time_reference_high,
            coding_history,
            version,
            umid,
            loudness,
            reserved,
        })
    }

    /// Serialize back to the chunk payload layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FIXED_LEN + self.coding_history.len());
        write_fixed_str(&mut out, &self.description, DESCRIPTION_LEN);
        write_fixed_str(&mut out, &self.originator, ORIGINATOR_LEN);
        write_fixed_str(&mut out, &self.originator_reference, ORIGINATOR_REFERENCE_LEN);
        write_fixed_str(&mut out, &self.origination_date, ORIGINATION_DATE_LEN);
        write_fixed_str(&mut out, &self.origination_time, ORIGINATION_TIME_LEN);
        out.extend_from_slice(&self.time_reference_low.to_le_bytes());
        out.extend_from_slice(&self.time_reference_high.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.umid);
        out.extend_from_slice(&self.loudness);
        out.extend_from_slice(&self.reserved);
        out.extend_from_slice(self.coding_history.as_bytes());
        out
    }
}

/// Read a fixed-size NUL-padded ASCII field, trimming padding
fn read_fixed_str(cursor: &mut Cursor<&[u8]>, len: usize) -> Result<String> {
    let mut buf = vec![0u8; len];
    cursor.read_exact(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf)
        .trim_end_matches('\0')
        .trim_end()
        .to_string())
}

/// Write a string into a fixed-size field, truncating and NUL-padding
fn write_fixed_str(out: &mut Vec<u8>, value: &str, len: usize) {
    let bytes = value.as_bytes();
    let take = bytes.len().min(len);
    out.extend_from_slice(&bytes[..take]);
    out.resize(out.len() + (len - take), 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips() {
        let chunk = BextChunk::default();
        let parsed = BextChunk::parse(&chunk.to_bytes()).unwrap();
        assert_eq!(parsed, chunk);
    }

    #[test]
    fn fields_round_trip() {
        let chunk = BextChunk {
            description: "SC07_TK03 voiceover".to_string(),
            originator: "PR2".to_string(),
            originator_reference: "USWVD0001".to_string(),
            origination_date: "2024-03-18".to_string(),
            origination_time: "10:42:03".to_string(),
            time_reference_low: 0xDEAD_BEEF,
            time_reference_high: 7,
            coding_history: "A=PCM,F=48000,W=16,M=stereo\r\n".to_string(),
            ..Default::default()
        };
        let parsed = BextChunk::parse(&chunk.to_bytes()).unwrap();
        assert_eq!(parsed, chunk);
    }

    #[test]
    fn overlong_field_is_truncated_not_corrupting() {
        let chunk = BextChunk {
            originator: "x".repeat(100),
            ..Default::default()
        };
        let parsed = BextChunk::parse(&chunk.to_bytes()).unwrap();
        assert_eq!(parsed.originator.len(), 32);
        // Neighbouring field is unaffected by the overflow
        assert_eq!(parsed.originator_reference, "");
    }

    #[test]
    fn short_payload_is_corrupt() {
        assert!(BextChunk::parse(&[0u8; 100]).is_err());
    }
}
