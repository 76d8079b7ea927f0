//! WAV container accessor
//!
//! Chunk-level access to a WAV byte buffer: `fmt ` and `data` for file info,
//! `bext` for broadcast metadata, and `iXML` for the raw structured-metadata
//! string. Everything above this module treats the container as a black box;
//! no other code reads or writes RIFF bytes.

pub mod bext;
pub mod ixml;
mod riff;

pub use bext::BextChunk;
pub use riff::{FmtInfo, WavFile};

/// Chunk identifier for the format chunk
pub const CHUNK_FMT: [u8; 4] = *b"fmt ";
/// Chunk identifier for the sample data chunk
pub const CHUNK_DATA: [u8; 4] = *b"data";
/// Chunk identifier for the broadcast metadata chunk
pub const CHUNK_BEXT: [u8; 4] = *b"bext";
/// Chunk identifier for the structured metadata chunk
pub const CHUNK_IXML: [u8; 4] = *b"iXML";

/// Hand-assembled minimal PCM WAV buffer for in-crate unit tests
#[cfg(test)]
pub(crate) fn test_wav_bytes() -> Vec<u8> {
    let mut fmt = Vec::new();
    fmt.extend_from_slice(&1u16.to_le_bytes()); // PCM
    fmt.extend_from_slice(&1u16.to_le_bytes()); // mono
    fmt.extend_from_slice(&48_000u32.to_le_bytes());
    fmt.extend_from_slice(&(48_000u32 * 2).to_le_bytes());
    fmt.extend_from_slice(&2u16.to_le_bytes());
    fmt.extend_from_slice(&16u16.to_le_bytes());

    let data = vec![0u8; 64];

    let body_len = (8 + fmt.len()) + (8 + data.len());
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((4 + body_len) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&(fmt.len() as u32).to_le_bytes());
    out.extend_from_slice(&fmt);
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&data);
    out
}
