//! RIFF chunk walker
//!
//! Parses a WAV buffer into an ordered list of raw chunks and reserializes
//! it with the RIFF size fields recomputed. Chunks this module does not
//! interpret round-trip byte-identically, order included.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};
use wavedeck_common::{Error, Result};

use super::{CHUNK_BEXT, CHUNK_DATA, CHUNK_FMT, CHUNK_IXML};

const RIFF_ID: [u8; 4] = *b"RIFF";
const WAVE_ID: [u8; 4] = *b"WAVE";

// RIFF id + size + WAVE
const HEADER_SIZE: usize = 12;

/// One raw chunk: four-byte identifier plus payload bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    pub id: [u8; 4],
    pub data: Vec<u8>,
}

/// Audio format fields from the `fmt ` chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmtInfo {
    /// Numeric encoding tag (1 = PCM, 3 = IEEE float, 0xFFFE = extensible)
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

/// A parsed WAV container: the ordered chunk list of one RIFF/WAVE buffer
#[derive(Debug, Clone)]
pub struct WavFile {
    chunks: Vec<RawChunk>,
}

impl WavFile {
    /// Parse a WAV byte buffer into its chunk list.
    ///
    /// A buffer that is not RIFF/WAVE, or whose chunk sizes run past the end
    /// of the buffer, is a corrupt container.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::CorruptChunk(
                "buffer too small for a RIFF header".to_string(),
            ));
        }
        if bytes[0..4] != RIFF_ID {
            return Err(Error::CorruptChunk("missing RIFF header".to_string()));
        }
        if bytes[8..12] != WAVE_ID {
            return Err(Error::CorruptChunk("missing WAVE form type".to_string()));
        }

        let mut cursor = Cursor::new(bytes);
        cursor.set_position(HEADER_SIZE as u64);

        let mut chunks = Vec::new();
        while (cursor.position() as usize) < bytes.len() {
            // A trailing pad byte after the last chunk is legal
            if bytes.len() - (cursor.position() as usize) < 8 {
                break;
            }

            let mut id = [0u8; 4];
            cursor.read_exact(&mut id)?;
            let size = cursor.read_u32::<LittleEndian>()? as usize;

            let start = cursor.position() as usize;
            if start + size > bytes.len() {
                return Err(Error::CorruptChunk(format!(
                    "chunk {} claims {} bytes past end of buffer",
                    String::from_utf8_lossy(&id),
                    size
                )));
            }

            let mut data = vec![0u8; size];
            cursor.read_exact(&mut data)?;
            chunks.push(RawChunk { id, data });

            // Chunks are word-aligned; odd sizes carry one pad byte
            if size % 2 == 1 && (cursor.position() as usize) < bytes.len() {
                cursor.set_position(cursor.position() + 1);
            }
        }

        Ok(Self { chunks })
    }

    fn chunk(&self, id: [u8; 4]) -> Option<&RawChunk> {
        self.chunks.iter().find(|c| c.id == id)
    }

    /// Replace the payload of `id`, appending a new chunk if absent.
    fn set_chunk(&mut self, id: [u8; 4], data: Vec<u8>) {
        match self.chunks.iter_mut().find(|c| c.id == id) {
            Some(chunk) => chunk.data = data,
            None => self.chunks.push(RawChunk { id, data }),
        }
    }

    /// Audio format fields, if the `fmt ` chunk is present and long enough
    pub fn fmt(&self) -> Option<FmtInfo> {
        let chunk = self.chunk(CHUNK_FMT)?;
        if chunk.data.len() < 16 {
            return None;
        }
        let mut cursor = Cursor::new(&chunk.data[..]);
        let format_tag = cursor.read_u16::<LittleEndian>().ok()?;
        let channels = cursor.read_u16::<LittleEndian>().ok()?;
        let sample_rate = cursor.read_u32::<LittleEndian>().ok()?;
        let _byte_rate = cursor.read_u32::<LittleEndian>().ok()?;
        let _block_align = cursor.read_u16::<LittleEndian>().ok()?;
        let bits_per_sample = cursor.read_u16::<LittleEndian>().ok()?;
        Some(FmtInfo {
            format_tag,
            channels,
            sample_rate,
            bits_per_sample,
        })
    }

    /// Byte length of the sample data chunk
    pub fn data_len(&self) -> Option<u64> {
        self.chunk(CHUNK_DATA).map(|c| c.data.len() as u64)
    }

    /// Raw payload of the broadcast metadata chunk
    pub fn bext_raw(&self) -> Option<&[u8]> {
        self.chunk(CHUNK_BEXT).map(|c| c.data.as_slice())
    }

    /// Replace the broadcast metadata chunk
    pub fn set_bext(&mut self, chunk: &super::BextChunk) {
        self.set_chunk(CHUNK_BEXT, chunk.to_bytes());
    }

    /// The raw structured-metadata string, with trailing NULs stripped
    pub fn ixml_str(&self) -> Option<String> {
        self.chunk(CHUNK_IXML).map(|c| {
            String::from_utf8_lossy(&c.data)
                .trim_end_matches('\0')
                .to_string()
        })
    }

    /// Replace the structured-metadata chunk
    pub fn set_ixml(&mut self, xml: &str) {
        self.set_chunk(CHUNK_IXML, xml.as_bytes().to_vec());
    }

    /// Reserialize the container, recomputing RIFF sizes and padding
    /// odd-sized chunks.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let body_len: usize = self
            .chunks
            .iter()
            .map(|c| 8 + c.data.len() + c.data.len() % 2)
            .sum();

        let mut out = Vec::with_capacity(HEADER_SIZE + body_len);
        out.write_all(&RIFF_ID)?;
        out.write_u32::<LittleEndian>((4 + body_len) as u32)?;
        out.write_all(&WAVE_ID)?;

        for chunk in &self.chunks {
            out.write_all(&chunk.id)?;
            out.write_u32::<LittleEndian>(chunk.data.len() as u32)?;
            out.write_all(&chunk.data)?;
            if chunk.data.len() % 2 == 1 {
                out.write_u8(0)?;
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_wav() -> Vec<u8> {
        let mut fmt = Vec::new();
        fmt.write_u16::<LittleEndian>(1).unwrap(); // PCM
        fmt.write_u16::<LittleEndian>(2).unwrap(); // stereo
        fmt.write_u32::<LittleEndian>(48_000).unwrap();
        fmt.write_u32::<LittleEndian>(48_000 * 2 * 2).unwrap();
        fmt.write_u16::<LittleEndian>(4).unwrap();
        fmt.write_u16::<LittleEndian>(16).unwrap();

        let file = WavFile {
            chunks: vec![
                RawChunk {
                    id: CHUNK_FMT,
                    data: fmt,
                },
                RawChunk {
                    id: CHUNK_DATA,
                    data: vec![0u8; 96_000],
                },
            ],
        };
        file.into_bytes().unwrap()
    }

    #[test]
    fn parses_fmt_and_data() {
        let file = WavFile::parse(&minimal_wav()).unwrap();
        let fmt = file.fmt().unwrap();
        assert_eq!(fmt.format_tag, 1);
        assert_eq!(fmt.channels, 2);
        assert_eq!(fmt.sample_rate, 48_000);
        assert_eq!(fmt.bits_per_sample, 16);
        assert_eq!(file.data_len(), Some(96_000));
    }

    #[test]
    fn round_trips_unknown_chunks_byte_identically() {
        let mut file = WavFile::parse(&minimal_wav()).unwrap();
        file.chunks.insert(
            1,
            RawChunk {
                id: *b"cue ",
                data: vec![1, 2, 3, 4, 5], // odd length, needs padding
            },
        );
        let bytes = file.clone().into_bytes().unwrap();

        let reparsed = WavFile::parse(&bytes).unwrap();
        assert_eq!(reparsed.chunks, file.chunks);

        // Serializing again yields the same bytes
        assert_eq!(reparsed.into_bytes().unwrap(), bytes);
    }

    #[test]
    fn ixml_set_and_get() {
        let mut file = WavFile::parse(&minimal_wav()).unwrap();
        assert_eq!(file.ixml_str(), None);

        file.set_ixml("<BWFXML><SCENE>12</SCENE></BWFXML>");
        let bytes = file.into_bytes().unwrap();
        let reparsed = WavFile::parse(&bytes).unwrap();
        assert_eq!(
            reparsed.ixml_str().as_deref(),
            Some("<BWFXML><SCENE>12</SCENE></BWFXML>")
        );
    }

    #[test]
    fn rejects_non_riff_buffers() {
        assert!(WavFile::parse(b"not a wav file at all").is_err());
        assert!(WavFile::parse(&[]).is_err());

        // RIFF but not WAVE
        let mut bytes = minimal_wav();
        bytes[8..12].copy_from_slice(b"AVI ");
        assert!(WavFile::parse(&bytes).is_err());
    }

    #[test]
    fn rejects_truncated_chunk() {
        let mut bytes = minimal_wav();
        bytes.truncate(bytes.len() - 10_000);
        assert!(WavFile::parse(&bytes).is_err());
    }
}
