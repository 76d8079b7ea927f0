//! Shared fixtures for integration tests
//!
//! Builds small real WAV files: hound writes the PCM frames, the container
//! accessor embeds metadata chunks on top.

use std::path::Path;
use wavedeck_mr::container::{BextChunk, WavFile};

/// Write a small mono 16-bit 48 kHz WAV, optionally embedding structured
/// and broadcast metadata chunks.
pub fn write_wav(path: &Path, ixml: Option<&str>, bext: Option<BextChunk>) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 48_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..480i32 {
        writer.write_sample((i % 64) as i16).unwrap();
    }
    writer.finalize().unwrap();

    if ixml.is_some() || bext.is_some() {
        let bytes = std::fs::read(path).unwrap();
        let mut container = WavFile::parse(&bytes).unwrap();
        if let Some(xml) = ixml {
            container.set_ixml(xml);
        }
        if let Some(chunk) = bext {
            container.set_bext(&chunk);
        }
        std::fs::write(path, container.into_bytes().unwrap()).unwrap();
    }
}

/// Broadcast chunk with just the fields a test cares about
pub fn bext_with(description: &str, originator: &str) -> BextChunk {
    let mut chunk = BextChunk::default();
    chunk.description = description.to_string();
    chunk.originator = originator.to_string();
    chunk
}

/// Structured-metadata document carrying the given tags plus a vendor
/// sub-tree that must survive write-back untouched.
pub fn ixml_doc(tags: &[(&str, &str)]) -> String {
    let mut doc = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <BWFXML>\
         <IXML_VERSION>1.61</IXML_VERSION>\
         <VENDOR_TREE><MIXER_MODEL>SD 833</MIXER_MODEL></VENDOR_TREE>",
    );
    for (tag, value) in tags {
        doc.push_str(&format!("<{tag}>{value}</{tag}>"));
    }
    doc.push_str("</BWFXML>");
    doc
}
