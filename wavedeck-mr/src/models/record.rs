//! Canonical metadata record
//!
//! The unified, precedence-resolved, application-level view of one file's
//! metadata. Structural fields are opaque strings; scene and take are never
//! parsed as numbers, which preserves leading zeros and decimal scene
//! numbers like "5.14".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The canonical metadata record for one WAV file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute file path; unique key within a working set
    pub path: String,
    /// Display filename, derived from the path
    pub filename: String,

    // Structural fields; empty string means unresolved
    pub show: String,
    pub scene: String,
    pub take: String,
    pub slate: String,
    pub category: String,
    pub subcategory: String,
    pub note: String,

    /// Wildtrack flag, `"true"` or `"false"`
    pub wildtrack: String,
    /// Circled-take flag, `"true"` or `"false"`
    pub circled: String,

    /// Broadcast metadata passthrough fields
    #[serde(default)]
    pub broadcast: BroadcastInfo,
    /// Raw structured-metadata document; the unrecognized-content bag that
    /// must survive write-back unmodified
    #[serde(default)]
    pub ixml_raw: String,

    /// Read-only file info derived at read time
    #[serde(default)]
    pub info: FileInfo,
}

/// Broadcast metadata chunk fields carried through on the record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BroadcastInfo {
    pub description: String,
    pub originator: String,
    pub originator_reference: String,
    pub origination_date: String,
    pub origination_time: String,
    pub time_reference_low: u32,
    pub time_reference_high: u32,
    pub coding_history: String,
}

/// Read-only file info derived at read time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub channels: u16,
    pub duration_secs: f64,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
    /// Numeric encoding tag from the format chunk (1 = PCM, 3 = IEEE float)
    pub format_tag: u16,
}

/// One file's failure within a batch operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub path: String,
    pub error: String,
}

/// Aggregate result of a bulk read
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReadResult {
    /// False iff `errors` is non-empty
    pub success: bool,
    pub records: Vec<FileRecord>,
    pub errors: Vec<FileError>,
}
