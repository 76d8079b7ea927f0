//! Mirror configuration and result shapes

use serde::{Deserialize, Serialize};

use super::record::FileError;

/// Record fields a mirror tree can be organized by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizeField {
    Show,
    Scene,
    Category,
    Subcategory,
    Take,
}

/// One level of the destination folder hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizeLevel {
    pub field: OrganizeField,
    /// Levels are applied in ascending `order`
    pub order: i32,
}

/// Mirror operation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub destination_root: String,
    pub organize_levels: Vec<OrganizeLevel>,
    /// When present, only records with these paths are processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_paths: Option<Vec<String>>,
}

/// How a destination conflict was (or would be) handled.
///
/// Only `Skip` is implemented; `Overwrite` and `Rename` are declared
/// extension points so adding them later is not a wire change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictAction {
    Skip,
    Overwrite,
    Rename,
}

/// One destination collision found during a mirror pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConflict {
    pub source_path: String,
    pub destination_path: String,
    pub action: ConflictAction,
}

/// Aggregate result of a mirror operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MirrorResult {
    /// False iff `errors` is non-empty
    pub success: bool,
    pub copied_count: usize,
    pub errors: Vec<FileError>,
    pub conflicts: Vec<MirrorConflict>,
}
