//! Wire-level data models for the metadata resolver service

pub mod mirror;
pub mod record;

pub use mirror::{
    ConflictAction, MirrorConfig, MirrorConflict, MirrorResult, OrganizeField, OrganizeLevel,
};
pub use record::{BatchReadResult, BroadcastInfo, FileError, FileInfo, FileRecord};
