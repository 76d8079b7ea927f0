//! Metadata write-back
//!
//! Projects a (possibly edited) canonical record back into the broadcast and
//! structured-metadata chunks of its container. Only the fields this
//! application is authoritative for are merged; everything else in both
//! chunks passes through untouched.
//!
//! Disk mutation happens inside an explicit staged-write transaction: the
//! original bytes are copied to a uniquely named sibling temp file first,
//! and any failure rolls the target back byte-identically before the error
//! propagates. The staged copy is always deleted, on commit and on
//! rollback alike.

use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use wavedeck_common::{Error, Result};

use crate::container::ixml;
use crate::container::{BextChunk, WavFile};
use crate::models::FileRecord;

/// An in-flight write transaction against one file.
///
/// Staging copies the target's current bytes aside; the caller must then
/// either `commit` (discard the staged copy) or `roll_back` (restore the
/// target from it). Dropping a `StagedWrite` without doing either still
/// removes the staged copy from disk, but leaves whatever was written to
/// the target in place.
#[derive(Debug)]
pub struct StagedWrite {
    target: PathBuf,
    backup: NamedTempFile,
}

impl StagedWrite {
    /// Copy the target's current bytes to a unique sibling staging file.
    pub async fn stage(target: &Path) -> Result<Self> {
        let dir = target.parent().ok_or_else(|| {
            Error::InvalidInput(format!("path has no parent directory: {}", target.display()))
        })?;

        let backup = tempfile::Builder::new()
            .prefix(".wavedeck-stage-")
            .suffix(".bak")
            .tempfile_in(dir)?;

        tokio::fs::copy(target, backup.path()).await?;
        debug!(
            target = %target.display(),
            staged = %backup.path().display(),
            "Staged write transaction"
        );

        Ok(Self {
            target: target.to_path_buf(),
            backup,
        })
    }

    /// Discard the staged copy, keeping whatever was written to the target.
    pub async fn commit(self) -> Result<()> {
        self.backup.close()?;
        Ok(())
    }

    /// Restore the target from the staged copy, then discard it.
    pub async fn roll_back(self) -> Result<()> {
        tokio::fs::copy(self.backup.path(), &self.target).await?;
        warn!(target = %self.target.display(), "Write rolled back, original bytes restored");
        self.backup.close()?;
        Ok(())
    }
}

/// Merge the authoritative fields of `record` into the container bytes and
/// reserialize. Pure transformation; no disk access.
fn apply_record(bytes: &[u8], record: &FileRecord) -> Result<Vec<u8>> {
    let mut container =
        WavFile::parse(bytes).map_err(|e| Error::Serialization(e.to_string()))?;

    // Broadcast chunk: only the originator is ours. A corrupt existing chunk
    // cannot be merged into, so it is rebuilt minimally.
    let mut bext = match container.bext_raw() {
        Some(raw) => BextChunk::parse(raw).unwrap_or_else(|e| {
            warn!(error = %e, "Corrupt broadcast chunk rebuilt during write-back");
            BextChunk::default()
        }),
        None => BextChunk::default(),
    };
    bext.originator = record.show.clone();
    container.set_bext(&bext);

    // Structured metadata: rewrite only the tags this application owns,
    // leaving unrecognized document content untouched.
    let circled = if record.circled == "true" { "TRUE" } else { "FALSE" };
    let updates = [
        (ixml::TAG_PROJECT, record.show.as_str()),
        (ixml::TAG_SCENE, record.scene.as_str()),
        (ixml::TAG_TAKE, record.take.as_str()),
        (ixml::TAG_SLATE, record.slate.as_str()),
        (ixml::TAG_NOTE, record.note.as_str()),
        (ixml::TAG_CIRCLED, circled),
    ];
    let xml = ixml::apply_tags(&record.ixml_raw, &updates)?;
    container.set_ixml(&xml);

    container.into_bytes()
}

/// Write a record's authoritative fields back into the file at `path`.
///
/// On any failure during merge, serialization, or the disk write, the file
/// is restored byte-identically from the staged copy and the failure
/// propagates. Not reentrant against one path: two concurrent write-backs
/// to the same file are undefined behavior.
pub async fn write_back(path: &Path, record: &FileRecord) -> Result<()> {
    let bytes = tokio::fs::read(path).await?;
    let staged = StagedWrite::stage(path).await?;

    let outcome = match apply_record(&bytes, record) {
        Ok(updated) => tokio::fs::write(path, updated).await.map_err(Error::Io),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => {
            staged.commit().await?;
            debug!(path = %path.display(), "Metadata written back");
            Ok(())
        }
        Err(e) => {
            staged.roll_back().await?;
            Err(e)
        }
    }
}
