//! Destination path builder (mirror engine)
//!
//! Projects resolved metadata onto a new directory tree: one sanitized path
//! segment per organize level, `"Misc"` where the field is blank, the
//! unmodified filename last. Conflicts are detected before any bytes move;
//! per-file failures never stop the rest of the batch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use wavedeck_common::Result;

use crate::models::{
    ConflictAction, FileError, FileRecord, MirrorConfig, MirrorConflict, MirrorResult,
    OrganizeField, OrganizeLevel,
};
use crate::services::writeback;

const MAX_SEGMENT_LEN: usize = 100;
const EMPTY_SEGMENT: &str = "Misc";

/// Sanitize one metadata value into a filesystem-safe path segment.
///
/// Reserved characters become `_`, whitespace runs collapse to a single
/// `_`, and the result is capped at 100 characters. Blank input maps to
/// `"Misc"`.
pub fn sanitize_segment(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return EMPTY_SEGMENT.to_string();
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut in_whitespace = false;
    for c in trimmed.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;
        match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => out.push('_'),
            other => out.push(other),
        }
    }

    out.chars().take(MAX_SEGMENT_LEN).collect()
}

fn field_value<'a>(record: &'a FileRecord, field: OrganizeField) -> &'a str {
    match field {
        OrganizeField::Show => &record.show,
        OrganizeField::Scene => &record.scene,
        OrganizeField::Category => &record.category,
        OrganizeField::Subcategory => &record.subcategory,
        OrganizeField::Take => &record.take,
    }
}

/// Organize levels in ascending `order`
fn sorted_levels(config: &MirrorConfig) -> Vec<OrganizeLevel> {
    let mut levels = config.organize_levels.clone();
    levels.sort_by_key(|level| level.order);
    levels
}

/// Compute one record's destination path under the given (already sorted)
/// organize levels.
pub fn destination_for(record: &FileRecord, root: &Path, levels: &[OrganizeLevel]) -> PathBuf {
    let mut dest = root.to_path_buf();
    for level in levels {
        dest.push(sanitize_segment(field_value(record, level.field)));
    }
    dest.push(&record.filename);
    dest
}

/// The subset of records selected by the config, in input order
fn selected<'a>(config: &MirrorConfig, records: &'a [FileRecord]) -> Vec<&'a FileRecord> {
    match &config.selected_paths {
        Some(paths) => {
            let wanted: HashSet<&str> = paths.iter().map(String::as_str).collect();
            records
                .iter()
                .filter(|r| wanted.contains(r.path.as_str()))
                .collect()
        }
        None => records.iter().collect(),
    }
}

/// Copy the selected records into the destination tree.
///
/// Each destination file receives the source record's current in-memory
/// field values via write-back, so mirrored copies reflect unsaved edits
/// even when the source file on disk was never rewritten.
pub async fn mirror(config: &MirrorConfig, records: &[FileRecord]) -> Result<MirrorResult> {
    let root = Path::new(&config.destination_root);
    tokio::fs::create_dir_all(root).await?;

    let levels = sorted_levels(config);
    let mut result = MirrorResult::default();

    for record in selected(config, records) {
        let dest = destination_for(record, root, &levels);

        match mirror_one(record, &dest).await {
            Ok(MirrorOutcome::Copied) => {
                debug!(source = %record.path, dest = %dest.display(), "Mirrored file");
                result.copied_count += 1;
            }
            Ok(MirrorOutcome::Conflict) => {
                warn!(source = %record.path, dest = %dest.display(), "Destination exists, skipping");
                result.conflicts.push(MirrorConflict {
                    source_path: record.path.clone(),
                    destination_path: dest.display().to_string(),
                    action: ConflictAction::Skip,
                });
            }
            Err(e) => {
                warn!(source = %record.path, error = %e, "Mirror failed for file");
                result.errors.push(FileError {
                    path: record.path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    result.success = result.errors.is_empty();
    info!(
        copied = result.copied_count,
        conflicts = result.conflicts.len(),
        errors = result.errors.len(),
        "Mirror pass complete"
    );
    Ok(result)
}

enum MirrorOutcome {
    Copied,
    Conflict,
}

async fn mirror_one(record: &FileRecord, dest: &Path) -> Result<MirrorOutcome> {
    if tokio::fs::try_exists(dest).await? {
        return Ok(MirrorOutcome::Conflict);
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::fs::copy(&record.path, dest).await?;

    // The copy carries the source's on-disk chunks; stamping the in-memory
    // record over them is what makes unsaved edits travel with the mirror.
    writeback::write_back(dest, record).await?;

    Ok(MirrorOutcome::Copied)
}

/// Dry-run of the mirror conflict check: the same path computation and
/// existence test, reported as human-readable descriptions, copying
/// nothing.
pub async fn check_conflicts(config: &MirrorConfig, records: &[FileRecord]) -> Result<Vec<String>> {
    let root = Path::new(&config.destination_root);
    let levels = sorted_levels(config);

    let mut conflicts = Vec::new();
    for record in selected(config, records) {
        let dest = destination_for(record, root, &levels);
        if tokio::fs::try_exists(&dest).await? {
            conflicts.push(format!(
                "{}: destination already exists at {}",
                record.filename,
                dest.display()
            ));
        }
    }
    Ok(conflicts)
}
