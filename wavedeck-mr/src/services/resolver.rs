//! Metadata resolution
//!
//! Merges the container chunks and the filename match into one canonical
//! record. Each structural field has a fixed precedence chain, evaluated by
//! a single generic first-non-empty walk over a declarative table, so the
//! rules are data rather than per-field branching. Resolution is re-derived
//! identically on every read; no source tag is persisted.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, warn};
use wavedeck_common::{Error, Result};

use crate::container::ixml::{self, IxmlFields};
use crate::container::{BextChunk, WavFile};
use crate::models::{BatchReadResult, BroadcastInfo, FileError, FileInfo, FileRecord};
use crate::services::filename_matcher::{self, FilenameFields};

/// One step in a precedence chain
#[derive(Debug, Clone, Copy)]
enum SourceRef {
    Ixml(IxmlKey),
    Filename(NameKey),
    BextOriginator,
    BextDescription,
}

#[derive(Debug, Clone, Copy)]
enum IxmlKey {
    Project,
    Scene,
    Take,
    Slate,
    Category,
    Subcategory,
    Note,
}

#[derive(Debug, Clone, Copy)]
enum NameKey {
    Show,
    Category,
    Scene,
    Slate,
    Take,
    Subcategory,
}

// Per-field precedence chains. First non-empty source wins; a later source
// never overwrites an earlier hit.
const SHOW_CHAIN: &[SourceRef] = &[
    SourceRef::Ixml(IxmlKey::Project),
    SourceRef::Filename(NameKey::Show),
    SourceRef::BextOriginator,
];
const SCENE_CHAIN: &[SourceRef] = &[
    SourceRef::Ixml(IxmlKey::Scene),
    SourceRef::Filename(NameKey::Scene),
];
const TAKE_CHAIN: &[SourceRef] = &[
    SourceRef::Ixml(IxmlKey::Take),
    SourceRef::Filename(NameKey::Take),
];
const SLATE_CHAIN: &[SourceRef] = &[
    SourceRef::Ixml(IxmlKey::Slate),
    SourceRef::Filename(NameKey::Slate),
];
const CATEGORY_CHAIN: &[SourceRef] = &[
    SourceRef::Ixml(IxmlKey::Category),
    SourceRef::Filename(NameKey::Category),
];
const SUBCATEGORY_CHAIN: &[SourceRef] = &[
    SourceRef::Ixml(IxmlKey::Subcategory),
    SourceRef::Filename(NameKey::Subcategory),
];
const NOTE_CHAIN: &[SourceRef] = &[
    SourceRef::Ixml(IxmlKey::Note),
    SourceRef::BextDescription,
];

// Scene/take recovery from free-text descriptions: "SC07_TK03", "s 7 t 3",
// "SCNE5.14B TAKE12" and similar.
static SCENE_TAKE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)S(?:C|CNE)?[_ ]*(\d+(?:\.\d+)?[A-Z]?)[_ ]*T(?:K|AKE)?[_ ]*(\d+)")
        .expect("scene/take recovery pattern is valid")
});

/// The three competing sources for one file's structural fields
struct Sources<'a> {
    ixml: &'a IxmlFields,
    filename: Option<&'a FilenameFields>,
    bext: Option<&'a BextChunk>,
}

impl Sources<'_> {
    fn value(&self, source: SourceRef) -> &str {
        match source {
            SourceRef::Ixml(key) => match key {
                IxmlKey::Project => &self.ixml.project,
                IxmlKey::Scene => &self.ixml.scene,
                IxmlKey::Take => &self.ixml.take,
                IxmlKey::Slate => &self.ixml.slate,
                IxmlKey::Category => &self.ixml.category,
                IxmlKey::Subcategory => &self.ixml.subcategory,
                IxmlKey::Note => &self.ixml.note,
            },
            SourceRef::Filename(key) => match (self.filename, key) {
                (Some(f), NameKey::Show) => &f.show,
                (Some(f), NameKey::Category) => &f.category,
                (Some(f), NameKey::Scene) => &f.scene,
                (Some(f), NameKey::Slate) => &f.slate,
                (Some(f), NameKey::Take) => &f.take,
                (Some(f), NameKey::Subcategory) => &f.subcategory,
                (None, _) => "",
            },
            SourceRef::BextOriginator => self.bext.map_or("", |b| b.originator.as_str()),
            SourceRef::BextDescription => self.bext.map_or("", |b| b.description.as_str()),
        }
    }

    fn first_non_empty(&self, chain: &[SourceRef]) -> String {
        for source in chain {
            let value = self.value(*source);
            if !value.trim().is_empty() {
                return value.to_string();
            }
        }
        String::new()
    }
}

/// Structural fields after precedence resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFields {
    pub show: String,
    pub scene: String,
    pub take: String,
    pub slate: String,
    pub category: String,
    pub subcategory: String,
    pub note: String,
    pub wildtrack: String,
    pub circled: String,
}

/// Coerce a free-form flag value to the `"true"`/`"false"` wire form
fn coerce_flag(value: &str) -> String {
    let normalized = value.trim();
    let truthy = normalized.eq_ignore_ascii_case("true")
        || normalized == "1"
        || normalized.eq_ignore_ascii_case("yes");
    if truthy { "true" } else { "false" }.to_string()
}

/// Resolve structural fields from the three sources.
///
/// Pure function over already-parsed inputs so the precedence table is
/// testable without touching a filesystem.
pub fn resolve_fields(
    ixml: &IxmlFields,
    filename: Option<&FilenameFields>,
    bext: Option<&BextChunk>,
) -> ResolvedFields {
    let sources = Sources {
        ixml,
        filename,
        bext,
    };

    let mut fields = ResolvedFields {
        show: sources.first_non_empty(SHOW_CHAIN),
        scene: sources.first_non_empty(SCENE_CHAIN),
        take: sources.first_non_empty(TAKE_CHAIN),
        slate: sources.first_non_empty(SLATE_CHAIN),
        category: sources.first_non_empty(CATEGORY_CHAIN),
        subcategory: sources.first_non_empty(SUBCATEGORY_CHAIN),
        note: sources.first_non_empty(NOTE_CHAIN),
        wildtrack: coerce_flag(&ixml.wild_track),
        circled: coerce_flag(&ixml.circled),
    };

    // Recovery pass: scene/take still missing after the table may be hiding
    // in the broadcast description free text.
    if fields.scene.is_empty() || fields.take.is_empty() {
        let description = sources.value(SourceRef::BextDescription);
        if !description.trim().is_empty() {
            if let Some(caps) = SCENE_TAKE_PATTERN.captures(description) {
                if fields.scene.is_empty() {
                    if let Some(scene) = caps.get(1) {
                        debug!(scene = scene.as_str(), "Recovered scene from description");
                        fields.scene = scene.as_str().to_string();
                    }
                }
                if fields.take.is_empty() {
                    if let Some(take) = caps.get(2) {
                        debug!(take = take.as_str(), "Recovered take from description");
                        fields.take = take.as_str().to_string();
                    }
                }
            }
        }
    }

    fields
}

/// Check that the path carries the recognized audio container extension
fn check_extension(path: &Path) -> Result<()> {
    let ok = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(Error::UnsupportedFormat(path.display().to_string()))
    }
}

/// Read one file and resolve its canonical metadata record.
///
/// Fails with `UnsupportedFormat` for a non-WAV extension, `NotFound` for a
/// missing path, or `Io` when the bytes cannot be read. Chunk-level
/// corruption never fails the read: each chunk is parsed independently and
/// a bad one contributes nothing.
pub async fn resolve_path(path: &Path) -> Result<FileRecord> {
    check_extension(path)?;

    let meta = tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(path.display().to_string())
        } else {
            Error::Io(e)
        }
    })?;

    let bytes = tokio::fs::read(path).await?;

    let container = match WavFile::parse(&bytes) {
        Ok(container) => Some(container),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unparsable container, metadata treated as absent");
            None
        }
    };

    let bext = container
        .as_ref()
        .and_then(|c| c.bext_raw())
        .and_then(|raw| match BextChunk::parse(raw) {
            Ok(chunk) => Some(chunk),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt broadcast chunk ignored");
                None
            }
        });

    let (ixml_fields, ixml_raw) = match container.as_ref().and_then(|c| c.ixml_str()) {
        Some(raw) => match ixml::parse_fields(&raw) {
            Ok(fields) => (fields, raw),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt structured metadata ignored");
                (IxmlFields::default(), String::new())
            }
        },
        None => (IxmlFields::default(), String::new()),
    };

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let name_fields = filename_matcher::parse(&filename);

    let resolved = resolve_fields(&ixml_fields, name_fields.as_ref(), bext.as_ref());

    let fmt = container.as_ref().and_then(|c| c.fmt());
    let data_len = container.as_ref().and_then(|c| c.data_len()).unwrap_or(0);
    let (sample_rate, channels, bit_depth, format_tag) = fmt
        .map(|f| (f.sample_rate, f.channels, f.bits_per_sample, f.format_tag))
        .unwrap_or_default();

    let bytes_per_second = sample_rate as u64 * channels as u64 * (bit_depth as u64 / 8);
    let duration_secs = if bytes_per_second > 0 {
        data_len as f64 / bytes_per_second as f64
    } else {
        0.0
    };

    let info = FileInfo {
        sample_rate,
        bit_depth,
        channels,
        duration_secs,
        size_bytes: meta.len(),
        modified: meta.modified().ok().map(DateTime::<Utc>::from),
        format_tag,
    };

    let broadcast = bext
        .map(|b| BroadcastInfo {
            description: b.description,
            originator: b.originator,
            originator_reference: b.originator_reference,
            origination_date: b.origination_date,
            origination_time: b.origination_time,
            time_reference_low: b.time_reference_low,
            time_reference_high: b.time_reference_high,
            coding_history: b.coding_history,
        })
        .unwrap_or_default();

    debug!(
        path = %path.display(),
        show = %resolved.show,
        scene = %resolved.scene,
        take = %resolved.take,
        "Resolved metadata record"
    );

    Ok(FileRecord {
        path: path.display().to_string(),
        filename,
        show: resolved.show,
        scene: resolved.scene,
        take: resolved.take,
        slate: resolved.slate,
        category: resolved.category,
        subcategory: resolved.subcategory,
        note: resolved.note,
        wildtrack: resolved.wildtrack,
        circled: resolved.circled,
        broadcast,
        ixml_raw,
        info,
    })
}

/// Resolve many files under a caller-controlled concurrency bound.
///
/// Per-file failures land in the result's error list; one bad file never
/// aborts the batch.
pub async fn resolve_batch(paths: Vec<std::path::PathBuf>, concurrency: usize) -> BatchReadResult {
    let outcomes: Vec<(std::path::PathBuf, Result<FileRecord>)> =
        stream::iter(paths.into_iter().map(|path| async move {
            let outcome = resolve_path(&path).await;
            (path, outcome)
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut result = BatchReadResult::default();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(record) => result.records.push(record),
            Err(e) => result.errors.push(FileError {
                path: path.display().to_string(),
                error: e.to_string(),
            }),
        }
    }
    result.success = result.errors.is_empty();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bext_with_description(description: &str) -> BextChunk {
        BextChunk {
            description: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn structured_metadata_wins_over_filename() {
        let ixml = IxmlFields {
            scene: "7".to_string(),
            ..Default::default()
        };
        let name = filename_matcher::parse("SHOW_Cat_Sc3_01.wav").unwrap();
        let fields = resolve_fields(&ixml, Some(&name), None);
        assert_eq!(fields.scene, "7");
        // Unset structured fields still fall through to the filename
        assert_eq!(fields.take, "01");
    }

    #[test]
    fn filename_fallback_chain() {
        let ixml = IxmlFields::default();
        let name = filename_matcher::parse("PR2_Allen_Sc5.14D_01.wav").unwrap();
        let fields = resolve_fields(&ixml, Some(&name), None);
        assert_eq!(fields.show, "PR2");
        assert_eq!(fields.category, "Allen");
        assert_eq!(fields.scene, "5.14");
        assert_eq!(fields.slate, "D");
        assert_eq!(fields.take, "01");
        assert_eq!(fields.subcategory, "5");
    }

    #[test]
    fn originator_is_last_resort_for_show() {
        let ixml = IxmlFields::default();
        let bext = BextChunk {
            originator: "PR9".to_string(),
            ..Default::default()
        };
        let fields = resolve_fields(&ixml, None, Some(&bext));
        assert_eq!(fields.show, "PR9");

        let name = filename_matcher::parse("PR2_Allen.wav").unwrap();
        let fields = resolve_fields(&ixml, Some(&name), Some(&bext));
        assert_eq!(fields.show, "PR2");
    }

    #[test]
    fn note_falls_back_to_description() {
        let ixml = IxmlFields::default();
        let bext = bext_with_description("room tone, keep");
        let fields = resolve_fields(&ixml, None, Some(&bext));
        assert_eq!(fields.note, "room tone, keep");
    }

    #[test]
    fn scene_take_recovered_from_description() {
        let ixml = IxmlFields::default();
        let bext = bext_with_description("SC07_TK03 voiceover");
        let fields = resolve_fields(&ixml, None, Some(&bext));
        assert_eq!(fields.scene, "07");
        assert_eq!(fields.take, "03");
    }

    #[test]
    fn recovery_never_overwrites_resolved_fields() {
        let ixml = IxmlFields {
            scene: "12".to_string(),
            ..Default::default()
        };
        let bext = bext_with_description("SC07_TK03");
        let fields = resolve_fields(&ixml, None, Some(&bext));
        assert_eq!(fields.scene, "12");
        // Take was still empty, so recovery fills it
        assert_eq!(fields.take, "03");
    }

    #[test]
    fn recovery_accepts_verbose_markers() {
        let ixml = IxmlFields::default();
        let bext = bext_with_description("SCNE_5.14B TAKE 12, second unit");
        let fields = resolve_fields(&ixml, None, Some(&bext));
        assert_eq!(fields.scene, "5.14B");
        assert_eq!(fields.take, "12");
    }

    #[test]
    fn flags_are_boolean_coerced() {
        let ixml = IxmlFields {
            wild_track: "TRUE".to_string(),
            circled: "garbage".to_string(),
            ..Default::default()
        };
        let fields = resolve_fields(&ixml, None, None);
        assert_eq!(fields.wildtrack, "true");
        assert_eq!(fields.circled, "false");

        let fields = resolve_fields(&IxmlFields::default(), None, None);
        assert_eq!(fields.wildtrack, "false");
        assert_eq!(fields.circled, "false");
    }

    #[test]
    fn scene_is_never_numerically_normalized() {
        let ixml = IxmlFields {
            scene: "007".to_string(),
            take: "010".to_string(),
            ..Default::default()
        };
        let fields = resolve_fields(&ixml, None, None);
        assert_eq!(fields.scene, "007");
        assert_eq!(fields.take, "010");
    }
}
