//! Structured metadata (`iXML`) document handling
//!
//! The document is modeled as a narrow typed sub-record for the known tags
//! plus the raw document string as the explicit unrecognized-content bag.
//! Write-back rewrites only the known tags' text in place and streams
//! everything else through unchanged, so unknown elements, attributes, and
//! nesting survive a rewrite intact.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashSet;
use wavedeck_common::{Error, Result};

pub const TAG_PROJECT: &str = "PROJECT";
pub const TAG_SCENE: &str = "SCENE";
pub const TAG_TAKE: &str = "TAKE";
pub const TAG_SLATE: &str = "SLATE";
pub const TAG_CATEGORY: &str = "CATEGORY";
pub const TAG_SUBCATEGORY: &str = "SUBCATEGORY";
pub const TAG_NOTE: &str = "NOTE";
pub const TAG_WILD_TRACK: &str = "WILD_TRACK";
pub const TAG_CIRCLED: &str = "CIRCLED";

const ROOT_TAG: &str = "BWFXML";

/// The known structured-metadata tags, as read from a document.
///
/// Empty string means the tag was absent or empty; downstream precedence
/// treats both the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IxmlFields {
    pub project: String,
    pub scene: String,
    pub take: String,
    pub slate: String,
    pub category: String,
    pub subcategory: String,
    pub note: String,
    pub wild_track: String,
    pub circled: String,
}

impl IxmlFields {
    fn set(&mut self, tag: &str, value: String) {
        match tag.to_ascii_uppercase().as_str() {
            TAG_PROJECT => self.project = value,
            TAG_SCENE => self.scene = value,
            TAG_TAKE => self.take = value,
            TAG_SLATE => self.slate = value,
            TAG_CATEGORY => self.category = value,
            TAG_SUBCATEGORY => self.subcategory = value,
            TAG_NOTE => self.note = value,
            TAG_WILD_TRACK => self.wild_track = value,
            TAG_CIRCLED => self.circled = value,
            _ => {}
        }
    }
}

fn is_known_tag(name: &str) -> bool {
    [
        TAG_PROJECT,
        TAG_SCENE,
        TAG_TAKE,
        TAG_SLATE,
        TAG_CATEGORY,
        TAG_SUBCATEGORY,
        TAG_NOTE,
        TAG_WILD_TRACK,
        TAG_CIRCLED,
    ]
    .iter()
    .any(|t| t.eq_ignore_ascii_case(name))
}

fn corrupt(e: impl std::fmt::Display) -> Error {
    Error::CorruptChunk(format!("structured metadata: {}", e))
}

fn ser_err(e: impl std::fmt::Display) -> Error {
    Error::Serialization(format!("structured metadata: {}", e))
}

/// Extract the known tags from a document.
///
/// Only direct children of the root element are interpreted; identically
/// named tags nested deeper belong to other vendors' sub-trees and are left
/// alone.
pub fn parse_fields(raw: &str) -> Result<IxmlFields> {
    let mut reader = Reader::from_str(raw);
    let mut fields = IxmlFields::default();
    let mut depth = 0usize;
    let mut capture: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event().map_err(corrupt)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if depth == 1 && is_known_tag(&name) {
                    capture = Some(name);
                    text.clear();
                }
                depth += 1;
            }
            Event::Text(e) => {
                if capture.is_some() && depth == 2 {
                    text.push_str(&e.unescape().map_err(corrupt)?);
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 1 {
                    if let Some(name) = capture.take() {
                        fields.set(&name, text.trim().to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(corrupt("document ends inside an open element"));
    }

    Ok(fields)
}

/// Rewrite the text content of the given known tags in place, inserting any
/// that are missing just before the root element closes. Everything else in
/// the document streams through untouched.
///
/// An empty `raw` builds a fresh minimal document instead.
pub fn apply_tags(raw: &str, updates: &[(&str, &str)]) -> Result<String> {
    if raw.trim().is_empty() {
        return build_document(updates);
    }

    let mut reader = Reader::from_str(raw);
    let mut writer = Writer::new(Vec::new());
    let mut depth = 0usize;
    let mut saw_root_end = false;
    let mut written: HashSet<String> = HashSet::new();

    loop {
        match reader.read_event().map_err(ser_err)? {
            Event::Eof => break,
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if depth == 1 {
                    if let Some((_, value)) =
                        updates.iter().find(|(k, _)| k.eq_ignore_ascii_case(&name))
                    {
                        writer.write_event(Event::Start(e)).map_err(ser_err)?;
                        writer
                            .write_event(Event::Text(BytesText::new(value)))
                            .map_err(ser_err)?;
                        skip_to_end(&mut reader, &name)?;
                        writer
                            .write_event(Event::End(BytesEnd::new(name.as_str())))
                            .map_err(ser_err)?;
                        written.insert(name.to_ascii_uppercase());
                        continue;
                    }
                }
                depth += 1;
                writer.write_event(Event::Start(e)).map_err(ser_err)?;
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if depth == 1 {
                    if let Some((_, value)) =
                        updates.iter().find(|(k, _)| k.eq_ignore_ascii_case(&name))
                    {
                        write_simple(&mut writer, &name, value)?;
                        written.insert(name.to_ascii_uppercase());
                        continue;
                    }
                }
                if depth == 0 {
                    // Self-closing root: reopen it so the tags have a home
                    writer
                        .write_event(Event::Start(BytesStart::new(name.as_str())))
                        .map_err(ser_err)?;
                    for &(k, v) in updates {
                        write_simple(&mut writer, k, v)?;
                    }
                    writer
                        .write_event(Event::End(BytesEnd::new(name.as_str())))
                        .map_err(ser_err)?;
                    saw_root_end = true;
                    continue;
                }
                writer.write_event(Event::Empty(e)).map_err(ser_err)?;
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    for &(k, v) in updates {
                        if !written.contains(&k.to_ascii_uppercase()) {
                            write_simple(&mut writer, k, v)?;
                        }
                    }
                    saw_root_end = true;
                }
                writer.write_event(Event::End(e)).map_err(ser_err)?;
            }
            ev => {
                writer.write_event(ev).map_err(ser_err)?;
            }
        }
    }

    if !saw_root_end {
        return Err(ser_err("document has no closed root element"));
    }

    String::from_utf8(writer.into_inner()).map_err(|e| ser_err(e))
}

/// Consume events until the end tag matching an already-consumed start tag
fn skip_to_end(reader: &mut Reader<&[u8]>, name: &str) -> Result<()> {
    let mut depth = 1usize;
    loop {
        match reader.read_event().map_err(ser_err)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => return Err(ser_err(format!("unclosed element {}", name))),
            _ => {}
        }
    }
}

fn write_simple(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(ser_err)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(ser_err)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(ser_err)?;
    Ok(())
}

/// Build a fresh minimal document carrying only the given tags
fn build_document(updates: &[(&str, &str)]) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(ser_err)?;
    writer
        .write_event(Event::Start(BytesStart::new(ROOT_TAG)))
        .map_err(ser_err)?;
    write_simple(&mut writer, "IXML_VERSION", "1.61")?;
    for &(k, v) in updates {
        write_simple(&mut writer, k, v)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(ROOT_TAG)))
        .map_err(ser_err)?;
    String::from_utf8(writer.into_inner()).map_err(|e| ser_err(e))
}
