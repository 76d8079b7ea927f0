//! Filename pattern matching
//!
//! Turns a bare filename into a partial structural record. Two strategies:
//! a strict `<show>_<category>_Sc<scene><slate?>_<take>.wav` grammar, then a
//! generic underscore-token fallback. Matching is total; a name that fits
//! neither strategy simply yields `None`, which the resolver treats as "no
//! filename-derived fields".

use once_cell::sync::Lazy;
use regex::Regex;

/// Structural fields recovered from a filename. Empty string = not present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilenameFields {
    pub show: String,
    pub category: String,
    pub scene: String,
    pub slate: String,
    pub take: String,
    pub subcategory: String,
}

// <show>_<category>_Sc<scene><slate?>_<take>.wav, case-insensitive.
// Scene is digits with an optional single decimal point; slate is an
// optional single letter appended directly to the scene digits; take is
// digits.
static STRICT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([^_]+)_([^_]+)_SC(\d+(?:\.\d+)?)([A-Z])?_(\d+)\.WAV$")
        .expect("strict filename pattern is valid")
});

/// Parse a filename into partial structural fields.
pub fn parse(filename: &str) -> Option<FilenameFields> {
    parse_strict(filename).or_else(|| parse_fallback(filename))
}

fn parse_strict(filename: &str) -> Option<FilenameFields> {
    let caps = STRICT_PATTERN.captures(filename)?;
    let scene = caps.get(3).map_or("", |m| m.as_str()).to_string();
    // Subcategory is the scene up to the first decimal point
    let subcategory = scene
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string();

    Some(FilenameFields {
        show: caps.get(1).map_or("", |m| m.as_str()).to_string(),
        category: caps.get(2).map_or("", |m| m.as_str()).to_string(),
        scene,
        slate: caps.get(4).map_or("", |m| m.as_str()).to_string(),
        take: caps.get(5).map_or("", |m| m.as_str()).to_string(),
        subcategory,
    })
}

fn parse_fallback(filename: &str) -> Option<FilenameFields> {
    let stem = match filename.rfind('.') {
        Some(idx) => &filename[..idx],
        None => filename,
    };

    let tokens: Vec<&str> = stem.split('_').collect();
    if tokens.len() < 2 {
        return None;
    }

    let mut fields = FilenameFields {
        show: tokens[0].to_string(),
        category: tokens[1].to_string(),
        ..Default::default()
    };

    if tokens.len() >= 3 {
        let last = tokens[tokens.len() - 1];
        if !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()) {
            fields.take = last.to_string();
            fields.scene = tokens[2..tokens.len() - 1].join("_");
        } else {
            fields.scene = tokens[2..].join("_");
        }
    }

    Some(fields)
}
