/*!
 * Reading and writing annotation documents.
 *
 * Four dialects share one in-memory model:
 * - `long_form`: Praat's verbose text form (`xmin = 0` on every line)
 * - `short_form`: Praat's positional text form
 * - `json_form`: a minimal JSON form keyed by tier name, and a structural JSON
 *   form that keeps per-tier bounds
 *
 * Parsers produce a loosely checked `RawTextgrid`; `build_textgrid` applies the
 * load options and turns it into a validated `Textgrid`. Writers receive a
 * document already prepared by `prepare_for_saving` (blank filling,
 * ultrashort interval removal, bound overrides) and only format it.
 */

pub mod json_form;
pub(crate) mod lexer;
pub mod long_form;
pub mod short_form;

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TextgridError};
use crate::textgrid::{Interval, IntervalTier, Point, PointTier, Textgrid, Tier, TierKind};
use crate::timing::{approx_le, approx_lt, MIN_INTERVAL_LENGTH};

/// Serialization dialect of an annotation document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextgridFormat {
    // @format: Praat verbose text form
    #[default]
    LongTextgrid,
    // @format: Praat positional text form
    ShortTextgrid,
    // @format: JSON keyed by tier name, no per-tier bounds
    Json,
    // @format: JSON tier list with per-tier bounds
    TextgridJson,
}

impl TextgridFormat {
    pub const ALL: [TextgridFormat; 4] = [
        TextgridFormat::LongTextgrid,
        TextgridFormat::ShortTextgrid,
        TextgridFormat::Json,
        TextgridFormat::TextgridJson,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LongTextgrid => "long_textgrid",
            Self::ShortTextgrid => "short_textgrid",
            Self::Json => "json",
            Self::TextgridJson => "textgrid_json",
        }
    }

    /// File extension conventionally used for the dialect
    pub fn extension(&self) -> &'static str {
        match self {
            Self::LongTextgrid | Self::ShortTextgrid => "TextGrid",
            Self::Json | Self::TextgridJson => "json",
        }
    }

    /// Whether the dialect is one of Praat's text forms, which need full coverage
    pub fn is_praat_text(&self) -> bool {
        matches!(self, Self::LongTextgrid | Self::ShortTextgrid)
    }
}

impl fmt::Display for TextgridFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TextgridFormat {
    type Err = TextgridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "long_textgrid" | "long" => Ok(Self::LongTextgrid),
            "short_textgrid" | "short" => Ok(Self::ShortTextgrid),
            "json" => Ok(Self::Json),
            "textgrid_json" => Ok(Self::TextgridJson),
            _ => Err(TextgridError::InvalidArgument(format!("Invalid textgrid format: {}", s))),
        }
    }
}

/// What to do when a file holds several tiers with the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateNamesMode {
    /// Fail with `DuplicateTierName`
    #[default]
    Error,
    /// Keep both, appending `_2`, `_3`, ... to later ones
    Rename,
    /// Fold later tiers into the first with a tier union
    Merge,
}

impl FromStr for DuplicateNamesMode {
    type Err = TextgridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "rename" => Ok(Self::Rename),
            "merge" => Ok(Self::Merge),
            _ => Err(TextgridError::InvalidArgument(format!("Invalid duplicate names mode: {}", s))),
        }
    }
}

/// Options applied while turning a parsed file into a document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    // @field: Keep interval entries whose label is blank
    pub include_empty_intervals: bool,

    // @field: Policy for repeated tier names
    pub duplicate_names: DuplicateNamesMode,

    // @field: Repair zero-length, unsorted and out-of-bounds entries instead of failing
    pub lenient: bool,
}

/// Options applied while writing a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveOptions {
    pub format: TextgridFormat,

    /// Fill gaps in interval tiers with blank-labelled intervals
    pub include_blank_spaces: bool,

    /// Replaces the document (and every tier) start time
    pub min_timestamp: Option<f64>,

    /// Replaces the document (and every tier) end time
    pub max_timestamp: Option<f64>,

    /// Intervals shorter than this are folded into a neighbour; `None` keeps them
    pub minimum_interval_length: Option<f64>,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            format: TextgridFormat::LongTextgrid,
            include_blank_spaces: true,
            min_timestamp: None,
            max_timestamp: None,
            minimum_interval_length: Some(MIN_INTERVAL_LENGTH),
        }
    }
}

impl SaveOptions {
    pub fn new(format: TextgridFormat) -> Self {
        Self { format, ..Self::default() }
    }
}

/// One entry as read from a file; a point has `start == end`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawEntry {
    pub start: f64,
    pub end: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawTier {
    pub kind: TierKind,
    pub name: String,
    // @field: Declared bounds; `None` means the document bounds
    pub xmin: Option<f64>,
    pub xmax: Option<f64>,
    pub entries: Vec<RawEntry>,
}

/// A parsed file before load options and invariants are applied
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawTextgrid {
    pub xmin: f64,
    pub xmax: f64,
    pub tiers: Vec<RawTier>,
}

type Formatter = fn(&Textgrid) -> Result<String>;

/// Writer for each dialect
const FORMATTERS: &[(TextgridFormat, Formatter)] = &[
    (TextgridFormat::LongTextgrid, long_form::format as Formatter),
    (TextgridFormat::ShortTextgrid, short_form::format as Formatter),
    (TextgridFormat::Json, json_form::format_minimal as Formatter),
    (TextgridFormat::TextgridJson, json_form::format_structural as Formatter),
];

/// Works out which dialect `data` is written in
pub fn detect_format(data: &str) -> Result<TextgridFormat> {
    let format = if data.trim_start().starts_with('{') {
        let value: serde_json::Value = serde_json::from_str(data).map_err(json_form::as_parse_error)?;
        match value.get("tiers") {
            Some(serde_json::Value::Array(_)) => TextgridFormat::TextgridJson,
            Some(serde_json::Value::Object(_)) => TextgridFormat::Json,
            _ => return Err(TextgridError::Parse("JSON document has no 'tiers' field".to_string())),
        }
    } else {
        match lexer::detect_layout(data)? {
            lexer::Layout::Keyed => TextgridFormat::LongTextgrid,
            lexer::Layout::Positional => TextgridFormat::ShortTextgrid,
        }
    };
    debug!("Detected textgrid format: {}", format);
    Ok(format)
}

/// Parses a document in any supported dialect
pub fn parse_textgrid(data: &str, options: &LoadOptions) -> Result<Textgrid> {
    let format = detect_format(data)?;
    parse_textgrid_as(data, format, options)
}

/// Parses a document known to be in `format`
pub fn parse_textgrid_as(data: &str, format: TextgridFormat, options: &LoadOptions) -> Result<Textgrid> {
    let raw = match format {
        TextgridFormat::LongTextgrid => long_form::parse(data)?,
        TextgridFormat::ShortTextgrid => short_form::parse(data)?,
        TextgridFormat::Json => json_form::parse_minimal(data)?,
        TextgridFormat::TextgridJson => json_form::parse_structural(data)?,
    };
    build_textgrid(raw, options)
}

/// Serializes a document in the dialect named by `options.format`
pub fn textgrid_to_string(textgrid: &Textgrid, options: &SaveOptions) -> Result<String> {
    let prepared = prepare_for_saving(textgrid, options)?;
    let formatter = FORMATTERS
        .iter()
        .find(|(format, _)| *format == options.format)
        .map(|(_, formatter)| *formatter)
        .ok_or_else(|| TextgridError::InvalidArgument(format!("no writer for format {}", options.format)))?;
    formatter(&prepared)
}

/// Reads and parses a document file (UTF-8 or UTF-16 with a byte order mark)
pub fn open_textgrid<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Textgrid> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let text = decode_bytes(&bytes)?;
    debug!("Parsing textgrid {:?}", path);
    parse_textgrid(&text, options)
}

pub fn save_textgrid<P: AsRef<Path>>(textgrid: &Textgrid, path: P, options: &SaveOptions) -> Result<()> {
    let output = textgrid_to_string(textgrid, options)?;
    fs::write(path.as_ref(), output)?;
    debug!("Saved textgrid to {:?} as {}", path.as_ref(), options.format);
    Ok(())
}

/// Decodes file contents, honouring UTF-8 and UTF-16 byte order marks
pub fn decode_bytes(bytes: &[u8]) -> Result<String> {
    let utf16 = |chunks: std::slice::ChunksExact<'_, u8>, big_endian: bool| {
        let units: Vec<u16> = chunks
            .map(|pair| {
                if big_endian { u16::from_be_bytes([pair[0], pair[1]]) } else { u16::from_le_bytes([pair[0], pair[1]]) }
            })
            .collect();
        String::from_utf16(&units).map_err(|e| TextgridError::Parse(format!("invalid UTF-16 text: {}", e)))
    };

    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => std::str::from_utf8(rest)
            .map(str::to_string)
            .map_err(|e| TextgridError::Parse(format!("invalid UTF-8 text: {}", e))),
        [0xFF, 0xFE, rest @ ..] => utf16(rest.chunks_exact(2), false),
        [0xFE, 0xFF, rest @ ..] => utf16(rest.chunks_exact(2), true),
        _ => std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| TextgridError::Parse(format!("invalid UTF-8 text: {}", e))),
    }
}

/// Applies load options to a parsed file and validates the result.
///
/// Invariant violations coming from file content are reported as parse errors.
pub(crate) fn build_textgrid(raw: RawTextgrid, options: &LoadOptions) -> Result<Textgrid> {
    let RawTextgrid { mut xmin, mut xmax, tiers: raw_tiers } = raw;

    let mut tiers = Vec::with_capacity(raw_tiers.len());
    for raw_tier in raw_tiers {
        tiers.push(build_tier(raw_tier, xmin, xmax, options).map_err(as_parse_error)?);
    }

    if options.lenient {
        for tier in &tiers {
            if tier.min_time() < xmin || tier.max_time() > xmax {
                warn!("Expanding textgrid bounds to hold tier '{}'", tier.name());
                xmin = xmin.min(tier.min_time());
                xmax = xmax.max(tier.max_time());
            }
        }
    }

    let mut textgrid = Textgrid::new(xmin, xmax).map_err(as_parse_error)?;
    for tier in tiers {
        add_with_policy(&mut textgrid, tier, options.duplicate_names).map_err(as_parse_error)?;
    }
    debug!("Loaded textgrid with {} tiers", textgrid.len());
    Ok(textgrid)
}

fn build_tier(raw: RawTier, doc_min: f64, doc_max: f64, options: &LoadOptions) -> Result<Tier> {
    let RawTier { kind, name, xmin, xmax, mut entries } = raw;
    let mut min_time = xmin.unwrap_or(doc_min);
    let mut max_time = xmax.unwrap_or(doc_max);

    if kind == TierKind::Interval && !options.include_empty_intervals {
        entries.retain(|e| !e.label.trim().is_empty());
    }

    if options.lenient {
        if kind == TierKind::Interval {
            let before = entries.len();
            entries.retain(|e| e.end > e.start);
            if entries.len() < before {
                warn!("Dropped {} zero-length intervals from tier '{}'", before - entries.len(), name);
            }
        }
        if !entries.windows(2).all(|pair| pair[0].start <= pair[1].start) {
            warn!("Sorting out-of-order entries in tier '{}'", name);
            entries.sort_by(|a, b| a.start.total_cmp(&b.start));
        }
        let first = entries.iter().map(|e| e.start).fold(min_time, f64::min);
        if first < min_time {
            warn!("Expanding start of tier '{}' to {}", name, first);
            min_time = first;
        }
        let last = entries.iter().map(|e| e.end).fold(max_time, f64::max);
        if last > max_time {
            warn!("Expanding end of tier '{}' to {}", name, last);
            max_time = last;
        }
    } else {
        check_monotonic(&name, kind, &entries)?;
    }

    let tier: Tier = match kind {
        TierKind::Interval => {
            let intervals = entries
                .into_iter()
                .map(|e| Interval::new(e.start, e.end, e.label))
                .collect::<Result<Vec<_>>>()?;
            IntervalTier::new(name, intervals, Some(min_time), Some(max_time))?.into()
        }
        TierKind::Point => {
            let points = entries.into_iter().map(|e| Point::new(e.start, e.label)).collect::<Result<Vec<_>>>()?;
            PointTier::new(name, points, Some(min_time), Some(max_time))?.into()
        }
    };
    Ok(tier)
}

// @validates: Entries in file order are ascending and do not overlap
fn check_monotonic(name: &str, kind: TierKind, entries: &[RawEntry]) -> Result<()> {
    for (index, pair) in entries.windows(2).enumerate() {
        let out_of_order = match kind {
            TierKind::Interval => approx_lt(pair[1].start, pair[0].end),
            TierKind::Point => approx_le(pair[1].start, pair[0].start),
        };
        if out_of_order {
            return Err(TextgridError::Parse(format!(
                "tier '{}': entry {} at {} does not follow entry {} ending at {}",
                name,
                index + 2,
                pair[1].start,
                index + 1,
                pair[0].end
            )));
        }
    }
    Ok(())
}

fn add_with_policy(textgrid: &mut Textgrid, tier: Tier, mode: DuplicateNamesMode) -> Result<()> {
    let name = tier.name().to_string();
    if textgrid.get_tier(&name).is_err() {
        return textgrid.add_tier(tier);
    }

    match mode {
        DuplicateNamesMode::Error => Err(TextgridError::DuplicateTierName(name)),
        DuplicateNamesMode::Rename => {
            let new_name = (2..)
                .map(|n| format!("{}_{}", name, n))
                .find(|candidate| textgrid.get_tier(candidate).is_err())
                .unwrap_or_else(|| name.clone());
            warn!("Renaming duplicate tier '{}' to '{}'", name, new_name);
            textgrid.add_tier(tier.renamed(new_name))
        }
        DuplicateNamesMode::Merge => {
            let merged = textgrid.get_tier(&name)?.union(&tier)?;
            warn!("Merging duplicate tier '{}'", name);
            textgrid.replace_tier(&name, merged)?;
            Ok(())
        }
    }
}

fn as_parse_error(error: TextgridError) -> TextgridError {
    match error {
        TextgridError::Validation(msg) | TextgridError::OutOfBounds(msg) | TextgridError::Collision(msg) => {
            TextgridError::Parse(msg)
        }
        other => other,
    }
}

/// Applies the save options: bound overrides, blank filling and ultrashort removal.
///
/// Praat's text forms need every interval tier to cover its bounds, so writing
/// them without blank filling fails when a tier has gaps.
pub fn prepare_for_saving(textgrid: &Textgrid, options: &SaveOptions) -> Result<Textgrid> {
    let min_time = options.min_timestamp.unwrap_or(textgrid.min_time());
    let max_time = options.max_timestamp.unwrap_or(textgrid.max_time());
    let mut prepared = Textgrid::new(min_time, max_time)?;

    for tier in textgrid.tiers() {
        let tier_min = if options.min_timestamp.is_some() { min_time } else { tier.min_time() };
        let tier_max = if options.max_timestamp.is_some() { max_time } else { tier.max_time() };
        let tier = tier.with_bounds(tier_min, tier_max)?;

        let tier = match tier {
            Tier::Interval(t) if options.include_blank_spaces => {
                let mut spans = fill_blanks(&t);
                if let Some(min_length) = options.minimum_interval_length {
                    spans = remove_ultrashort(spans, min_length, tier_min);
                }
                let entries = spans
                    .into_iter()
                    .map(|(start, end, label)| Interval::new(start, end, label))
                    .collect::<Result<Vec<_>>>()?;
                IntervalTier::new(t.name(), entries, Some(tier_min), Some(tier_max))?.into()
            }
            Tier::Interval(t) if options.format.is_praat_text() && !t.get_non_entries().is_empty() => {
                return Err(TextgridError::Validation(format!(
                    "tier '{}' has gaps, which the {} format cannot represent without blank spaces",
                    t.name(),
                    options.format
                )));
            }
            other => other,
        };
        prepared.add_tier(tier)?;
    }
    Ok(prepared)
}

/// Entries of `tier` with blank-labelled intervals covering every gap
fn fill_blanks(tier: &IntervalTier) -> Vec<(f64, f64, String)> {
    let mut spans = Vec::with_capacity(tier.len() * 2 + 1);
    let mut cursor = tier.min_time();
    for entry in tier.entries() {
        if cursor < entry.start {
            spans.push((cursor, entry.start, String::new()));
        }
        spans.push((entry.start, entry.end, entry.label.clone()));
        cursor = entry.end;
    }
    if cursor < tier.max_time() {
        spans.push((cursor, tier.max_time(), String::new()));
    }
    spans
}

/// Folds intervals shorter than `min_length` into the preceding interval and
/// closes the tiny gaps they leave behind
fn remove_ultrashort(spans: Vec<(f64, f64, String)>, min_length: f64, min_time: f64) -> Vec<(f64, f64, String)> {
    let mut kept: Vec<(f64, f64, String)> = Vec::with_capacity(spans.len());
    for (start, end, label) in spans {
        if end - start < min_length {
            if let Some(last) = kept.last_mut() {
                last.1 = end;
            }
        } else if kept.is_empty() && start != min_time {
            // the leading entries were too short; stretch back to the tier start
            kept.push((min_time, end, label));
        } else {
            kept.push((start, end, label));
        }
    }

    for index in 0..kept.len().saturating_sub(1) {
        let next_start = kept[index + 1].0;
        let diff = (kept[index].1 - next_start).abs();
        if diff > 0.0 && diff < min_length {
            kept[index].1 = next_start;
        }
    }
    kept
}
