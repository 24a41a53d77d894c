/*!
 * JSON dialects.
 *
 * The minimal form maps tier names to their entries and drops per-tier bounds:
 * `{"start": 0, "end": 1, "tiers": {"words": {"type": "IntervalTier", "entries": [[0, 1, "a"]]}}}`.
 * The structural form keeps a tier list with per-tier bounds:
 * `{"xmin": 0, "xmax": 1, "tiers": [{"class": "IntervalTier", "name": "words", "xmin": 0, "xmax": 1, "entries": [...]}]}`.
 * Interval entries are `[start, end, label]` arrays, point entries `[time, label]`.
 */

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{RawEntry, RawTextgrid, RawTier};
use crate::errors::{Result, TextgridError};
use crate::textgrid::{Textgrid, Tier, TierKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum JsonEntry {
    Interval(f64, f64, String),
    Point(f64, String),
}

#[derive(Debug, Serialize, Deserialize)]
struct MinimalTier {
    #[serde(rename = "type")]
    class: String,
    entries: Vec<JsonEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MinimalDocument {
    start: f64,
    end: f64,
    // @field: Tier name to tier, in file order
    tiers: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StructuralTier {
    class: String,
    name: String,
    xmin: f64,
    xmax: f64,
    entries: Vec<JsonEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StructuralDocument {
    xmin: f64,
    xmax: f64,
    tiers: Vec<StructuralTier>,
}

/// Malformed JSON input is a parse failure like any other malformed document
pub(crate) fn as_parse_error(error: serde_json::Error) -> TextgridError {
    TextgridError::Parse(format!("invalid JSON document: {}", error))
}

pub(crate) fn parse_minimal(data: &str) -> Result<RawTextgrid> {
    let document: MinimalDocument = serde_json::from_str(data).map_err(as_parse_error)?;
    let mut tiers = Vec::with_capacity(document.tiers.len());
    for (name, value) in document.tiers {
        let tier: MinimalTier = serde_json::from_value(value).map_err(as_parse_error)?;
        let kind = tier_kind(&name, &tier.class)?;
        let entries = raw_entries(&name, kind, tier.entries)?;
        tiers.push(RawTier { kind, name, xmin: None, xmax: None, entries });
    }
    Ok(RawTextgrid { xmin: document.start, xmax: document.end, tiers })
}

pub(crate) fn parse_structural(data: &str) -> Result<RawTextgrid> {
    let document: StructuralDocument = serde_json::from_str(data).map_err(as_parse_error)?;
    let tiers = document
        .tiers
        .into_iter()
        .map(|tier| {
            let kind = tier_kind(&tier.name, &tier.class)?;
            let entries = raw_entries(&tier.name, kind, tier.entries)?;
            Ok(RawTier { kind, name: tier.name, xmin: Some(tier.xmin), xmax: Some(tier.xmax), entries })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RawTextgrid { xmin: document.xmin, xmax: document.xmax, tiers })
}

pub fn format_minimal(textgrid: &Textgrid) -> Result<String> {
    let mut tiers = Map::new();
    for tier in textgrid.tiers() {
        let minimal = MinimalTier { class: tier.kind().class_name().to_string(), entries: json_entries(tier) };
        tiers.insert(tier.name().to_string(), serde_json::to_value(minimal)?);
    }
    let document = MinimalDocument { start: textgrid.min_time(), end: textgrid.max_time(), tiers };
    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn format_structural(textgrid: &Textgrid) -> Result<String> {
    let document = StructuralDocument {
        xmin: textgrid.min_time(),
        xmax: textgrid.max_time(),
        tiers: textgrid
            .tiers()
            .map(|tier| StructuralTier {
                class: tier.kind().class_name().to_string(),
                name: tier.name().to_string(),
                xmin: tier.min_time(),
                xmax: tier.max_time(),
                entries: json_entries(tier),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

fn tier_kind(name: &str, class: &str) -> Result<TierKind> {
    TierKind::from_class_name(class)
        .ok_or_else(|| TextgridError::Parse(format!("tier '{}' has unknown class '{}'", name, class)))
}

fn raw_entries(name: &str, kind: TierKind, entries: Vec<JsonEntry>) -> Result<Vec<RawEntry>> {
    entries
        .into_iter()
        .map(|entry| match (kind, entry) {
            (TierKind::Interval, JsonEntry::Interval(start, end, label)) => Ok(RawEntry { start, end, label }),
            (TierKind::Point, JsonEntry::Point(time, label)) => Ok(RawEntry { start: time, end: time, label }),
            (kind, entry) => Err(TextgridError::Parse(format!(
                "tier '{}' is a {} but holds the entry {:?}",
                name,
                kind.class_name(),
                entry
            ))),
        })
        .collect()
}

fn json_entries(tier: &Tier) -> Vec<JsonEntry> {
    match tier {
        Tier::Interval(t) => {
            t.entries().iter().map(|e| JsonEntry::Interval(e.start, e.end, e.label.clone())).collect()
        }
        Tier::Point(t) => t.entries().iter().map(|p| JsonEntry::Point(p.time, p.label.clone())).collect(),
    }
}
