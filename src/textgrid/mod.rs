/*!
 * Tiered annotation document model.
 *
 * - `entry`: interval and point entries
 * - `interval_tier` / `point_tier`: the two tier kinds and their edit operations
 * - `tier`: the `Tier` tagged variant over both kinds
 * - `tier_map`: ordered name to tier mapping
 * - `document`: the `Textgrid` document and document-wide edits
 * - `query`: sub-document extraction
 * - `alignment`: boundary snapping (dejitter, zero crossings)
 */

pub mod alignment;
pub mod document;
pub mod entry;
pub mod interval_tier;
pub mod point_tier;
pub mod query;
pub mod tier;
pub mod tier_map;

pub use document::Textgrid;
pub use entry::{Entry, Interval, Point};
pub use interval_tier::IntervalTier;
pub use point_tier::PointTier;
pub use tier::{Tier, TierKind};
pub use tier_map::TierMap;

/// Text placed between labels when entries are combined
pub const LABEL_DEMARCATOR: &str = "-";

/// How `crop` treats entries that straddle a crop boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropMode {
    /// Drop entries not fully inside the range
    Strict,
    /// Keep straddling entries whole
    Lax,
    /// Keep straddling entries, clipped to the range
    Truncated,
}

/// How `insert_entry` treats an entry that overlaps existing ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertCollision {
    /// Overlapped entries are removed
    Replace,
    /// Overlapped entries are fused with the new one
    Merge,
    /// Raise a collision error
    Error,
}

/// How `erase_region` treats entries that overlap the erased span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseCollision {
    /// Raise a collision error
    Error,
    /// Keep the parts outside the span
    Truncate,
    /// Keep only the side holding most of the entry
    Categorical,
}

/// How `insert_space` treats an entry that spans the insertion point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceCollision {
    /// Raise a collision error
    Error,
    /// Split the entry around the new space
    Truncate,
    /// Keep only the side holding most of the entry
    Categorical,
    /// Lengthen the entry by the inserted duration
    Stretch,
}

/// What `edit_timestamps` does with timestamps pushed below zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftMode {
    /// Raise an out of bounds error
    Error,
    /// Clamp to zero, dropping entries that vanish
    Clamp,
}

/// Label matching used by `find`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    Contains,
    /// Case-insensitive regular expression search
    Regex,
}

pub(crate) fn label_matcher(pattern: &str, mode: MatchMode) -> crate::errors::Result<Box<dyn Fn(&str) -> bool + '_>> {
    Ok(match mode {
        MatchMode::Exact => Box::new(move |label: &str| label == pattern),
        MatchMode::Contains => Box::new(move |label: &str| label.contains(pattern)),
        MatchMode::Regex => {
            let regex = regex::RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| crate::errors::TextgridError::InvalidArgument(format!("bad pattern '{}': {}", pattern, e)))?;
            Box::new(move |label: &str| regex.is_match(label))
        }
    })
}

/// Joins distinct labels in order, skipping empty ones
pub(crate) fn join_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for label in labels {
        if !label.is_empty() && !seen.contains(&label) {
            seen.push(label);
        }
    }
    seen.join(LABEL_DEMARCATOR)
}
