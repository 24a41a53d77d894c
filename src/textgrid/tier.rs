/*!
 * The `Tier` tagged variant and bound arithmetic shared by both tier kinds.
 */

use std::fmt;

use super::entry::Entry;
use super::interval_tier::IntervalTier;
use super::point_tier::PointTier;
use super::{CropMode, EraseCollision, InsertCollision, MatchMode, ShiftMode, SpaceCollision};
use crate::errors::{Result, TextgridError};
use crate::timing::{approx_ge, approx_gt, approx_le, approx_lt};

/// Kind of a tier, named as the Praat text dialects name it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierKind {
    Interval,
    Point,
}

impl TierKind {
    /// Class name used in TextGrid files
    pub fn class_name(&self) -> &'static str {
        match self {
            TierKind::Interval => "IntervalTier",
            TierKind::Point => "TextTier",
        }
    }

    /// Parses a class name; `PointTier` is accepted as an alias of `TextTier`
    pub fn from_class_name(class: &str) -> Option<Self> {
        match class {
            "IntervalTier" => Some(TierKind::Interval),
            "TextTier" | "PointTier" => Some(TierKind::Point),
            _ => None,
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.class_name())
    }
}

/// A tier of either kind
#[derive(Debug, Clone, PartialEq)]
pub enum Tier {
    Interval(IntervalTier),
    Point(PointTier),
}

impl Tier {
    pub fn name(&self) -> &str {
        match self {
            Tier::Interval(tier) => tier.name(),
            Tier::Point(tier) => tier.name(),
        }
    }

    pub fn kind(&self) -> TierKind {
        match self {
            Tier::Interval(_) => TierKind::Interval,
            Tier::Point(_) => TierKind::Point,
        }
    }

    pub fn min_time(&self) -> f64 {
        match self {
            Tier::Interval(tier) => tier.min_time(),
            Tier::Point(tier) => tier.min_time(),
        }
    }

    pub fn max_time(&self) -> f64 {
        match self {
            Tier::Interval(tier) => tier.max_time(),
            Tier::Point(tier) => tier.max_time(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Tier::Interval(tier) => tier.len(),
            Tier::Point(tier) => tier.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies of the entries in time order
    pub fn entries(&self) -> Vec<Entry> {
        match self {
            Tier::Interval(tier) => tier.entries().iter().cloned().map(Entry::from).collect(),
            Tier::Point(tier) => tier.entries().iter().cloned().map(Entry::from).collect(),
        }
    }

    pub fn as_interval(&self) -> Option<&IntervalTier> {
        match self {
            Tier::Interval(tier) => Some(tier),
            Tier::Point(_) => None,
        }
    }

    pub fn as_point(&self) -> Option<&PointTier> {
        match self {
            Tier::Point(tier) => Some(tier),
            Tier::Interval(_) => None,
        }
    }

    /// The interval tier, or an `IncompatibleTier` error naming this tier
    pub fn expect_interval(&self) -> Result<&IntervalTier> {
        self.as_interval().ok_or_else(|| self.incompatible(TierKind::Interval))
    }

    pub fn expect_point(&self) -> Result<&PointTier> {
        self.as_point().ok_or_else(|| self.incompatible(TierKind::Point))
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        match self {
            Tier::Interval(tier) => Tier::Interval(tier.renamed(name)),
            Tier::Point(tier) => Tier::Point(tier.renamed(name)),
        }
    }

    pub fn with_bounds(&self, min_time: f64, max_time: f64) -> Result<Self> {
        Ok(match self {
            Tier::Interval(tier) => Tier::Interval(tier.with_bounds(min_time, max_time)?),
            Tier::Point(tier) => Tier::Point(tier.with_bounds(min_time, max_time)?),
        })
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Tier::Interval(tier) => tier.validate(),
            Tier::Point(tier) => tier.validate(),
        }
    }

    /// Adds an entry of the tier's own kind
    pub fn insert_entry(&mut self, entry: Entry, collision: InsertCollision) -> Result<()> {
        match (self, entry) {
            (Tier::Interval(tier), Entry::Interval(interval)) => tier.insert_entry(interval, collision),
            (Tier::Point(tier), Entry::Point(point)) => tier.insert_entry(point, collision),
            (tier, _) => Err(TextgridError::IncompatibleTier {
                name: tier.name().to_string(),
                expected: "an entry of the tier's kind".to_string(),
                found: tier.kind().to_string(),
            }),
        }
    }

    pub fn delete_entry(&mut self, entry: &Entry) -> Result<()> {
        match (self, entry) {
            (Tier::Interval(tier), Entry::Interval(interval)) => tier.delete_entry(interval),
            (Tier::Point(tier), Entry::Point(point)) => tier.delete_entry(point),
            (tier, _) => Err(TextgridError::Validation(format!(
                "tier '{}' cannot contain that kind of entry",
                tier.name()
            ))),
        }
    }

    pub fn find(&self, pattern: &str, mode: MatchMode) -> Result<Vec<usize>> {
        match self {
            Tier::Interval(tier) => tier.find(pattern, mode),
            Tier::Point(tier) => tier.find(pattern, mode),
        }
    }

    pub fn timestamps(&self) -> Vec<f64> {
        match self {
            Tier::Interval(tier) => tier.timestamps(),
            Tier::Point(tier) => tier.timestamps(),
        }
    }

    pub fn crop(&self, start: f64, end: f64, mode: CropMode, rebase_to_zero: bool) -> Result<Self> {
        Ok(match self {
            Tier::Interval(tier) => Tier::Interval(tier.crop(start, end, mode, rebase_to_zero)?),
            Tier::Point(tier) => Tier::Point(tier.crop(start, end, mode, rebase_to_zero)?),
        })
    }

    pub fn edit_timestamps(&self, offset: f64, mode: ShiftMode) -> Result<Self> {
        Ok(match self {
            Tier::Interval(tier) => Tier::Interval(tier.edit_timestamps(offset, mode)?),
            Tier::Point(tier) => Tier::Point(tier.edit_timestamps(offset, mode)?),
        })
    }

    pub fn erase_region(&self, start: f64, end: f64, collision: EraseCollision, do_shrink: bool) -> Result<Self> {
        Ok(match self {
            Tier::Interval(tier) => Tier::Interval(tier.erase_region(start, end, collision, do_shrink)?),
            Tier::Point(tier) => Tier::Point(tier.erase_region(start, end, collision, do_shrink)?),
        })
    }

    /// Point tiers only shift; `collision` applies to interval tiers
    pub fn insert_space(&self, start: f64, duration: f64, collision: SpaceCollision) -> Result<Self> {
        Ok(match self {
            Tier::Interval(tier) => Tier::Interval(tier.insert_space(start, duration, collision)?),
            Tier::Point(tier) => Tier::Point(tier.insert_space(start, duration)?),
        })
    }

    /// Union of two tiers of the same kind
    pub fn union(&self, other: &Tier) -> Result<Self> {
        match (self, other) {
            (Tier::Interval(a), Tier::Interval(b)) => Ok(Tier::Interval(a.union(b)?)),
            (Tier::Point(a), Tier::Point(b)) => Ok(Tier::Point(a.union(b)?)),
            _ => Err(other.incompatible(self.kind())),
        }
    }

    /// Intersection; interval tiers only
    pub fn intersection(&self, other: &Tier) -> Result<Self> {
        Ok(Tier::Interval(self.expect_interval()?.intersection(other.expect_interval()?)?))
    }

    /// Difference; interval tiers only
    pub fn difference(&self, other: &Tier) -> Result<Self> {
        Ok(Tier::Interval(self.expect_interval()?.difference(other.expect_interval()?)?))
    }

    fn incompatible(&self, expected: TierKind) -> TextgridError {
        TextgridError::IncompatibleTier {
            name: self.name().to_string(),
            expected: expected.to_string(),
            found: self.kind().to_string(),
        }
    }
}

impl From<IntervalTier> for Tier {
    fn from(tier: IntervalTier) -> Self {
        Tier::Interval(tier)
    }
}

impl From<PointTier> for Tier {
    fn from(tier: PointTier) -> Self {
        Tier::Point(tier)
    }
}

/// Checks that `[min_time, max_time]` is a non-empty span starting at or after zero
pub(crate) fn check_bounds(owner: &str, min_time: f64, max_time: f64) -> Result<()> {
    if !min_time.is_finite() || !max_time.is_finite() {
        return Err(TextgridError::Validation(format!("'{}' has non-finite bounds", owner)));
    }
    if approx_lt(min_time, 0.0) {
        return Err(TextgridError::OutOfBounds(format!("'{}' starts before zero ({})", owner, min_time)));
    }
    if max_time <= min_time {
        return Err(TextgridError::Validation(format!(
            "'{}' must end after it starts ({} - {})",
            owner, min_time, max_time
        )));
    }
    Ok(())
}

pub(crate) fn check_region(start: f64, end: f64) -> Result<()> {
    if approx_lt(start, 0.0) || !approx_lt(start, end) {
        return Err(TextgridError::InvalidArgument(format!("invalid region [{}, {}]", start, end)));
    }
    Ok(())
}

/// Bounds after shifting by `offset`; a start pushed below zero is clamped or rejected.
/// A range pushed wholly below zero keeps its width from zero when clamping.
pub(crate) fn shift_bounds(owner: &str, min_time: f64, max_time: f64, offset: f64, mode: ShiftMode) -> Result<(f64, f64)> {
    let min_time = min_time + offset;
    let max_time = max_time + offset;
    if approx_le(max_time, 0.0) {
        if mode == ShiftMode::Clamp {
            // nothing survives, so the emptied window stops at zero
            return Ok((0.0, max_time - min_time));
        }
        return Err(TextgridError::OutOfBounds(format!(
            "'{}': shifting by {} moves everything before zero",
            owner, offset
        )));
    }
    if approx_lt(min_time, 0.0) && mode == ShiftMode::Error {
        return Err(TextgridError::OutOfBounds(format!(
            "'{}': shifting by {} moves the start to {}",
            owner, offset, min_time
        )));
    }
    Ok((min_time.max(0.0), max_time))
}

/// Bounds after `[start, end]` is cut out and the remainder closed up
pub(crate) fn shrink_bounds(min_time: f64, max_time: f64, start: f64, end: f64) -> (f64, f64) {
    let width = end - start;
    let shrink = |t: f64| {
        if approx_ge(t, end) {
            t - width
        } else if approx_gt(t, start) {
            start
        } else {
            t
        }
    };
    (shrink(min_time), shrink(max_time))
}
