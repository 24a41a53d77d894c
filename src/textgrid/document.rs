/*!
 * The annotation document: ordered named tiers sharing a global time range.
 *
 * Edit operations take `&self` and return a new `Textgrid`, so one loaded
 * document can feed any number of derived edits.
 */

use log::debug;

use super::interval_tier::IntervalTier;
use super::point_tier::PointTier;
use super::tier::{Tier, TierKind, check_bounds, check_region, shift_bounds, shrink_bounds};
use super::tier_map::TierMap;
use super::{CropMode, EraseCollision, ShiftMode, SpaceCollision};
use crate::errors::{Result, TextgridError};
use crate::timing::{approx_eq, approx_ge, approx_le, approx_lt, within};

const DOCUMENT: &str = "textgrid";

/// A tiered annotation document
#[derive(Debug, Clone)]
pub struct Textgrid {
    min_time: f64,
    max_time: f64,
    // @field: Tiers in file order
    tiers: TierMap,
}

impl Textgrid {
    /// Creates an empty document spanning `[min_time, max_time]`
    pub fn new(min_time: f64, max_time: f64) -> Result<Self> {
        check_bounds(DOCUMENT, min_time, max_time)?;
        Ok(Self { min_time, max_time, tiers: TierMap::new() })
    }

    /// Creates a document just large enough to hold `tiers`
    pub fn from_tiers(tiers: Vec<Tier>) -> Result<Self> {
        let min_time = tiers.iter().map(|t| t.min_time()).reduce(f64::min);
        let max_time = tiers.iter().map(|t| t.max_time()).reduce(f64::max);
        let (Some(min_time), Some(max_time)) = (min_time, max_time) else {
            return Err(TextgridError::Validation("a textgrid needs bounds or at least one tier".to_string()));
        };
        Self::assemble(min_time, max_time, tiers)
    }

    fn assemble(min_time: f64, max_time: f64, tiers: impl IntoIterator<Item = Tier>) -> Result<Self> {
        let mut textgrid = Self::new(min_time, max_time)?;
        for tier in tiers {
            textgrid.add_tier(tier)?;
        }
        Ok(textgrid)
    }

    pub fn min_time(&self) -> f64 {
        self.min_time
    }

    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    pub fn duration(&self) -> f64 {
        self.max_time - self.min_time
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Tier names in document order
    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers.names()
    }

    pub fn tiers(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }

    pub fn get_tier(&self, name: &str) -> Result<&Tier> {
        self.tiers.get(name).ok_or_else(|| TextgridError::TierNotFound(name.to_string()))
    }

    pub fn interval_tier(&self, name: &str) -> Result<&IntervalTier> {
        self.get_tier(name)?.expect_interval()
    }

    pub fn point_tier(&self, name: &str) -> Result<&PointTier> {
        self.get_tier(name)?.expect_point()
    }

    /// Appends a tier; it must fit inside the document bounds and have a new name
    pub fn add_tier(&mut self, tier: impl Into<Tier>) -> Result<()> {
        let position = self.tiers.len();
        self.insert_tier(position, tier)
    }

    pub fn insert_tier(&mut self, position: usize, tier: impl Into<Tier>) -> Result<()> {
        let tier = tier.into();
        self.check_contains(&tier)?;
        self.tiers.insert_at(position, tier)
    }

    pub fn remove_tier(&mut self, name: &str) -> Result<Tier> {
        self.tiers.remove(name).ok_or_else(|| TextgridError::TierNotFound(name.to_string()))
    }

    /// Swaps the tier called `name` for `tier`, keeping its position
    pub fn replace_tier(&mut self, name: &str, tier: impl Into<Tier>) -> Result<Tier> {
        let tier = tier.into();
        self.check_contains(&tier)?;
        self.tiers.replace(name, tier)
    }

    pub fn rename_tier(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let renamed = self.get_tier(old_name)?.renamed(new_name);
        self.tiers.replace(old_name, renamed)?;
        Ok(())
    }

    // @validates: Document bounds, every tier, tier containment
    pub fn validate(&self) -> Result<()> {
        check_bounds(DOCUMENT, self.min_time, self.max_time)?;
        for tier in &self.tiers {
            tier.validate()?;
            self.check_contains(tier)?;
        }
        Ok(())
    }

    fn check_contains(&self, tier: &Tier) -> Result<()> {
        if within(tier.min_time(), self.min_time, self.max_time) && within(tier.max_time(), self.min_time, self.max_time) {
            Ok(())
        } else {
            Err(TextgridError::OutOfBounds(format!(
                "tier '{}' [{}, {}] does not fit in the textgrid [{}, {}]",
                tier.name(),
                tier.min_time(),
                tier.max_time(),
                self.min_time,
                self.max_time
            )))
        }
    }

    /// Restricts every tier to `[start, end]` intersected with the document bounds
    pub fn crop(&self, start: f64, end: f64, mode: CropMode, rebase_to_zero: bool) -> Result<Textgrid> {
        let crop_start = start.max(self.min_time);
        let crop_end = end.min(self.max_time);
        if !approx_lt(start, end) || !approx_lt(crop_start, crop_end) {
            return Err(TextgridError::InvalidArgument(format!(
                "crop range [{}, {}] does not overlap the textgrid [{}, {}]",
                start, end, self.min_time, self.max_time
            )));
        }

        let tiers = self
            .tiers
            .iter()
            .map(|t| t.crop(crop_start, crop_end, mode, false))
            .collect::<Result<Vec<_>>>()?;

        let min_time = tiers.iter().map(|t| t.min_time()).fold(crop_start, f64::min);
        let max_time = tiers.iter().map(|t| t.max_time()).fold(crop_end, f64::max);
        let cropped = Self::assemble(min_time, max_time, tiers)?;
        debug!("Cropped textgrid to [{}, {}] ({:?})", min_time, max_time, mode);

        if rebase_to_zero {
            cropped.edit_timestamps(-min_time, ShiftMode::Clamp)
        } else {
            Ok(cropped)
        }
    }

    /// Shifts every tier and the document bounds by `offset` seconds
    pub fn edit_timestamps(&self, offset: f64, mode: ShiftMode) -> Result<Textgrid> {
        let (min_time, max_time) = shift_bounds(DOCUMENT, self.min_time, self.max_time, offset, mode)?;
        let tiers = self
            .tiers
            .iter()
            .map(|t| {
                let shifted = t.edit_timestamps(offset, mode)?;
                if within(shifted.min_time(), min_time, max_time) && within(shifted.max_time(), min_time, max_time) {
                    return Ok(shifted);
                }
                // only a tier emptied by clamping can stick out of the document
                let (low, high) = (shifted.min_time().max(min_time), shifted.max_time().min(max_time));
                if approx_lt(low, high) {
                    shifted.with_bounds(low, high)
                } else {
                    shifted.with_bounds(min_time, max_time)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Self::assemble(min_time, max_time, tiers)
    }

    /// Erases `[start, end]` in every tier; with `do_shrink` later content moves left in lockstep
    pub fn erase_region(&self, start: f64, end: f64, collision: EraseCollision, do_shrink: bool) -> Result<Textgrid> {
        check_region(start, end)?;
        let swallows = |low: f64, high: f64| do_shrink && approx_le(start, low) && approx_ge(end, high);
        if swallows(self.min_time, self.max_time) {
            return Err(TextgridError::InvalidArgument(format!(
                "erasing [{}, {}] with shrinking leaves nothing of [{}, {}]",
                start, end, self.min_time, self.max_time
            )));
        }

        let (min_time, max_time) = if do_shrink {
            shrink_bounds(self.min_time, self.max_time, start, end)
        } else {
            (self.min_time, self.max_time)
        };
        let tiers = self
            .tiers
            .iter()
            .map(|t| {
                if swallows(t.min_time(), t.max_time()) {
                    // the whole tier is cut out; what remains is an empty tier over the document
                    return t.erase_region(start, end, collision, false)?.with_bounds(min_time, max_time);
                }
                t.erase_region(start, end, collision, do_shrink)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::assemble(min_time, max_time, tiers)
    }

    /// Opens `duration` seconds at `start` in every tier
    pub fn insert_space(&self, start: f64, duration: f64, collision: SpaceCollision) -> Result<Textgrid> {
        if !within(start, self.min_time, self.max_time) {
            return Err(TextgridError::OutOfBounds(format!(
                "insertion point {} outside the textgrid [{}, {}]",
                start, self.min_time, self.max_time
            )));
        }

        let tiers = self
            .tiers
            .iter()
            .map(|t| {
                if within(start, t.min_time(), t.max_time()) {
                    t.insert_space(start, duration, collision)
                } else if start < t.min_time() {
                    t.edit_timestamps(duration, ShiftMode::Error)
                } else {
                    Ok(t.clone())
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Self::assemble(self.min_time, self.max_time + duration, tiers)
    }

    /// Folds the named tiers (all tiers when `None`) into one interval tier and one point tier.
    ///
    /// The merged tiers take the name of the first selected tier of their kind and are
    /// appended after any preserved tiers.
    pub fn merge_tiers(&self, tier_names: Option<&[&str]>, preserve_other_tiers: bool) -> Result<Textgrid> {
        let selected: Vec<&Tier> = match tier_names {
            Some(names) => names.iter().map(|name| self.get_tier(name)).collect::<Result<_>>()?,
            None => self.tiers.iter().collect(),
        };

        let mut merged_intervals: Option<Tier> = None;
        let mut merged_points: Option<Tier> = None;
        for tier in &selected {
            let slot = match tier.kind() {
                TierKind::Interval => &mut merged_intervals,
                TierKind::Point => &mut merged_points,
            };
            *slot = Some(match slot.take() {
                Some(merged) => merged.union(tier)?,
                None => (*tier).clone(),
            });
        }

        let mut result = Self::new(self.min_time, self.max_time)?;
        if preserve_other_tiers {
            for tier in self.tiers.iter().filter(|t| !selected.iter().any(|s| s.name() == t.name())) {
                result.add_tier(tier.clone())?;
            }
        }
        for tier in [merged_intervals, merged_points].into_iter().flatten() {
            result.add_tier(tier)?;
        }
        Ok(result)
    }

    /// Concatenates `other` after this document. Same-named tiers are joined;
    /// with `only_matching_names` tiers present in only one document are dropped.
    pub fn append_textgrid(&self, other: &Textgrid, only_matching_names: bool) -> Result<Textgrid> {
        let offset = self.max_time - other.min_time;
        let max_time = self.max_time + other.duration();

        let mut names: Vec<&str> = self.tier_names();
        names.extend(other.tier_names().into_iter().filter(|n| !self.tiers.contains(n)));

        let mut result = Self::new(self.min_time, max_time)?;
        for name in names {
            let tier = match (self.tiers.get(name), other.tiers.get(name)) {
                (Some(first), Some(second)) => {
                    let second = second.edit_timestamps(offset, ShiftMode::Error)?;
                    join_tiers(first, &second)?
                }
                (Some(first), None) if !only_matching_names => first.clone(),
                (None, Some(second)) if !only_matching_names => second.edit_timestamps(offset, ShiftMode::Error)?,
                _ => continue,
            };
            result.add_tier(tier)?;
        }
        Ok(result)
    }
}

fn join_tiers(first: &Tier, second: &Tier) -> Result<Tier> {
    let min_time = first.min_time();
    let max_time = second.max_time();
    match (first, second) {
        (Tier::Interval(a), Tier::Interval(b)) => {
            let entries = a.entries().iter().chain(b.entries()).cloned().collect();
            Ok(IntervalTier::new(a.name(), entries, Some(min_time), Some(max_time))?.into())
        }
        (Tier::Point(a), Tier::Point(b)) => {
            let entries = a.entries().iter().chain(b.entries()).cloned().collect();
            Ok(PointTier::new(a.name(), entries, Some(min_time), Some(max_time))?.into())
        }
        _ => Err(TextgridError::IncompatibleTier {
            name: second.name().to_string(),
            expected: first.kind().to_string(),
            found: second.kind().to_string(),
        }),
    }
}

impl PartialEq for Textgrid {
    fn eq(&self, other: &Self) -> bool {
        approx_eq(self.min_time, other.min_time)
            && approx_eq(self.max_time, other.max_time)
            && self.tiers == other.tiers
    }
}
