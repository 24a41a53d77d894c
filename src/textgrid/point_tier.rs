/*!
 * Point tiers: labelled instants in strictly increasing time order.
 */

use super::entry::Point;
use super::tier::{check_bounds, check_region, shift_bounds, shrink_bounds};
use super::{CropMode, EraseCollision, InsertCollision, MatchMode, ShiftMode, join_labels, label_matcher};
use crate::errors::{Result, TextgridError};
use crate::timing::{approx_eq, approx_ge, approx_gt, approx_lt, within};

/// A named track of labelled instants
#[derive(Debug, Clone)]
pub struct PointTier {
    name: String,
    entries: Vec<Point>,
    min_time: f64,
    max_time: f64,
}

impl PointTier {
    /// Creates a tier. Missing bounds are taken from the first and last points.
    pub fn new(
        name: impl Into<String>,
        entries: Vec<Point>,
        min_time: Option<f64>,
        max_time: Option<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let mut entries = entries;
        entries.sort_by(|a, b| a.time.total_cmp(&b.time));

        let first = entries.first().map(|p| p.time);
        let last = entries.last().map(|p| p.time);
        let (min_time, max_time) = match (min_time.or(first), max_time.or(last)) {
            (Some(min), Some(max)) => (min, max),
            _ => {
                return Err(TextgridError::Validation(format!(
                    "tier '{}' has no points and no bounds",
                    name
                )));
            }
        };

        let tier = Self { name, entries, min_time, max_time };
        tier.validate()?;
        Ok(tier)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_time(&self) -> f64 {
        self.min_time
    }

    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    /// Points in time order
    pub fn entries(&self) -> &[Point] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Point> {
        self.entries
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self { name: name.into(), ..self.clone() }
    }

    pub fn with_bounds(&self, min_time: f64, max_time: f64) -> Result<Self> {
        Self::new(self.name.clone(), self.entries.clone(), Some(min_time), Some(max_time))
    }

    pub fn validate(&self) -> Result<()> {
        check_bounds(&self.name, self.min_time, self.max_time)?;

        for point in &self.entries {
            point.validate()?;
            if !within(point.time, self.min_time, self.max_time) {
                return Err(TextgridError::OutOfBounds(format!(
                    "tier '{}': {} lies outside [{}, {}]",
                    self.name, point, self.min_time, self.max_time
                )));
            }
        }

        for pair in self.entries.windows(2) {
            if !approx_lt(pair[0].time, pair[1].time) {
                return Err(TextgridError::Validation(format!(
                    "tier '{}': {} and {} share a timestamp",
                    self.name, pair[0], pair[1]
                )));
            }
        }
        Ok(())
    }

    /// Adds a point; a point already at the same time is handled per `collision`
    pub fn insert_entry(&mut self, point: Point, collision: InsertCollision) -> Result<()> {
        point.validate()?;
        if !within(point.time, self.min_time, self.max_time) {
            return Err(TextgridError::OutOfBounds(format!(
                "tier '{}': {} lies outside [{}, {}]",
                self.name, point, self.min_time, self.max_time
            )));
        }

        match self.entries.iter().position(|p| approx_eq(p.time, point.time)) {
            None => {
                let position = self.entries.partition_point(|p| p.time < point.time);
                self.entries.insert(position, point);
            }
            Some(index) => match collision {
                InsertCollision::Error => {
                    return Err(TextgridError::Collision(format!(
                        "tier '{}': {} collides with {}",
                        self.name, point, self.entries[index]
                    )));
                }
                InsertCollision::Replace => self.entries[index] = point,
                InsertCollision::Merge => {
                    let existing = &self.entries[index];
                    let merged = Point {
                        time: existing.time,
                        label: join_labels([existing.label.as_str(), point.label.as_str()]),
                    };
                    self.entries[index] = merged;
                }
            },
        }
        Ok(())
    }

    pub fn delete_entry(&mut self, point: &Point) -> Result<()> {
        let position = self.entries.iter().position(|p| p == point).ok_or_else(|| {
            TextgridError::Validation(format!("tier '{}' does not contain {}", self.name, point))
        })?;
        self.entries.remove(position);
        Ok(())
    }

    pub fn find(&self, pattern: &str, mode: MatchMode) -> Result<Vec<usize>> {
        let matches = label_matcher(pattern, mode)?;
        Ok(self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, p)| matches(&p.label))
            .map(|(i, _)| i)
            .collect())
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.entries.iter().map(|p| p.time).collect()
    }

    /// Keeps the points inside `[start, end]`. Points have no extent, so every mode behaves alike.
    pub fn crop(&self, start: f64, end: f64, _mode: CropMode, rebase_to_zero: bool) -> Result<Self> {
        if !approx_lt(start, end) {
            return Err(TextgridError::InvalidArgument(format!(
                "crop start {} must be before crop end {}",
                start, end
            )));
        }
        let crop_start = start.max(self.min_time);
        let crop_end = end.min(self.max_time);
        let (crop_start, crop_end) = if approx_lt(crop_start, crop_end) { (crop_start, crop_end) } else { (start, end) };

        let kept = self.entries.iter().filter(|p| within(p.time, crop_start, crop_end)).cloned().collect();
        let cropped = Self::new(self.name.clone(), kept, Some(crop_start), Some(crop_end))?;
        if rebase_to_zero {
            cropped.edit_timestamps(-crop_start, ShiftMode::Clamp)
        } else {
            Ok(cropped)
        }
    }

    pub fn edit_timestamps(&self, offset: f64, mode: ShiftMode) -> Result<Self> {
        let (min_time, max_time) = shift_bounds(&self.name, self.min_time, self.max_time, offset, mode)?;

        let mut entries = Vec::with_capacity(self.entries.len());
        for point in &self.entries {
            let time = point.time + offset;
            if approx_lt(time, 0.0) {
                match mode {
                    ShiftMode::Error => {
                        return Err(TextgridError::OutOfBounds(format!(
                            "tier '{}': shifting {} by {} moves it before zero",
                            self.name, point, offset
                        )));
                    }
                    ShiftMode::Clamp => continue,
                }
            }
            entries.push(Point { time: time.max(0.0), label: point.label.clone() });
        }

        Self::new(self.name.clone(), entries, Some(min_time), Some(max_time))
    }

    /// Removes points in `[start, end]`; `Error` mode refuses to drop any
    pub fn erase_region(&self, start: f64, end: f64, collision: EraseCollision, do_shrink: bool) -> Result<Self> {
        check_region(start, end)?;
        let width = end - start;

        let mut entries = Vec::with_capacity(self.entries.len());
        for point in &self.entries {
            if within(point.time, start, end) {
                if collision == EraseCollision::Error {
                    return Err(TextgridError::Collision(format!(
                        "tier '{}': {} lies in the erased region [{}, {}]",
                        self.name, point, start, end
                    )));
                }
                continue;
            }
            if do_shrink && approx_gt(point.time, end) {
                entries.push(point.shifted(-width));
            } else {
                entries.push(point.clone());
            }
        }

        let (min_time, max_time) = if do_shrink {
            shrink_bounds(self.min_time, self.max_time, start, end)
        } else {
            (self.min_time, self.max_time)
        };
        Self::new(self.name.clone(), entries, Some(min_time), Some(max_time))
    }

    /// Opens `duration` seconds at `start`, pushing later points right
    pub fn insert_space(&self, start: f64, duration: f64) -> Result<Self> {
        if duration <= 0.0 {
            return Err(TextgridError::InvalidArgument(format!("inserted duration {} must be positive", duration)));
        }
        if !within(start, self.min_time, self.max_time) {
            return Err(TextgridError::OutOfBounds(format!(
                "tier '{}': insertion point {} outside [{}, {}]",
                self.name, start, self.min_time, self.max_time
            )));
        }

        let entries = self
            .entries
            .iter()
            .map(|p| if approx_gt(p.time, start) { p.shifted(duration) } else { p.clone() })
            .collect();
        Self::new(self.name.clone(), entries, Some(self.min_time), Some(self.max_time + duration))
    }

    /// All points of both tiers; points at the same time merge their labels
    pub fn union(&self, other: &PointTier) -> Result<Self> {
        let mut all: Vec<&Point> = self.entries.iter().chain(other.entries.iter()).collect();
        all.sort_by(|a, b| a.time.total_cmp(&b.time).then_with(|| a.label.cmp(&b.label)));

        let mut merged: Vec<Point> = Vec::new();
        let mut group: Vec<&Point> = Vec::new();
        for point in all {
            if let Some(first) = group.first() {
                if !approx_eq(first.time, point.time) {
                    merged.push(Point { time: first.time, label: join_labels(group.iter().map(|p| p.label.as_str())) });
                    group.clear();
                }
            }
            group.push(point);
        }
        if let Some(first) = group.first() {
            merged.push(Point { time: first.time, label: join_labels(group.iter().map(|p| p.label.as_str())) });
        }

        Self::new(
            self.name.clone(),
            merged,
            Some(self.min_time.min(other.min_time)),
            Some(self.max_time.max(other.max_time)),
        )
    }

    /// Points that fall inside `[start, end]`
    pub fn points_between(&self, start: f64, end: f64) -> impl Iterator<Item = &Point> {
        self.entries.iter().filter(move |p| approx_ge(p.time, start) && !approx_gt(p.time, end))
    }
}

impl PartialEq for PointTier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && approx_eq(self.min_time, other.min_time)
            && approx_eq(self.max_time, other.max_time)
            && self.entries == other.entries
    }
}
