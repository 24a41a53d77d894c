/*!
 * Interval tiers: ordered, non-overlapping labelled spans.
 *
 * Entries can only be changed through `insert_entry` and `delete_entry`; every
 * other operation builds a new tier through the validating constructor.
 */

use log::debug;

use super::entry::Interval;
use super::tier::{check_bounds, check_region, shift_bounds, shrink_bounds};
use super::{
    CropMode, EraseCollision, InsertCollision, LABEL_DEMARCATOR, MatchMode, ShiftMode,
    SpaceCollision, join_labels, label_matcher,
};
use crate::errors::{Result, TextgridError};
use crate::timing::{approx_eq, approx_ge, approx_gt, approx_le, approx_lt, overlap, overlaps, within};

/// A named track of labelled time spans
#[derive(Debug, Clone)]
pub struct IntervalTier {
    // @field: Tier name, unique within a document
    name: String,
    // @field: Sorted, non-overlapping entries
    entries: Vec<Interval>,
    min_time: f64,
    max_time: f64,
}

/// Which part of an entry dominates when it meets an erased region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    Inside,
    After,
}

impl IntervalTier {
    /// Creates a tier. Missing bounds are taken from the first and last entries.
    pub fn new(
        name: impl Into<String>,
        entries: Vec<Interval>,
        min_time: Option<f64>,
        max_time: Option<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let mut entries = entries;
        entries.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));

        let min_time = match min_time {
            Some(time) => time,
            None => entries.first().map(|e| e.start).ok_or_else(|| {
                TextgridError::Validation(format!("tier '{}' has no entries and no start time", name))
            })?,
        };
        let max_time = match max_time {
            Some(time) => time,
            None => entries.iter().map(|e| e.end).reduce(f64::max).ok_or_else(|| {
                TextgridError::Validation(format!("tier '{}' has no entries and no end time", name))
            })?,
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

    /// Entries in time order
    pub fn entries(&self) -> &[Interval] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Interval> {
        self.entries
    }

    /// Same tier under another name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self { name: name.into(), ..self.clone() }
    }

    /// Same entries with new declared bounds
    pub fn with_bounds(&self, min_time: f64, max_time: f64) -> Result<Self> {
        Self::new(self.name.clone(), self.entries.clone(), Some(min_time), Some(max_time))
    }

    // @validates: Bounds, entry spans, containment and non-overlap
    pub fn validate(&self) -> Result<()> {
        check_bounds(&self.name, self.min_time, self.max_time)?;

        for entry in &self.entries {
            entry.validate().map_err(|e| in_tier(&self.name, e))?;
            if !within(entry.start, self.min_time, self.max_time)
                || !within(entry.end, self.min_time, self.max_time)
            {
                return Err(TextgridError::OutOfBounds(format!(
                    "tier '{}': {} lies outside [{}, {}]",
                    self.name, entry, self.min_time, self.max_time
                )));
            }
        }

        for pair in self.entries.windows(2) {
            if approx_lt(pair[1].start, pair[0].end) {
                return Err(TextgridError::Validation(format!(
                    "tier '{}': {} overlaps {}",
                    self.name, pair[0], pair[1]
                )));
            }
        }
        Ok(())
    }

    /// Adds an entry, resolving overlaps with existing entries per `collision`
    pub fn insert_entry(&mut self, interval: Interval, collision: InsertCollision) -> Result<()> {
        interval.validate()?;
        if !within(interval.start, self.min_time, self.max_time)
            || !within(interval.end, self.min_time, self.max_time)
        {
            return Err(TextgridError::OutOfBounds(format!(
                "tier '{}': {} lies outside [{}, {}]",
                self.name, interval, self.min_time, self.max_time
            )));
        }

        let (new_start, new_end) = (interval.start, interval.end);
        let collides = move |e: &Interval| overlaps(e.start, e.end, new_start, new_end);
        let colliding: Vec<&Interval> = self.entries.iter().filter(|&e| collides(e)).collect();

        let new_entry = if colliding.is_empty() {
            interval
        } else {
            match collision {
                InsertCollision::Error => {
                    return Err(TextgridError::Collision(format!(
                        "tier '{}': {} overlaps {} existing entries",
                        self.name,
                        interval,
                        colliding.len()
                    )));
                }
                InsertCollision::Replace => interval,
                InsertCollision::Merge => {
                    let mut members = colliding;
                    members.push(&interval);
                    members.sort_by(|a, b| a.start.total_cmp(&b.start));
                    let start = members.iter().map(|e| e.start).fold(f64::INFINITY, f64::min);
                    let end = members.iter().map(|e| e.end).fold(f64::NEG_INFINITY, f64::max);
                    let label = members.iter().map(|e| e.label.as_str()).collect::<Vec<_>>().join(LABEL_DEMARCATOR);
                    Interval { start, end, label }
                }
            }
        };

        self.entries.retain(|e| !collides(e));
        let position = self.entries.partition_point(|e| e.start < new_entry.start);
        self.entries.insert(position, new_entry);
        Ok(())
    }

    /// Removes an entry equal to `interval`
    pub fn delete_entry(&mut self, interval: &Interval) -> Result<()> {
        let position = self.entries.iter().position(|e| e == interval).ok_or_else(|| {
            TextgridError::Validation(format!("tier '{}' does not contain {}", self.name, interval))
        })?;
        self.entries.remove(position);
        Ok(())
    }

    /// Indices of entries whose label matches `pattern`
    pub fn find(&self, pattern: &str, mode: MatchMode) -> Result<Vec<usize>> {
        let matches = label_matcher(pattern, mode)?;
        Ok(self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| matches(&e.label))
            .map(|(i, _)| i)
            .collect())
    }

    /// Every distinct boundary time in ascending order
    pub fn timestamps(&self) -> Vec<f64> {
        let mut times: Vec<f64> = self.entries.iter().flat_map(|e| [e.start, e.end]).collect();
        times.sort_by(f64::total_cmp);
        times.dedup_by(|a, b| approx_eq(*a, *b));
        times
    }

    /// Unlabelled gaps between the tier bounds and the entries
    pub fn get_non_entries(&self) -> Vec<(f64, f64)> {
        let mut gaps = Vec::new();
        let mut cursor = self.min_time;
        for entry in &self.entries {
            if approx_lt(cursor, entry.start) {
                gaps.push((cursor, entry.start));
            }
            cursor = entry.end;
        }
        if approx_lt(cursor, self.max_time) {
            gaps.push((cursor, self.max_time));
        }
        gaps
    }

    /// Groups time-stamped samples by the interval containing them
    pub fn values_in_intervals<'a, T>(
        &self,
        data: &'a [T],
        time_of: impl Fn(&T) -> f64,
    ) -> Vec<(&Interval, Vec<&'a T>)> {
        self.entries
            .iter()
            .map(|entry| {
                let values = data.iter().filter(|&row| within(time_of(row), entry.start, entry.end)).collect();
                (entry, values)
            })
            .collect()
    }

    /// Restricts the tier to `[start, end]`; see `CropMode` for straddling entries
    pub fn crop(&self, start: f64, end: f64, mode: CropMode, rebase_to_zero: bool) -> Result<Self> {
        if !approx_lt(start, end) {
            return Err(TextgridError::InvalidArgument(format!(
                "crop start {} must be before crop end {}",
                start, end
            )));
        }

        let (crop_start, crop_end) = {
            let s = start.max(self.min_time);
            let e = end.min(self.max_time);
            if approx_lt(s, e) { (s, e) } else { (start, end) }
        };

        let mut kept = Vec::new();
        for entry in &self.entries {
            if approx_le(entry.end, crop_start) || approx_ge(entry.start, crop_end) {
                continue;
            }
            if approx_ge(entry.start, crop_start) && approx_le(entry.end, crop_end) {
                kept.push(entry.clone());
                continue;
            }
            match mode {
                CropMode::Strict => {}
                CropMode::Lax => kept.push(entry.clone()),
                CropMode::Truncated => {
                    let s = entry.start.max(crop_start);
                    let e = entry.end.min(crop_end);
                    if e > s {
                        kept.push(entry.with_span(s, e));
                    }
                }
            }
        }

        let mut min_time = crop_start;
        let mut max_time = crop_end;
        if mode == CropMode::Lax {
            if let Some(first) = kept.first() {
                min_time = min_time.min(first.start);
            }
            if let Some(last) = kept.last() {
                max_time = max_time.max(last.end);
            }
        }

        let cropped = Self::new(self.name.clone(), kept, Some(min_time), Some(max_time))?;
        if rebase_to_zero {
            cropped.edit_timestamps(-min_time, ShiftMode::Clamp)
        } else {
            Ok(cropped)
        }
    }

    /// Shifts every entry and the tier bounds by `offset` seconds
    pub fn edit_timestamps(&self, offset: f64, mode: ShiftMode) -> Result<Self> {
        let (min_time, max_time) = shift_bounds(&self.name, self.min_time, self.max_time, offset, mode)?;

        let mut entries = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let start = entry.start + offset;
            let end = entry.end + offset;
            if approx_lt(start, 0.0) {
                match mode {
                    ShiftMode::Error => {
                        return Err(TextgridError::OutOfBounds(format!(
                            "tier '{}': shifting {} by {} moves it before zero",
                            self.name, entry, offset
                        )));
                    }
                    ShiftMode::Clamp if approx_le(end, 0.0) => continue,
                    ShiftMode::Clamp => {}
                }
            }
            entries.push(entry.with_span(start.max(0.0), end));
        }

        Self::new(self.name.clone(), entries, Some(min_time), Some(max_time))
    }

    /// Removes `[start, end]` from the tier, optionally closing the gap
    pub fn erase_region(&self, start: f64, end: f64, collision: EraseCollision, do_shrink: bool) -> Result<Self> {
        check_region(start, end)?;
        let width = end - start;
        let shift_after = |entry: Interval| if do_shrink { entry.shifted(-width) } else { entry };

        let mut entries = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !overlaps(entry.start, entry.end, start, end) {
                if approx_ge(entry.start, end) {
                    entries.push(shift_after(entry.clone()));
                } else {
                    entries.push(entry.clone());
                }
                continue;
            }

            match collision {
                EraseCollision::Error => {
                    return Err(TextgridError::Collision(format!(
                        "tier '{}': {} overlaps the erased region [{}, {}]",
                        self.name, entry, start, end
                    )));
                }
                EraseCollision::Truncate => {
                    let has_left = approx_lt(entry.start, start);
                    let has_right = approx_gt(entry.end, end);
                    if has_left && has_right && do_shrink {
                        // both halves meet again at the seam
                        entries.push(entry.with_span(entry.start, entry.end - width));
                        continue;
                    }
                    if has_left {
                        entries.push(entry.with_span(entry.start, start));
                    }
                    if has_right {
                        entries.push(shift_after(entry.with_span(end, entry.end)));
                    }
                }
                EraseCollision::Categorical => match majority_side(entry, start, end) {
                    Side::Before => entries.push(entry.with_span(entry.start, start)),
                    Side::Inside => {}
                    Side::After => entries.push(shift_after(entry.with_span(end, entry.end))),
                },
            }
        }

        let (min_time, max_time) = if do_shrink {
            shrink_bounds(self.min_time, self.max_time, start, end)
        } else {
            (self.min_time, self.max_time)
        };
        Self::new(self.name.clone(), entries, Some(min_time), Some(max_time))
    }

    /// Opens `duration` seconds of empty time at `start`
    pub fn insert_space(&self, start: f64, duration: f64, collision: SpaceCollision) -> Result<Self> {
        if duration <= 0.0 {
            return Err(TextgridError::InvalidArgument(format!("inserted duration {} must be positive", duration)));
        }
        if !within(start, self.min_time, self.max_time) {
            return Err(TextgridError::OutOfBounds(format!(
                "tier '{}': insertion point {} outside [{}, {}]",
                self.name, start, self.min_time, self.max_time
            )));
        }

        let mut entries = Vec::with_capacity(self.entries.len() + 1);
        for entry in &self.entries {
            if approx_le(entry.end, start) {
                entries.push(entry.clone());
            } else if approx_ge(entry.start, start) {
                entries.push(entry.shifted(duration));
            } else {
                match collision {
                    SpaceCollision::Error => {
                        return Err(TextgridError::Collision(format!(
                            "tier '{}': inserting space at {} would split {}",
                            self.name, start, entry
                        )));
                    }
                    SpaceCollision::Truncate => {
                        entries.push(entry.with_span(entry.start, start));
                        entries.push(entry.with_span(start + duration, entry.end + duration));
                    }
                    SpaceCollision::Categorical => {
                        if approx_ge(start - entry.start, entry.end - start) {
                            entries.push(entry.with_span(entry.start, start));
                        } else {
                            entries.push(entry.with_span(start + duration, entry.end + duration));
                        }
                    }
                    SpaceCollision::Stretch => entries.push(entry.with_span(entry.start, entry.end + duration)),
                }
            }
        }

        Self::new(self.name.clone(), entries, Some(self.min_time), Some(self.max_time + duration))
    }

    /// Combines both tiers; overlapping spans fuse into one entry with joined labels
    pub fn union(&self, other: &IntervalTier) -> Result<Self> {
        let mut all: Vec<&Interval> = self.entries.iter().chain(other.entries.iter()).collect();
        all.sort_by(|a, b| {
            a.start
                .total_cmp(&b.start)
                .then(a.end.total_cmp(&b.end))
                .then_with(|| a.label.cmp(&b.label))
        });

        let mut merged = Vec::new();
        let mut group: Vec<&Interval> = Vec::new();
        let mut group_end = f64::NEG_INFINITY;
        for entry in all {
            if !group.is_empty() && approx_lt(entry.start, group_end) {
                group_end = group_end.max(entry.end);
                group.push(entry);
                continue;
            }
            if let Some(first) = group.first() {
                merged.push(Interval {
                    start: first.start,
                    end: group_end,
                    label: join_labels(group.iter().map(|e| e.label.as_str())),
                });
            }
            group = vec![entry];
            group_end = entry.end;
        }
        if let Some(first) = group.first() {
            merged.push(Interval {
                start: first.start,
                end: group_end,
                label: join_labels(group.iter().map(|e| e.label.as_str())),
            });
        }

        debug!("Union of '{}' and '{}' produced {} entries", self.name, other.name, merged.len());
        Self::new(
            self.name.clone(),
            merged,
            Some(self.min_time.min(other.min_time)),
            Some(self.max_time.max(other.max_time)),
        )
    }

    /// Spans covered by both tiers, labelled `self-other`
    pub fn intersection(&self, other: &IntervalTier) -> Result<Self> {
        let mut entries = Vec::new();
        let mut first_candidate = 0;
        for entry in &self.entries {
            while first_candidate < other.entries.len() && approx_le(other.entries[first_candidate].end, entry.start) {
                first_candidate += 1;
            }
            for candidate in other.entries[first_candidate..].iter().take_while(|c| approx_lt(c.start, entry.end)) {
                if overlap(entry.start, entry.end, candidate.start, candidate.end) > 0.0 {
                    entries.push(Interval {
                        start: entry.start.max(candidate.start),
                        end: entry.end.min(candidate.end),
                        label: format!("{}{}{}", entry.label, LABEL_DEMARCATOR, candidate.label),
                    });
                }
            }
        }

        Self::new(
            format!("{}{}{}", self.name, LABEL_DEMARCATOR, other.name),
            entries,
            Some(self.min_time),
            Some(self.max_time),
        )
    }

    /// This tier with every span of `other` cut out
    pub fn difference(&self, other: &IntervalTier) -> Result<Self> {
        let mut result = self.clone();
        for entry in &other.entries {
            result = result.erase_region(entry.start, entry.end, EraseCollision::Truncate, false)?;
        }
        Ok(result)
    }

    /// Re-times entries so each takes the duration of its counterpart in `target`, keeping gaps
    pub fn morph(&self, target: &IntervalTier) -> Result<Self> {
        if self.entries.len() != target.entries.len() {
            return Err(TextgridError::Validation(format!(
                "cannot morph tier '{}' ({} entries) onto '{}' ({} entries)",
                self.name,
                self.entries.len(),
                target.name,
                target.entries.len()
            )));
        }

        let mut adjustment = 0.0;
        let mut entries = Vec::with_capacity(self.entries.len());
        for (from, to) in self.entries.iter().zip(&target.entries) {
            let start = from.start + adjustment;
            entries.push(from.with_span(start, start + to.duration()));
            adjustment += to.duration() - from.duration();
        }

        Self::new(self.name.clone(), entries, Some(self.min_time), Some(self.max_time + adjustment))
    }
}

impl PartialEq for IntervalTier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && approx_eq(self.min_time, other.min_time)
            && approx_eq(self.max_time, other.max_time)
            && self.entries == other.entries
    }
}

fn majority_side(entry: &Interval, start: f64, end: f64) -> Side {
    let before = (entry.end.min(start) - entry.start).max(0.0);
    let inside = overlap(entry.start, entry.end, start, end);
    let after = (entry.end - entry.start.max(end)).max(0.0);

    // ties go to the earlier side
    if approx_ge(before, inside) && approx_ge(before, after) {
        Side::Before
    } else if approx_ge(inside, after) {
        Side::Inside
    } else {
        Side::After
    }
}

fn in_tier(name: &str, error: TextgridError) -> TextgridError {
    match error {
        TextgridError::Validation(msg) => TextgridError::Validation(format!("tier '{}': {}", name, msg)),
        TextgridError::OutOfBounds(msg) => TextgridError::OutOfBounds(format!("tier '{}': {}", name, msg)),
        other => other,
    }
}
