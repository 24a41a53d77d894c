/*!
 * Boundary snapping: dejitter against a reference tier and zero-crossing alignment.
 */

use log::debug;

use super::document::Textgrid;
use super::entry::{Interval, Point};
use super::interval_tier::IntervalTier;
use super::point_tier::PointTier;
use super::tier::Tier;
use crate::audio::AudioSource;
use crate::errors::{Result, TextgridError};
use crate::timing::{approx_eq, approx_ge, approx_gt, approx_le, approx_lt, within};

impl Tier {
    /// Moves each boundary to the nearest `reference` time within `max_distance`
    pub fn dejitter(&self, reference: &[f64], max_distance: f64) -> Result<Tier> {
        if max_distance <= 0.0 {
            return Err(TextgridError::InvalidArgument(format!("max distance {} must be positive", max_distance)));
        }
        let mut reference = reference.to_vec();
        reference.sort_by(f64::total_cmp);
        retime(self, |time| nearest(time, &reference, max_distance))
    }

    /// Moves each boundary to the nearest zero crossing the audio reports within `search_window`.
    ///
    /// A boundary with no crossing in range stays where it is.
    pub fn to_zero_crossings<A>(&self, audio: &A, search_window: f64) -> Result<Tier>
    where
        A: AudioSource + ?Sized,
    {
        retime(self, |time| audio.find_nearest_zero_crossing(time, search_window))
    }
}

impl Textgrid {
    /// Snaps every tier except `reference_tier` onto the reference tier's boundaries
    pub fn dejitter(&self, reference_tier: &str, max_distance: f64) -> Result<Textgrid> {
        let reference = self.get_tier(reference_tier)?.timestamps();
        let mut result = Textgrid::new(self.min_time(), self.max_time())?;
        for tier in self.tiers() {
            if tier.name() == reference_tier {
                result.add_tier(tier.clone())?;
            } else {
                result.add_tier(tier.dejitter(&reference, max_distance)?)?;
            }
        }
        Ok(result)
    }

    /// Snaps the boundaries of every tier to zero crossings in `audio`
    pub fn to_zero_crossings<A>(&self, audio: &A, search_window: f64) -> Result<Textgrid>
    where
        A: AudioSource + ?Sized,
    {
        let mut result = Textgrid::new(self.min_time(), self.max_time())?;
        for tier in self.tiers() {
            result.add_tier(tier.to_zero_crossings(audio, search_window)?)?;
        }
        Ok(result)
    }
}

/// Rebuilds a tier with every boundary passed through `snap`.
///
/// Each distinct boundary time is snapped once, so entries sharing a boundary
/// move together. A snapped value outside the tier bounds, or one that would
/// collapse an entry or reorder boundaries, is ignored; gaps may close.
fn retime(tier: &Tier, snap: impl Fn(f64) -> Option<f64>) -> Result<Tier> {
    let min_time = tier.min_time();
    let max_time = tier.max_time();
    let opens_entry = |time: f64| match tier {
        Tier::Interval(t) => {
            let index = t.entries().partition_point(|e| approx_lt(e.start, time));
            t.entries().get(index).is_some_and(|e| approx_eq(e.start, time))
        }
        Tier::Point(_) => true,
    };
    let boundaries = BoundaryMap::build(tier.timestamps(), opens_entry, |time| {
        snap(time).filter(|&snapped| within(snapped, min_time, max_time))
    });

    let mut moved = 0usize;
    let result: Tier = match tier {
        Tier::Interval(t) => {
            let entries: Vec<Interval> = t
                .entries()
                .iter()
                .map(|e| e.with_span(boundaries.get(e.start), boundaries.get(e.end)))
                .collect();
            moved += entries.iter().zip(t.entries()).filter(|(a, b)| a.start != b.start || a.end != b.end).count();
            IntervalTier::new(t.name(), entries, Some(min_time), Some(max_time))?.into()
        }
        Tier::Point(t) => {
            let entries: Vec<Point> = t
                .entries()
                .iter()
                .map(|p| Point { time: boundaries.get(p.time), label: p.label.clone() })
                .collect();
            moved += entries.iter().zip(t.entries()).filter(|(a, b)| a.time != b.time).count();
            PointTier::new(t.name(), entries, Some(min_time), Some(max_time))?.into()
        }
    };

    debug!("Moved {} entries in tier '{}'", moved, tier.name());
    Ok(result)
}

/// Old to new position of every distinct boundary of a tier
struct BoundaryMap {
    original: Vec<f64>,
    snapped: Vec<f64>,
}

impl BoundaryMap {
    /// `closed_after(time)` tells whether the span from `time` to the next
    /// boundary lies inside an entry; such a span must keep a positive length.
    fn build(mut times: Vec<f64>, closed_after: impl Fn(f64) -> bool, snap: impl Fn(f64) -> Option<f64>) -> Self {
        times.sort_by(f64::total_cmp);
        times.dedup_by(|a, b| approx_eq(*a, *b));
        let closed: Vec<bool> = times.iter().map(|&time| closed_after(time)).collect();

        let mut snapped: Vec<f64> = Vec::with_capacity(times.len());
        for (index, &time) in times.iter().enumerate() {
            let previous = snapped.last().copied();
            let next = times.get(index + 1).copied();
            let after_previous = |target: f64| match previous {
                Some(p) if closed[index - 1] => approx_gt(target, p),
                Some(p) => approx_ge(target, p),
                None => true,
            };
            // the next boundary may still stay put, so its old position is the limit
            let before_next = |target: f64| match next {
                Some(n) if closed[index] => approx_lt(target, n),
                Some(n) => approx_le(target, n),
                None => true,
            };
            let position = match snap(time) {
                Some(target) if after_previous(target) && before_next(target) => target,
                _ => time,
            };
            snapped.push(position);
        }
        Self { original: times, snapped }
    }

    fn get(&self, time: f64) -> f64 {
        let index = self.original.partition_point(|&b| approx_lt(b, time));
        match self.original.get(index) {
            Some(&b) if approx_eq(b, time) => self.snapped[index],
            _ => time,
        }
    }
}

/// The member of sorted `candidates` closest to `value`, if within `max_distance`
fn nearest(value: f64, candidates: &[f64], max_distance: f64) -> Option<f64> {
    let index = candidates.partition_point(|&c| c < value);
    let below = index.checked_sub(1).and_then(|i| candidates.get(i));
    let above = candidates.get(index);

    let best = match (below, above) {
        (Some(&b), Some(&a)) => {
            if value - b <= a - value { b } else { a }
        }
        (Some(&b), None) => b,
        (None, Some(&a)) => a,
        (None, None) => return None,
    };
    approx_le((best - value).abs(), max_distance).then_some(best)
}
