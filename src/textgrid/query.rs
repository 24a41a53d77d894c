/*!
 * Sub-document extraction by label predicate.
 */

use super::document::Textgrid;
use super::interval_tier::IntervalTier;
use super::point_tier::PointTier;
use super::tier::Tier;
use crate::errors::Result;
use crate::timing::{overlaps, within};

impl Textgrid {
    /// Keeps the entries of `tier_name` whose label satisfies `predicate`.
    ///
    /// With `keep_associated`, every other tier keeps only the entries that overlap a
    /// kept span (for example the phones of the kept words); everything else is dropped
    /// and reappears as blank filler when the document is saved with blank spaces.
    /// Without it, the other tiers are left as they are.
    pub fn get_subtextgrid<P>(&self, tier_name: &str, predicate: P, keep_associated: bool) -> Result<Textgrid>
    where
        P: Fn(&str) -> bool,
    {
        let filtered = filter_tier(self.get_tier(tier_name)?, |_, _, label| predicate(label))?;
        let spans: Vec<(f64, f64)> = filtered.entries().iter().map(|e| e.span()).collect();

        let mut result = Textgrid::new(self.min_time(), self.max_time())?;
        for tier in self.tiers() {
            if tier.name() == tier_name {
                result.add_tier(filtered.clone())?;
            } else if keep_associated {
                result.add_tier(filter_tier(tier, |start, end, _| touches_any(start, end, &spans))?)?;
            } else {
                result.add_tier(tier.clone())?;
            }
        }
        Ok(result)
    }
}

fn filter_tier(tier: &Tier, keep: impl Fn(f64, f64, &str) -> bool) -> Result<Tier> {
    Ok(match tier {
        Tier::Interval(t) => {
            let entries = t.entries().iter().filter(|e| keep(e.start, e.end, &e.label)).cloned().collect();
            IntervalTier::new(t.name(), entries, Some(t.min_time()), Some(t.max_time()))?.into()
        }
        Tier::Point(t) => {
            let entries = t.entries().iter().filter(|p| keep(p.time, p.time, &p.label)).cloned().collect();
            PointTier::new(t.name(), entries, Some(t.min_time()), Some(t.max_time()))?.into()
        }
    })
}

/// Whether the span `[start, end]` (a point when equal) meets any of `spans`
fn touches_any(start: f64, end: f64, spans: &[(f64, f64)]) -> bool {
    spans.iter().any(|&(s, e)| {
        if start == end {
            within(start, s, e)
        } else if s == e {
            within(s, start, end)
        } else {
            overlaps(start, end, s, e)
        }
    })
}
