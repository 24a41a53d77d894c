/*!
 * Property tests for serialization, edits and tier algebra
 */

use proptest::prelude::*;
use tiergrid::audio::SampleBuffer;
use tiergrid::io::{LoadOptions, SaveOptions, TextgridFormat, parse_textgrid, textgrid_to_string};
use tiergrid::textgrid::{
    CropMode, EraseCollision, Interval, IntervalTier, Point, PointTier, ShiftMode, SpaceCollision, Textgrid,
};
use tiergrid::TextgridError;

const PLAIN_LABEL: &str = "[a-z]{1,4}";
/// Starts with a letter so the label never reads back as blank
const QUOTED_LABEL: &str = "[a-z][a-z \"\n]{0,5}";

/// Non-overlapping labelled intervals on a 10 ms grid inside `[low, high]` (in 10 ms steps)
fn intervals_within(
    name: &'static str,
    label: &'static str,
    low: u32,
    high: u32,
) -> impl Strategy<Value = IntervalTier> {
    prop::collection::btree_set(low..=high, 0..24)
        .prop_flat_map(move |cuts| {
            let cuts: Vec<u32> = cuts.into_iter().collect();
            let count = cuts.len() / 2;
            (Just(cuts), prop::collection::vec(label, count))
        })
        .prop_map(move |(cuts, labels)| {
            let entries = cuts
                .chunks_exact(2)
                .zip(labels)
                .map(|(pair, label)| Interval::new(pair[0] as f64 / 100.0, pair[1] as f64 / 100.0, label).unwrap())
                .collect();
            IntervalTier::new(name, entries, Some(low as f64 / 100.0), Some(high as f64 / 100.0)).unwrap()
        })
}

/// Distinct labelled points on the same grid inside `[low, high]`
fn points_within(name: &'static str, label: &'static str, low: u32, high: u32) -> impl Strategy<Value = PointTier> {
    prop::collection::btree_set(low..=high, 0..12)
        .prop_flat_map(move |times| {
            let count = times.len();
            (Just(times), prop::collection::vec(label, count))
        })
        .prop_map(move |(times, labels)| {
            let points = times
                .into_iter()
                .zip(labels)
                .map(|(time, label)| Point::new(time as f64 / 100.0, label).unwrap())
                .collect();
            PointTier::new(name, points, Some(low as f64 / 100.0), Some(high as f64 / 100.0)).unwrap()
        })
}

fn interval_tier(name: &'static str) -> impl Strategy<Value = IntervalTier> {
    intervals_within(name, PLAIN_LABEL, 0, 1000)
}

/// Interval tier with awkward labels and bounds narrower than `[0, 10]`
fn narrow_interval_tier(name: &'static str) -> impl Strategy<Value = IntervalTier> {
    (0u32..300, 700u32..=1000).prop_flat_map(move |(low, high)| intervals_within(name, QUOTED_LABEL, low, high))
}

fn narrow_point_tier(name: &'static str) -> impl Strategy<Value = PointTier> {
    (0u32..300, 700u32..=1000).prop_flat_map(move |(low, high)| points_within(name, QUOTED_LABEL, low, high))
}

/// A `[0, 10]` document with a full-width interval tier, a narrow interval tier and a narrow point tier
fn document() -> impl Strategy<Value = Textgrid> {
    (interval_tier("words"), narrow_interval_tier("phones"), narrow_point_tier("tones")).prop_map(
        |(words, phones, tones)| {
            let mut tg = Textgrid::new(0.0, 10.0).unwrap();
            tg.add_tier(words).unwrap();
            tg.add_tier(phones).unwrap();
            tg.add_tier(tones).unwrap();
            tg
        },
    )
}

/// `(start, end)` on the same grid with `start < end`
fn region() -> impl Strategy<Value = (f64, f64)> {
    (0u32..1000, 1u32..=1000).prop_filter_map("empty region", |(a, b)| {
        (a < b).then(|| (a as f64 / 100.0, b as f64 / 100.0))
    })
}

/// Ten seconds of noise at 100 Hz, with exact zeros sprinkled in
fn noise() -> impl Strategy<Value = SampleBuffer> {
    prop::collection::vec(prop_oneof![4 => -1.0f64..1.0, 1 => Just(0.0)], 1000)
        .prop_map(|samples| SampleBuffer::new(samples, 100))
}

proptest! {
    /// Writing then reading any dialect gives back the same document
    #[test]
    fn roundtrip_every_format(words in interval_tier("words"), phones in interval_tier("phones")) {
        let mut tg = Textgrid::new(0.0, 10.0).unwrap();
        tg.add_tier(words).unwrap();
        tg.add_tier(phones).unwrap();

        for format in TextgridFormat::ALL {
            let text = textgrid_to_string(&tg, &SaveOptions::new(format)).unwrap();
            let reread = parse_textgrid(&text, &LoadOptions::default()).unwrap();
            prop_assert_eq!(&reread, &tg);
        }
    }

    /// Point tiers, quoted or multi-line labels and per-tier bounds survive every dialect that stores them
    #[test]
    fn roundtrip_keeps_labels_and_tier_bounds(tg in document()) {
        for format in [TextgridFormat::LongTextgrid, TextgridFormat::ShortTextgrid, TextgridFormat::TextgridJson] {
            let text = textgrid_to_string(&tg, &SaveOptions::new(format)).unwrap();
            let reread = parse_textgrid(&text, &LoadOptions::default()).unwrap();
            prop_assert_eq!(&reread, &tg, "format {}", format);
        }

        // the name-keyed JSON keeps entries but not tier bounds
        let text = textgrid_to_string(&tg, &SaveOptions::new(TextgridFormat::Json)).unwrap();
        let reread = parse_textgrid(&text, &LoadOptions::default()).unwrap();
        prop_assert_eq!(reread.tier_names(), tg.tier_names());
        prop_assert_eq!(reread.interval_tier("phones").unwrap().entries(), tg.interval_tier("phones").unwrap().entries());
        prop_assert_eq!(reread.point_tier("tones").unwrap().entries(), tg.point_tier("tones").unwrap().entries());
    }

    /// Cropping an already cropped tier to the same range changes nothing
    #[test]
    fn crop_is_idempotent(tier in interval_tier("w"), (start, end) in region()) {
        for mode in [CropMode::Strict, CropMode::Truncated] {
            let once = tier.crop(start, end, mode, false).unwrap();
            let twice = once.crop(start, end, mode, false).unwrap();
            prop_assert_eq!(&twice, &once);
        }
    }

    /// Shifting forward and back again restores the tier
    #[test]
    fn shift_then_unshift_restores(tier in interval_tier("w"), offset in 0u32..500) {
        let offset = offset as f64 / 100.0;
        let shifted = tier.edit_timestamps(offset, ShiftMode::Error).unwrap();
        let restored = shifted.edit_timestamps(-offset, ShiftMode::Error).unwrap();
        prop_assert_eq!(&restored, &tier);
    }

    /// Clamped shifts of any size keep the document valid
    #[test]
    fn clamped_shift_stays_valid(tg in document(), offset in -1200i32..1200) {
        let shifted = tg.edit_timestamps(offset as f64 / 100.0, ShiftMode::Clamp).unwrap();
        prop_assert!(shifted.validate().is_ok());
    }

    /// Erasing never leaves overlapping, inverted or stray entries behind
    #[test]
    fn erase_region_stays_valid(tg in document(), (start, end) in region(), shrink in any::<bool>()) {
        for collision in [EraseCollision::Error, EraseCollision::Truncate, EraseCollision::Categorical] {
            match tg.erase_region(start, end, collision, shrink) {
                Ok(erased) => prop_assert!(erased.validate().is_ok(), "{:?}", erased.validate()),
                Err(TextgridError::Collision(_)) => prop_assert_eq!(collision, EraseCollision::Error),
                Err(TextgridError::InvalidArgument(_)) => prop_assert!(shrink && start == 0.0 && end == 10.0),
                Err(other) => prop_assert!(false, "unexpected error {}", other),
            }
        }
    }

    /// Inserting space keeps every tier valid and grows the document by the inserted duration
    #[test]
    fn insert_space_stays_valid(tg in document(), at in 0u32..=1000, duration in 1u32..300) {
        let (at, duration) = (at as f64 / 100.0, duration as f64 / 100.0);
        for collision in [SpaceCollision::Error, SpaceCollision::Truncate, SpaceCollision::Categorical, SpaceCollision::Stretch] {
            match tg.insert_space(at, duration, collision) {
                Ok(spaced) => {
                    prop_assert!(spaced.validate().is_ok(), "{:?}", spaced.validate());
                    prop_assert!((spaced.max_time() - (10.0 + duration)).abs() < 1e-9);
                }
                Err(TextgridError::Collision(_)) => prop_assert_eq!(collision, SpaceCollision::Error),
                Err(other) => prop_assert!(false, "unexpected error {}", other),
            }
        }
    }

    /// Difference leaves nothing that overlaps the subtracted tier
    #[test]
    fn difference_stays_valid_and_disjoint(a in interval_tier("a"), b in narrow_interval_tier("b")) {
        let rest = a.difference(&b).unwrap();
        prop_assert!(rest.validate().is_ok());
        for kept in rest.entries() {
            for cut in b.entries() {
                prop_assert!(kept.end <= cut.start + 1e-9 || cut.end <= kept.start + 1e-9);
            }
        }
    }

    /// Snapping to another tier's boundaries keeps every tier valid
    #[test]
    fn dejitter_stays_valid(tg in document(), max_distance in 1u32..50) {
        let max_distance = max_distance as f64 / 100.0;
        for reference in ["words", "phones", "tones"] {
            let snapped = tg.dejitter(reference, max_distance).unwrap();
            prop_assert!(snapped.validate().is_ok(), "{:?}", snapped.validate());
            prop_assert_eq!(snapped.tier_names(), tg.tier_names());
        }
    }

    /// Snapping to zero crossings keeps every tier valid
    #[test]
    fn to_zero_crossings_stays_valid(tg in document(), audio in noise(), window in 1u32..30) {
        let snapped = tg.to_zero_crossings(&audio, window as f64 / 100.0).unwrap();
        prop_assert!(snapped.validate().is_ok(), "{:?}", snapped.validate());
    }

    /// Union does not depend on operand order
    #[test]
    fn union_is_commutative(a in interval_tier("a"), b in interval_tier("b")) {
        let ab = a.union(&b).unwrap();
        let ba = b.union(&a).unwrap();
        prop_assert_eq!(ab.entries(), ba.entries());
    }

    /// Every intersection span is covered by an entry of both operands
    #[test]
    fn intersection_is_covered_by_both(a in interval_tier("a"), b in interval_tier("b")) {
        let common = a.intersection(&b).unwrap();
        let covered = |tier: &IntervalTier, entry: &Interval| {
            tier.entries().iter().any(|e| e.start <= entry.start + 1e-9 && entry.end <= e.end + 1e-9)
        };
        for entry in common.entries() {
            prop_assert!(covered(&a, entry));
            prop_assert!(covered(&b, entry));
        }
    }
}
