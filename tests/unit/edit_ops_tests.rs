/*!
 * Tests for document and tier edit operations
 */

use anyhow::Result;
use tiergrid::errors::TextgridError;
use tiergrid::textgrid::{
    CropMode, EraseCollision, InsertCollision, Interval, MatchMode, ShiftMode, SpaceCollision, Textgrid, Tier,
};
use crate::common::{self, assert_close};

fn spans(tg: &Textgrid, tier: &str) -> Vec<(f64, f64, String)> {
    tg.interval_tier(tier)
        .unwrap()
        .entries()
        .iter()
        .map(|e| (e.start, e.end, e.label.clone()))
        .collect()
}

#[test]
fn test_crop_withTruncatedMode_shouldClipAndRebase() -> Result<()> {
    let tg = common::sample_textgrid();
    let cropped = tg.crop(0.5, 1.2, CropMode::Truncated, true)?;

    assert_close(cropped.min_time(), 0.0);
    assert_close(cropped.max_time(), 0.7);
    let words = spans(&cropped, "words");
    assert_eq!(words.len(), 2);
    assert_close(words[0].0, 0.0);
    assert_close(words[0].1, 0.3);
    assert_close(words[1].0, 0.5);
    assert_close(words[1].1, 0.7);

    let tones = cropped.point_tier("tones")?;
    assert_eq!(tones.len(), 1);
    assert_close(tones.entries()[0].time, 0.0);

    // the source document is untouched
    assert_eq!(tg, common::sample_textgrid());
    Ok(())
}

#[test]
fn test_crop_withStrictMode_shouldDropStraddlingEntries() -> Result<()> {
    let cropped = common::sample_textgrid().crop(0.5, 1.2, CropMode::Strict, false)?;
    assert!(cropped.interval_tier("words")?.is_empty());
    assert_close(cropped.min_time(), 0.5);
    Ok(())
}

#[test]
fn test_crop_withLaxMode_shouldKeepEntriesWhole() -> Result<()> {
    let cropped = common::sample_textgrid().crop(0.5, 1.2, CropMode::Lax, false)?;
    let words = spans(&cropped, "words");
    assert_eq!(words.len(), 2);
    assert_close(words[0].0, 0.2);
    assert_close(words[1].1, 1.6);
    assert_close(cropped.min_time(), 0.2);
    assert_close(cropped.max_time(), 1.6);
    Ok(())
}

#[test]
fn test_crop_withRangeOutsideDocument_shouldFail() {
    let result = common::sample_textgrid().crop(3.0, 4.0, CropMode::Truncated, false);
    assert!(matches!(result, Err(TextgridError::InvalidArgument(_))));
}

#[test]
fn test_edit_timestamps_beforeZero_shouldFailOrClamp() -> Result<()> {
    let tg = common::sample_textgrid();
    assert!(matches!(tg.edit_timestamps(-0.5, ShiftMode::Error), Err(TextgridError::OutOfBounds(_))));

    let clamped = tg.edit_timestamps(-0.5, ShiftMode::Clamp)?;
    assert_close(clamped.min_time(), 0.0);
    assert_close(clamped.max_time(), 1.5);
    let words = spans(&clamped, "words");
    assert_close(words[0].0, 0.0);
    assert_close(words[0].1, 0.3);
    Ok(())
}

/// A short tier pushed wholly before zero empties and stays inside the document
#[test]
fn test_edit_timestamps_withTierShiftedPastZero_shouldClampIntoDocument() -> Result<()> {
    let mut tg = Textgrid::new(0.0, 10.0)?;
    tg.add_tier(common::interval_tier("n", &[(0.0, 1.0, "a"), (1.0, 2.0, "b")], 0.0, 2.0))?;
    tg.add_tier(common::point_tier("p", &[(1.0, "x"), (5.0, "y")], 0.0, 10.0))?;
    tg.add_tier(common::interval_tier("late", &[(8.0, 10.0, "z")], 4.0, 10.0))?;

    let clamped = tg.edit_timestamps(-3.0, ShiftMode::Clamp)?;
    clamped.validate()?;
    assert_close(clamped.max_time(), 7.0);
    let n = clamped.interval_tier("n")?;
    assert!(n.entries().is_empty());
    assert!(n.min_time() >= 0.0 && n.max_time() <= 7.0);
    assert_eq!(clamped.point_tier("p")?.entries().len(), 1);
    assert_close(spans(&clamped, "late")[0].0, 5.0);

    let vanished = tg.edit_timestamps(-9.5, ShiftMode::Clamp)?;
    vanished.validate()?;
    assert_close(vanished.max_time(), 0.5);
    assert_close(vanished.interval_tier("n")?.max_time(), 0.5);
    assert_close(spans(&vanished, "late")[0].1, 0.5);
    Ok(())
}

/// Shrinking over a tier's whole span leaves that tier empty across the shrunk document
#[test]
fn test_erase_region_withTierInsideRegion_shouldEmptyIt() -> Result<()> {
    let mut tg = Textgrid::new(0.0, 10.0)?;
    tg.add_tier(common::interval_tier("words", &[(0.0, 5.0, "a"), (5.0, 10.0, "b")], 0.0, 10.0))?;
    tg.add_tier(common::interval_tier("inner", &[(3.0, 4.0, "x")], 2.0, 8.0))?;

    let erased = tg.erase_region(1.0, 9.0, EraseCollision::Truncate, true)?;
    erased.validate()?;
    assert_close(erased.max_time(), 2.0);
    let inner = erased.interval_tier("inner")?;
    assert!(inner.entries().is_empty());
    assert_eq!((inner.min_time(), inner.max_time()), (0.0, 2.0));

    assert!(matches!(
        tg.erase_region(1.0, 9.0, EraseCollision::Error, true),
        Err(TextgridError::Collision(_))
    ));
    assert!(matches!(
        tg.erase_region(0.0, 10.0, EraseCollision::Truncate, true),
        Err(TextgridError::InvalidArgument(_))
    ));
    Ok(())
}

#[test]
fn test_edit_timestamps_forward_shouldMoveBounds() -> Result<()> {
    let shifted = common::sample_textgrid().edit_timestamps(1.0, ShiftMode::Error)?;
    assert_close(shifted.min_time(), 1.0);
    assert_close(shifted.max_time(), 3.0);
    assert_close(shifted.point_tier("tones")?.entries()[1].time, 2.3);
    Ok(())
}

#[test]
fn test_erase_region_withCategoricalTie_shouldKeepEarlierSide() -> Result<()> {
    let mut tg = Textgrid::new(0.0, 3.0)?;
    tg.add_tier(common::interval_tier("w", &[(1.0, 2.0, "x")], 0.0, 3.0))?;

    let erased = tg.erase_region(1.5, 2.5, EraseCollision::Categorical, false)?;
    let words = spans(&erased, "w");
    assert_eq!(words.len(), 1);
    assert_close(words[0].0, 1.0);
    assert_close(words[0].1, 1.5);
    Ok(())
}

#[test]
fn test_erase_region_withShrink_shouldCloseGap() -> Result<()> {
    let tg = common::sample_textgrid();
    let erased = tg.erase_region(0.8, 1.0, EraseCollision::Error, true)?;
    assert_close(erased.max_time(), 1.8);
    let words = spans(&erased, "words");
    assert_close(words[1].0, 0.8);
    assert_close(words[1].1, 1.4);
    assert_close(erased.point_tier("tones")?.entries()[1].time, 1.1);
    Ok(())
}

#[test]
fn test_erase_region_withTruncateAcrossEntry_shouldSplitIt() -> Result<()> {
    let tg = common::sample_textgrid();
    let erased = tg.erase_region(0.4, 0.6, EraseCollision::Truncate, false)?;
    let words = spans(&erased, "words");
    assert_eq!(words.len(), 3);
    assert_close(words[0].1, 0.4);
    assert_close(words[1].0, 0.6);
    assert_eq!(words[1].2, "hello");
    // the H* tone at 0.5 is inside the region
    assert_eq!(erased.point_tier("tones")?.len(), 1);
    Ok(())
}

#[test]
fn test_insert_space_withEachCollisionMode_shouldResolveSplit() -> Result<()> {
    let tg = common::sample_textgrid();
    assert!(matches!(tg.insert_space(0.5, 0.25, SpaceCollision::Error), Err(TextgridError::Collision(_))));

    let stretched = tg.insert_space(0.5, 0.25, SpaceCollision::Stretch)?;
    let words = spans(&stretched, "words");
    assert_close(words[0].1, 1.05);
    assert_close(words[1].0, 1.25);
    assert_close(stretched.max_time(), 2.25);

    let truncated = tg.insert_space(0.5, 0.25, SpaceCollision::Truncate)?;
    let words = spans(&truncated, "words");
    assert_eq!(words.len(), 3);
    assert_close(words[0].1, 0.5);
    assert_close(words[1].0, 0.75);

    // 0.3s before the insertion point, 0.3s after: the earlier side wins
    let categorical = tg.insert_space(0.5, 0.25, SpaceCollision::Categorical)?;
    let words = spans(&categorical, "words");
    assert_eq!(words.len(), 2);
    assert_close(words[0].0, 0.2);
    assert_close(words[0].1, 0.5);
    Ok(())
}

#[test]
fn test_insert_entry_withMerge_shouldJoinLabels() -> Result<()> {
    let mut tier = common::interval_tier("w", &[(0.0, 1.0, "a"), (2.0, 3.0, "b")], 0.0, 4.0);
    assert!(matches!(
        tier.insert_entry(Interval::new(0.5, 2.5, "c")?, InsertCollision::Error),
        Err(TextgridError::Collision(_))
    ));

    tier.insert_entry(Interval::new(0.5, 2.5, "c")?, InsertCollision::Merge)?;
    assert_eq!(tier.entries(), &[Interval::new(0.0, 3.0, "a-c-b")?]);

    tier.insert_entry(Interval::new(3.5, 4.0, "d")?, InsertCollision::Error)?;
    assert_eq!(tier.len(), 2);
    Ok(())
}

#[test]
fn test_set_operations_onIntervalTiers_shouldCombineSpans() -> Result<()> {
    let words = common::interval_tier("words", &[(0.0, 1.0, "a"), (2.0, 3.0, "b")], 0.0, 3.0);
    let syllables = common::interval_tier("syl", &[(0.5, 2.5, "s")], 0.0, 3.0);

    let union = words.union(&syllables)?;
    assert_eq!(union.entries(), &[Interval::new(0.0, 3.0, "a-s-b")?]);

    let intersection = words.intersection(&syllables)?;
    assert_eq!(intersection.name(), "words-syl");
    assert_eq!(intersection.entries(), &[Interval::new(0.5, 1.0, "a-s")?, Interval::new(2.0, 2.5, "b-s")?]);

    let difference = words.difference(&syllables)?;
    assert_eq!(difference.entries(), &[Interval::new(0.0, 0.5, "a")?, Interval::new(2.5, 3.0, "b")?]);
    Ok(())
}

#[test]
fn test_set_operations_acrossKinds_shouldFail() -> Result<()> {
    let tg = common::sample_textgrid();
    let result = tg.get_tier("words")?.union(tg.get_tier("tones")?);
    assert!(matches!(result, Err(TextgridError::IncompatibleTier { .. })));
    Ok(())
}

#[test]
fn test_get_non_entries_shouldListGaps() {
    let tier = common::interval_tier("w", &[(0.2, 0.8, "a"), (1.0, 1.6, "b")], 0.0, 2.0);
    assert_eq!(tier.get_non_entries(), vec![(0.0, 0.2), (0.8, 1.0), (1.6, 2.0)]);
}

#[test]
fn test_find_withEachMode_shouldMatchLabels() -> Result<()> {
    let tier = common::interval_tier("w", &[(0.0, 1.0, "cat"), (1.0, 2.0, "concat"), (2.0, 3.0, "Cathy")], 0.0, 3.0);
    assert_eq!(tier.find("cat", MatchMode::Exact)?, vec![0]);
    assert_eq!(tier.find("cat", MatchMode::Contains)?, vec![0, 1]);
    assert_eq!(tier.find("^cat", MatchMode::Regex)?, vec![0, 2]);
    assert!(matches!(tier.find("(", MatchMode::Regex), Err(TextgridError::InvalidArgument(_))));
    Ok(())
}

#[test]
fn test_morph_shouldAdoptTargetDurations() -> Result<()> {
    let source = common::interval_tier("w", &[(0.0, 1.0, "a"), (1.5, 2.0, "b")], 0.0, 2.0);
    let target = common::interval_tier("t", &[(0.0, 2.0, "x"), (2.0, 3.0, "y")], 0.0, 3.0);
    let morphed = source.morph(&target)?;
    assert_eq!(morphed.entries(), &[Interval::new(0.0, 2.0, "a")?, Interval::new(2.5, 3.5, "b")?]);
    assert_close(morphed.max_time(), 3.5);
    Ok(())
}

#[test]
fn test_merge_tiers_shouldUnionSameKind() -> Result<()> {
    let mut tg = common::sample_textgrid();
    tg.add_tier(common::interval_tier("more", &[(0.7, 0.9, "x")], 0.0, 2.0))?;

    let merged = tg.merge_tiers(Some(&["words", "more"]), true)?;
    assert_eq!(merged.tier_names(), vec!["tones", "words"]);
    let words = spans(&merged, "words");
    assert_eq!(words[0].2, "hello-x");
    assert_close(words[0].1, 0.9);
    Ok(())
}

#[test]
fn test_append_textgrid_shouldConcatenate() -> Result<()> {
    let first = common::sample_textgrid();
    let second = common::sample_textgrid();
    let joined = first.append_textgrid(&second, false)?;

    assert_close(joined.max_time(), 4.0);
    let words = spans(&joined, "words");
    assert_eq!(words.len(), 4);
    assert_close(words[2].0, 2.2);
    assert_eq!(joined.point_tier("tones")?.len(), 4);
    Ok(())
}

#[test]
fn test_dejitter_shouldSnapNearbyBoundaries() -> Result<()> {
    let mut tg = Textgrid::new(0.0, 2.0)?;
    tg.add_tier(common::interval_tier("words", &[(0.0, 1.0, "a"), (1.0, 2.0, "b")], 0.0, 2.0))?;
    tg.add_tier(common::interval_tier("phones", &[(0.0, 0.9995, "p"), (1.0004, 2.0, "q")], 0.0, 2.0))?;

    let snapped = tg.dejitter("words", 0.001)?;
    let phones = spans(&snapped, "phones");
    assert_close(phones[0].1, 1.0);
    assert_close(phones[1].0, 1.0);
    assert_eq!(snapped.interval_tier("words")?, tg.interval_tier("words")?);
    Ok(())
}

#[test]
fn test_tier_lookup_withMissingName_shouldFail() -> Result<()> {
    let mut tg = common::sample_textgrid();
    assert!(matches!(tg.get_tier("nope"), Err(TextgridError::TierNotFound(_))));
    assert!(matches!(
        tg.add_tier(common::interval_tier("words", &[], 0.0, 2.0)),
        Err(TextgridError::DuplicateTierName(_))
    ));
    tg.rename_tier("words", "lexical")?;
    assert_eq!(tg.tier_names(), vec!["lexical", "tones"]);
    assert!(matches!(tg.remove_tier("tones")?, Tier::Point(_)));
    Ok(())
}

/// Pitch samples grouped under the word they fall in
#[test]
fn test_values_in_intervals_shouldBucketByTime() {
    let tier = common::interval_tier("words", &[(0.2, 0.8, "hello"), (1.0, 1.6, "world")], 0.0, 2.0);
    let samples = [(0.1, 90.0), (0.3, 120.0), (0.8, 125.0), (0.9, 130.0), (1.5, 110.0)];

    let buckets = tier.values_in_intervals(&samples, |&(time, _)| time);
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].0.label, "hello");
    assert_eq!(buckets[0].1, vec![&(0.3, 120.0), &(0.8, 125.0)]);
    assert_eq!(buckets[1].1, vec![&(1.5, 110.0)]);
}

/// Two boundaries drawn to the same reference time: the second keeps its place
#[test]
fn test_dejitter_withCompetingBoundaries_shouldKeepTierValid() -> Result<()> {
    let mut tg = Textgrid::new(0.0, 2.0)?;
    tg.add_tier(common::interval_tier("ref", &[(0.0, 1.0, "x"), (1.0, 2.0, "y")], 0.0, 2.0))?;
    tg.add_tier(common::interval_tier("manual", &[(0.0, 0.95, "a"), (0.95, 1.05, "b"), (1.05, 2.0, "c")], 0.0, 2.0))?;

    let snapped = tg.dejitter("ref", 0.1)?;
    snapped.validate()?;
    let manual = spans(&snapped, "manual");
    assert_close(manual[0].1, 1.0);
    assert_close(manual[1].0, 1.0);
    assert_close(manual[1].1, 1.05);
    assert_close(manual[2].0, 1.05);
    Ok(())
}

/// A gap between two entries may close onto a shared reference time
#[test]
fn test_dejitter_withNearMissGap_shouldCloseIt() -> Result<()> {
    let mut tg = Textgrid::new(0.0, 2.0)?;
    tg.add_tier(common::interval_tier("ref", &[(0.0, 1.0, "x"), (1.0, 2.0, "y")], 0.0, 2.0))?;
    tg.add_tier(common::interval_tier("manual", &[(0.0, 0.998, "a"), (1.001, 2.0, "b")], 0.0, 2.0))?;

    let manual = spans(&tg.dejitter("ref", 0.005)?, "manual");
    assert_close(manual[0].1, 1.0);
    assert_close(manual[1].0, 1.0);
    Ok(())
}
