/*!
 * End-to-end annotation workflows through the library API
 */

use anyhow::Result;
use tiergrid::errors::TextgridError;
use tiergrid::io::{LoadOptions, SaveOptions, TextgridFormat, open_textgrid, parse_textgrid, save_textgrid, textgrid_to_string};
use tiergrid::textgrid::{CropMode, EraseCollision, Textgrid};
use crate::common::{self, assert_close};

fn labels(tg: &Textgrid, tier: &str) -> Vec<String> {
    tg.get_tier(tier).unwrap().entries().iter().map(|e| e.label().to_string()).collect()
}

/// Blank intervals are dropped on load and written back as filler on save
#[test]
fn test_load_and_save_shouldRestoreBlankFiller() -> Result<()> {
    let tg = parse_textgrid(common::WORDS_AND_PHONES, &LoadOptions::default())?;
    let words = tg.interval_tier("word_tier")?;
    assert_eq!(words.len(), 2);
    assert_close(words.entries()[0].start, 0.3);

    let text = textgrid_to_string(&tg, &SaveOptions::default())?;
    assert!(text.contains("intervals: size = 3"));
    let with_blanks = parse_textgrid(&text, &LoadOptions { include_empty_intervals: true, ..LoadOptions::default() })?;
    let first = &with_blanks.interval_tier("word_tier")?.entries()[0];
    assert_eq!(first.label, "");
    assert_close(first.start, 0.0);
    assert_close(first.end, 0.3);
    Ok(())
}

/// Erasing a region that holds an entry depends on the collision mode
#[test]
fn test_erase_region_withEntryInside_shouldFollowCollisionMode() -> Result<()> {
    let mut tg = Textgrid::new(0.0, 2.0)?;
    tg.add_tier(common::interval_tier("w", &[(0.2, 0.6, "a"), (1.2, 1.4, "b")], 0.0, 2.0))?;

    assert!(matches!(
        tg.erase_region(1.0, 1.5, EraseCollision::Error, false),
        Err(TextgridError::Collision(_))
    ));

    let erased = tg.erase_region(1.0, 1.5, EraseCollision::Truncate, false)?;
    assert_eq!(labels(&erased, "w"), vec!["a"]);
    assert_close(erased.max_time(), 2.0);

    let shrunk = tg.erase_region(1.0, 1.5, EraseCollision::Truncate, true)?;
    assert_close(shrunk.max_time(), 1.5);
    Ok(())
}

/// Selecting one word keeps only the phones and tones inside it
#[test]
fn test_get_subtextgrid_withKeepAssociated_shouldKeepInnerPhones() -> Result<()> {
    let tg = parse_textgrid(common::WORDS_AND_PHONES, &LoadOptions::default())?;

    let cat = tg.get_subtextgrid("word_tier", |label| label == "cat", true)?;
    assert_eq!(labels(&cat, "word_tier"), vec!["cat"]);
    assert_eq!(labels(&cat, "phone_tier"), vec!["k", "ae", "t"]);
    assert_eq!(labels(&cat, "tones"), vec!["H*"]);

    let only_words = tg.get_subtextgrid("word_tier", |label| label == "cat", false)?;
    assert_eq!(labels(&only_words, "phone_tier").len(), 5);
    Ok(())
}

/// Cut a word out, move it to zero and write it in every format
#[test]
fn test_crop_then_save_shouldProduceStandaloneDocument() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let tg = parse_textgrid(common::WORDS_AND_PHONES, &LoadOptions::default())?;
    let dog = tg.crop(0.5, 1.0, CropMode::Strict, true)?;
    assert_close(dog.min_time(), 0.0);
    assert_close(dog.max_time(), 0.5);

    for format in TextgridFormat::ALL {
        let path = temp_dir.path().join(format!("dog.{}.{}", format, format.extension()));
        save_textgrid(&dog, &path, &SaveOptions::new(format))?;
        let reread = open_textgrid(&path, &LoadOptions::default())?;
        assert_eq!(labels(&reread, "phone_tier"), vec!["d", "og"]);
        assert_eq!(labels(&reread, "tones"), vec!["L%"]);
        assert_close(reread.interval_tier("phone_tier")?.entries()[1].end, 0.5);
    }
    Ok(())
}

/// Two recordings annotated separately become one document
#[test]
fn test_append_textgrid_shouldOffsetSecondDocument() -> Result<()> {
    let first = parse_textgrid(common::WORDS_AND_PHONES, &LoadOptions::default())?;
    let second = first.clone();
    let joined = first.append_textgrid(&second, true)?;

    assert_close(joined.max_time(), 2.0);
    assert_eq!(labels(&joined, "word_tier"), vec!["cat", "dog", "cat", "dog"]);
    assert_close(joined.interval_tier("word_tier")?.entries()[2].start, 1.3);
    assert_close(joined.point_tier("tones")?.entries()[3].time, 1.8);
    Ok(())
}

/// Words and phones merged into a single tier
#[test]
fn test_merge_tiers_shouldFuseOverlappingLabels() -> Result<()> {
    let tg = parse_textgrid(common::WORDS_AND_PHONES, &LoadOptions::default())?;
    let merged = tg.merge_tiers(Some(&["word_tier", "phone_tier"]), true)?;

    assert_eq!(merged.tier_names(), vec!["tones", "word_tier"]);
    assert_eq!(labels(&merged, "word_tier"), vec!["k-cat-ae-t", "d-dog-og"]);
    Ok(())
}
