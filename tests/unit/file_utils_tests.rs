/*!
 * Tests for file discovery and type detection
 */

use anyhow::Result;
use std::fs;
use tiergrid::file_utils::{FileManager, FileType};
use crate::common;

#[test]
fn test_detect_file_type_withEachDocumentKind_shouldClassify() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();

    let textgrid = common::create_test_textgrid(dir, "words.TextGrid")?;
    let klattgrid = common::create_test_file(dir, "voice.KlattGrid", common::KLATTGRID)?;
    let json = common::create_test_file(dir, "words.json", r#"{"xmin": 0, "xmax": 1, "tiers": {}}"#)?;
    let riff = dir.join("speech.bin");
    fs::write(&riff, b"RIFF\x00\x00\x00\x00WAVE")?;
    let notes = common::create_test_file(dir, "notes.txt", "just some notes")?;

    assert_eq!(FileManager::detect_file_type(&textgrid)?, FileType::TextGrid);
    assert_eq!(FileManager::detect_file_type(&klattgrid)?, FileType::KlattGrid);
    assert_eq!(FileManager::detect_file_type(&json)?, FileType::Json);
    assert_eq!(FileManager::detect_file_type(&riff)?, FileType::Audio);
    assert_eq!(FileManager::detect_file_type(&notes)?, FileType::Unknown);
    Ok(())
}

#[test]
fn test_detect_file_type_withMissingFile_shouldFail() {
    assert!(FileManager::detect_file_type("/nonexistent/words.TextGrid").is_err());
}

#[test]
fn test_find_files_shouldReturnSortedMatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    common::create_test_file(dir, "b.TextGrid", "")?;
    common::create_test_file(dir, "a.TextGrid", "")?;
    common::create_test_file(dir, "c.wav", "")?;

    let found = FileManager::find_files(dir, &[".TextGrid"])?;
    let names: Vec<_> = found.iter().map(|p| p.file_name().unwrap().to_string_lossy().to_string()).collect();
    assert_eq!(names, vec!["a.TextGrid", "b.TextGrid"]);
    Ok(())
}

#[test]
fn test_write_to_file_shouldCreateParentDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out/nested/words.TextGrid");

    FileManager::write_to_file(&path, common::WORDS_AND_PHONES)?;
    assert!(FileManager::file_exists(&path));
    assert!(FileManager::dir_exists(temp_dir.path().join("out/nested")));
    assert_eq!(FileManager::read_to_string(&path)?, common::WORDS_AND_PHONES);
    Ok(())
}

#[test]
fn test_read_to_string_withUtf8Bom_shouldStripIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("bom.TextGrid");
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(common::WORDS_AND_PHONES.as_bytes());
    fs::write(&path, bytes)?;

    let content = FileManager::read_to_string(&path)?;
    assert!(content.starts_with("File type"));
    Ok(())
}
