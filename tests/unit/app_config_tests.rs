/*!
 * Tests for the configuration file
 */

use anyhow::Result;
use tiergrid::app_config::{Config, LogLevel};
use tiergrid::io::{DuplicateNamesMode, TextgridFormat};
use crate::common;

#[test]
fn test_load_or_create_withExistingFile_shouldReadSettings() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "load": {"include_empty_intervals": true, "duplicate_names": "merge"},
            "save": {"format": "textgrid_json", "include_blank_spaces": false, "minimum_interval_length": null},
            "praat": {"executable": "/opt/praat/praat", "max_pitch": 600},
            "log_level": "trace"
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;
    assert!(config.validate().is_ok());

    let load = config.load_options();
    assert!(load.include_empty_intervals);
    assert_eq!(load.duplicate_names, DuplicateNamesMode::Merge);
    assert!(!load.lenient);

    let save = config.save_options();
    assert_eq!(save.format, TextgridFormat::TextgridJson);
    assert!(!save.include_blank_spaces);
    assert_eq!(save.minimum_interval_length, None);

    assert_eq!(config.pitch_params().max_pitch, 600.0);
    assert_eq!(config.praat_runner().executable(), std::path::Path::new("/opt/praat/praat"));
    assert_eq!(config.log_level, LogLevel::Trace);
    Ok(())
}

#[test]
fn test_load_or_create_withMalformedFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_save_then_load_shouldPreserveConfig() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.save.format = TextgridFormat::ShortTextgrid;
    config.load.lenient = true;
    config.praat.sample_step = 0.005;
    config.save(&path)?;

    assert_eq!(Config::load_or_create(&path)?, config);
    Ok(())
}

#[test]
fn test_validate_withBadPraatSettings_shouldFail() {
    let mut config = Config::default();
    config.praat.executable = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.praat.sample_step = 0.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.praat.max_formant = -5.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_formant_params_shouldUseSampleStep() {
    let mut config = Config::default();
    config.praat.sample_step = 0.02;
    config.praat.max_formant = 5000.0;
    let params = config.formant_params();
    assert_eq!(params.step_size, 0.02);
    assert_eq!(params.max_formant, 5000.0);
}

#[test]
fn test_log_level_display_shouldRoundTripThroughFromStr() {
    for level in [LogLevel::Error, LogLevel::Warn, LogLevel::Info, LogLevel::Debug, LogLevel::Trace] {
        assert_eq!(level.to_string().parse::<LogLevel>().unwrap(), level);
    }
}
