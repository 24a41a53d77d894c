/*!
 * Tests for error messages and conversions
 */

use std::path::PathBuf;
use tiergrid::errors::{AppError, AudioError, ExternalToolError, TextgridError};

#[test]
fn test_textgrid_error_display_shouldDescribeProblem() {
    assert_eq!(TextgridError::TierNotFound("words".to_string()).to_string(), "Tier not found: words");
    assert_eq!(TextgridError::DuplicateTierName("Mary".to_string()).to_string(), "Duplicate tier name: 'Mary'");

    let incompatible = TextgridError::IncompatibleTier {
        name: "tones".to_string(),
        expected: "IntervalTier".to_string(),
        found: "TextTier".to_string(),
    };
    assert_eq!(
        incompatible.to_string(),
        "Tier 'tones' has the wrong kind: expected IntervalTier, found TextTier"
    );
}

#[test]
fn test_audio_error_display_shouldIncludeDetails() {
    assert_eq!(AudioError::NotMono(2).to_string(), "Audio must be mono, found 2 channels");
    assert_eq!(AudioError::InvalidRange { start: 1.5, end: 0.5 }.to_string(), "Invalid audio range: 1.5 - 0.5");
}

#[test]
fn test_external_tool_error_display_shouldIncludeStderr() {
    let error = ExternalToolError::Failed {
        command: "praat --run pitch.praat".to_string(),
        status: Some(1),
        stdout: String::new(),
        stderr: "Sound not found".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("praat --run pitch.praat"));
    assert!(message.contains("Sound not found"));
    assert!(ExternalToolError::NotFound(PathBuf::from("praat")).to_string().contains("praat"));
}

#[test]
fn test_app_error_from_shouldWrapEachSource() {
    let error: AppError = TextgridError::Collision("a and b".to_string()).into();
    assert!(matches!(error, AppError::Textgrid(TextgridError::Collision(_))));

    let error: AppError = AudioError::NotMono(6).into();
    assert!(matches!(error, AppError::Audio(AudioError::NotMono(6))));

    let error: AppError = ExternalToolError::OutputParse("bad row".to_string()).into();
    assert!(matches!(error, AppError::ExternalTool(_)));

    let error: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(error, AppError::File(ref message) if message == "gone"));

    let error: AppError = anyhow::anyhow!("something odd").into();
    assert_eq!(error.to_string(), "Unknown error: something odd");
}

#[test]
fn test_app_error_withAnyhow_shouldKeepTypedSource() {
    let error = anyhow::Error::from(AppError::Config("bad pitch range".to_string()));
    assert!(matches!(error.downcast_ref::<AppError>(), Some(AppError::Config(_))));
}
