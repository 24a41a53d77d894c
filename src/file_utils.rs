use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::io::decode_bytes;

// @module: File and directory utilities

/// `Object class = "..."` line of a Praat text file
static OBJECT_CLASS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"Object class\s*=\s*"([A-Za-z]+)"#).unwrap()
});

const AUDIO_EXTENSIONS: &[&str] = &["wav", "wave", "aif", "aiff", "flac", "mp3", "ogg"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Output path for a converted document
    // @params: input_file, output_dir, optional suffix, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        suffix: Option<&str>,
        extension: &str,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        if let Some(suffix) = suffix {
            output_filename.push('.');
            output_filename.push_str(suffix);
        }
        output_filename.push('.');
        output_filename.push_str(extension);

        output_dir.as_ref().join(output_filename)
    }

    /// Find files with one of the given extensions in a directory, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy();
                    if extensions.iter().any(|e| ext.eq_ignore_ascii_case(e.trim_start_matches('.'))) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Annotation documents below a directory: `.TextGrid` and `.json` files
    pub fn find_textgrids<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        Self::find_files(dir, &["TextGrid", "json"])
    }

    /// Read a text file, honouring UTF-8 and UTF-16 byte order marks
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        let bytes = fs::read(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))?;
        decode_bytes(&bytes).with_context(|| format!("Failed to decode file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Detect whether a file is an annotation document, a KlattGrid or audio
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow!("File does not exist: {:?}", path));
        }

        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy().to_lowercase();
            if AUDIO_EXTENSIONS.contains(&ext_str.as_str()) {
                return Ok(FileType::Audio);
            }
        }

        let bytes = fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;
        if bytes.starts_with(b"RIFF") || bytes.starts_with(b"FORM") {
            return Ok(FileType::Audio);
        }

        // Binary files that are not audio have nothing for us
        let Ok(content) = decode_bytes(&bytes) else {
            return Ok(FileType::Unknown);
        };

        Ok(Self::detect_content_type(&content))
    }

    /// Classifies already-decoded text
    pub fn detect_content_type(content: &str) -> FileType {
        let trimmed = content.trim_start();
        if trimmed.starts_with('{') {
            return FileType::Json;
        }

        match OBJECT_CLASS_REGEX.captures(content).and_then(|c| c.get(1)) {
            Some(class) if class.as_str() == "TextGrid" => FileType::TextGrid,
            Some(class) if class.as_str() == "KlattGrid" => FileType::KlattGrid,
            _ => FileType::Unknown,
        }
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FileType {
    /// Praat TextGrid in either text form
    TextGrid,
    /// Praat KlattGrid
    KlattGrid,
    /// One of the JSON annotation forms
    Json,
    /// Audio recording
    Audio,
    /// Unknown file type
    Unknown,
}
