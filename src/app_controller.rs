use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::audio::WavAudio;
use crate::errors::AppError;
use crate::file_utils::{FileManager, FileType};
use crate::io::{self, TextgridFormat};
use crate::klattgrid::{Klattgrid, KlattTier};
use crate::praat::{AcousticAnalyzer, PitchIntensity};
use crate::textgrid::{CropMode, ShiftMode, Textgrid, Tier};

// @module: Application controller for annotation workflows

/// Outcome of a batch conversion
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConvertSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller running the command line workflows
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reads a document in whatever dialect it is written in
    pub fn load_textgrid(&self, path: &Path) -> Result<Textgrid> {
        let content = FileManager::read_to_string(path)?;
        io::parse_textgrid(&content, &self.config.load_options())
            .with_context(|| format!("Failed to load textgrid: {}", path.display()))
    }

    /// Writes a document with the configured save options, optionally overriding the format
    pub fn save_textgrid(&self, textgrid: &Textgrid, path: &Path, format: Option<TextgridFormat>) -> Result<()> {
        let mut options = self.config.save_options();
        if let Some(format) = format {
            options.format = format;
        }
        let content = io::textgrid_to_string(textgrid, &options)
            .with_context(|| format!("Failed to serialize textgrid for {}", path.display()))?;
        FileManager::write_to_file(path, &content)
    }

    /// Converts one file, returning `None` when the output exists and is kept
    pub fn convert_file(
        &self,
        input_file: &Path,
        output_dir: Option<&Path>,
        format: TextgridFormat,
        force_overwrite: bool,
    ) -> Result<Option<PathBuf>> {
        let output_dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input_file.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let output_path = FileManager::generate_output_path(input_file, &output_dir, Some(format.as_str()), format.extension());

        if output_path.exists() && !force_overwrite {
            warn!("Skipping {}, output already exists (use -f to force overwrite)", output_path.display());
            return Ok(None);
        }

        let textgrid = self.load_textgrid(input_file)?;
        self.save_textgrid(&textgrid, &output_path, Some(format))?;
        debug!("Converted {} to {}", input_file.display(), output_path.display());
        Ok(Some(output_path))
    }

    /// Converts a file, or every document below a directory
    pub fn convert(
        &self,
        input: &Path,
        output_dir: Option<&Path>,
        format: TextgridFormat,
        force_overwrite: bool,
    ) -> Result<ConvertSummary> {
        if FileManager::dir_exists(input) {
            return self.convert_folder(input, output_dir, format, force_overwrite);
        }
        if !FileManager::file_exists(input) {
            return Err(anyhow!("Input file does not exist: {:?}", input));
        }

        let mut summary = ConvertSummary::default();
        match self.convert_file(input, output_dir, format, force_overwrite)? {
            Some(path) => {
                info!("Wrote {}", path.display());
                summary.converted += 1;
            }
            None => summary.skipped += 1,
        }
        Ok(summary)
    }

    /// Run the conversion in folder mode; a failing file is logged and counted, not fatal
    pub fn convert_folder(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
        format: TextgridFormat,
        force_overwrite: bool,
    ) -> Result<ConvertSummary> {
        let start_time = std::time::Instant::now();

        let files = FileManager::find_textgrids(input_dir)?;
        if files.is_empty() {
            return Err(anyhow!("No textgrid files found in directory: {:?}", input_dir));
        }

        let progress = ProgressBar::new(files.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style.progress_chars("=>-"));

        let mut summary = ConvertSummary::default();
        for file in &files {
            let file_name = file.file_name().map(|f| f.to_string_lossy().to_string()).unwrap_or_else(|| "unknown".to_string());
            progress.set_message(format!("Processing: {}", file_name));

            // a converted file must not be picked up again as an input
            if let Some(dir) = output_dir {
                if file.starts_with(dir) {
                    progress.inc(1);
                    continue;
                }
            }

            match self.convert_file(file, output_dir, format, force_overwrite) {
                Ok(Some(_)) => summary.converted += 1,
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.failed += 1;
                }
            }
            progress.inc(1);
        }
        progress.finish_with_message("Folder processing complete");

        info!(
            "Folder processing completed in {:.1}s: {} converted, {} skipped, {} errors",
            start_time.elapsed().as_secs_f64(),
            summary.converted,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }

    /// Human readable summary of a TextGrid or KlattGrid file
    pub fn describe(&self, input: &Path) -> Result<String> {
        match FileManager::detect_file_type(input)? {
            FileType::TextGrid | FileType::Json => {
                let textgrid = self.load_textgrid(input)?;
                Ok(Self::describe_textgrid(&textgrid))
            }
            FileType::KlattGrid => {
                let content = FileManager::read_to_string(input)?;
                let klattgrid = Klattgrid::parse(&content)
                    .with_context(|| format!("Failed to load klattgrid: {}", input.display()))?;
                Ok(Self::describe_klattgrid(&klattgrid))
            }
            other => Err(anyhow!("Not an annotation file ({:?}): {}", other, input.display())),
        }
    }

    pub fn describe_textgrid(textgrid: &Textgrid) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "TextGrid {} to {} ({} tiers)",
            textgrid.min_time(),
            textgrid.max_time(),
            textgrid.len()
        );
        for tier in textgrid.tiers() {
            let labelled = match tier {
                Tier::Interval(t) => t.entries().iter().filter(|e| !e.label.trim().is_empty()).count(),
                Tier::Point(t) => t.entries().iter().filter(|p| !p.label.trim().is_empty()).count(),
            };
            let _ = writeln!(
                out,
                "  {} '{}' [{}, {}]: {} entries, {} labelled",
                tier.kind().class_name(),
                tier.name(),
                tier.min_time(),
                tier.max_time(),
                tier.len(),
                labelled
            );
        }
        out
    }

    pub fn describe_klattgrid(klattgrid: &Klattgrid) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "KlattGrid {} to {} ({} tiers)", klattgrid.min_time(), klattgrid.max_time(), klattgrid.tiers().len());
        for tier in klattgrid.tiers() {
            let _ = match tier {
                KlattTier::Section { name, .. } => writeln!(out, "  section '{}'", name),
                KlattTier::Point(t) => writeln!(out, "  point tier '{}': {} points", t.name(), t.points().len()),
                KlattTier::Container(c) => writeln!(
                    out,
                    "  container '{}': {}",
                    c.name(),
                    c.intermediates().iter().map(|i| format!("{} ({} tiers)", i.name(), i.tiers().len())).collect::<Vec<_>>().join(", ")
                ),
            };
        }
        out
    }

    /// Checks a file against every document invariant without repairing it
    pub fn validate(&self, input: &Path) -> Result<()> {
        let content = FileManager::read_to_string(input)?;
        let mut options = self.config.load_options();
        options.lenient = false;
        let textgrid = io::parse_textgrid(&content, &options)
            .with_context(|| format!("Invalid textgrid: {}", input.display()))?;
        textgrid.validate().with_context(|| format!("Invalid textgrid: {}", input.display()))?;
        info!("{} is valid ({} tiers)", input.display(), textgrid.len());
        Ok(())
    }

    /// Where a single-file edit writes when no output path is given
    fn edit_output(&self, input: &Path, output: Option<&Path>, suffix: &str) -> PathBuf {
        match output {
            Some(path) => path.to_path_buf(),
            None => {
                let dir = input.parent().map(Path::to_path_buf).unwrap_or_default();
                FileManager::generate_output_path(input, dir, Some(suffix), self.config.save.format.extension())
            }
        }
    }

    pub fn crop(
        &self,
        input: &Path,
        output: Option<&Path>,
        start: f64,
        end: f64,
        mode: CropMode,
        rebase_to_zero: bool,
    ) -> Result<PathBuf> {
        let textgrid = self.load_textgrid(input)?;
        let cropped = textgrid.crop(start, end, mode, rebase_to_zero).context("Crop failed")?;
        let output = self.edit_output(input, output, "cropped");
        self.save_textgrid(&cropped, &output, None)?;
        info!("Cropped {} to [{}, {}] into {}", input.display(), start, end, output.display());
        Ok(output)
    }

    pub fn shift(&self, input: &Path, output: Option<&Path>, offset: f64, mode: ShiftMode) -> Result<PathBuf> {
        let textgrid = self.load_textgrid(input)?;
        let shifted = textgrid.edit_timestamps(offset, mode).context("Shift failed")?;
        let output = self.edit_output(input, output, "shifted");
        self.save_textgrid(&shifted, &output, None)?;
        info!("Shifted {} by {}s into {}", input.display(), offset, output.display());
        Ok(output)
    }

    pub fn dejitter(&self, input: &Path, output: Option<&Path>, reference_tier: &str, max_distance: f64) -> Result<PathBuf> {
        let textgrid = self.load_textgrid(input)?;
        let snapped = textgrid.dejitter(reference_tier, max_distance).context("Dejitter failed")?;
        let output = self.edit_output(input, output, "dejittered");
        self.save_textgrid(&snapped, &output, None)?;
        info!("Snapped boundaries of {} onto '{}' into {}", input.display(), reference_tier, output.display());
        Ok(output)
    }

    /// Moves every boundary to the nearest zero crossing of a mono WAV recording
    pub fn snap_to_zero_crossings(
        &self,
        input: &Path,
        audio: &Path,
        output: Option<&Path>,
        search_window: f64,
    ) -> Result<PathBuf> {
        let textgrid = self.load_textgrid(input)?;
        let audio = WavAudio::open(audio).map_err(AppError::from).with_context(|| format!("Failed to open audio: {}", audio.display()))?;
        let snapped = textgrid.to_zero_crossings(&audio, search_window).context("Zero crossing alignment failed")?;
        let output = self.edit_output(input, output, "snapped");
        self.save_textgrid(&snapped, &output, None)?;
        info!("Snapped boundaries of {} to zero crossings into {}", input.display(), output.display());
        Ok(output)
    }

    /// Measures pitch and intensity, writing CSV when an output path is given
    pub fn pitch<A: AcousticAnalyzer>(&self, analyzer: &A, audio: &Path, output: Option<&Path>) -> Result<Vec<PitchIntensity>> {
        let measures = self.measure_pitch(analyzer, audio)?;
        if let Some(output) = output {
            let mut csv = String::from("time,pitch,intensity\n");
            for m in &measures {
                let _ = writeln!(csv, "{},{},{}", m.time, m.pitch, m.intensity);
            }
            FileManager::write_to_file(output, &csv)?;
            info!("Wrote {} measurements to {}", measures.len(), output.display());
        }
        Ok(measures)
    }

    fn measure_pitch<A: AcousticAnalyzer>(&self, analyzer: &A, audio: &Path) -> std::result::Result<Vec<PitchIntensity>, AppError> {
        if !FileManager::file_exists(audio) {
            return Err(AppError::File(format!("Audio file does not exist: {}", audio.display())));
        }
        let params = self.config.pitch_params();
        if params.max_pitch <= params.min_pitch {
            return Err(AppError::Config(format!("Invalid pitch range {} to {}", params.min_pitch, params.max_pitch)));
        }
        Ok(analyzer.extract_pitch_intensity(audio, &params)?)
    }
}
