/*!
 * External phonetic analysis through Praat.
 *
 * `AcousticAnalyzer` is what the rest of the crate expects from an analysis
 * backend. `PraatRunner` implements it by writing a bundled Praat script to a
 * temporary file, running `praat --run script args...` and reading back the
 * CSV the script writes. Praat prints undefined measurements as
 * `--undefined--`; such rows are skipped unless a substitute value is set.
 */

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, error, warn};

use crate::errors::ExternalToolError;

type Result<T> = std::result::Result<T, ExternalToolError>;

const PITCH_INTENSITY_SCRIPT: &str = r#"form Pitch and intensity
    sentence Input_file
    sentence Output_file
    real Sample_step 0.01
    real Min_pitch 75
    real Max_pitch 450
    real Silence_threshold 0.03
endform

sound = Read from file: input_file$
duration = Get total duration
pitch = To Pitch (ac): 0, min_pitch, 15, "no", silence_threshold, 0.45, 0.01, 0.35, 0.14, max_pitch
selectObject: sound
intensity = To Intensity: min_pitch, 0, "yes"

writeFileLine: output_file$, "time,pitch,intensity"
time = sample_step
while time < duration
    selectObject: pitch
    f0 = Get value at time: time, "Hertz", "Linear"
    selectObject: intensity
    db = Get value at time: time, "Cubic"
    appendFileLine: output_file$, fixed$(time, 4), ",", f0, ",", db
    time = time + sample_step
endwhile
"#;

const FORMANTS_SCRIPT: &str = r#"form Formants
    sentence Input_file
    sentence Output_file
    real Step_size 0.01
    real Max_formant 5500
    real Window_length 0.025
    real Pre_emphasis 50
endform

sound = Read from file: input_file$
duration = Get total duration
formant = To Formant (burg): step_size, 5, max_formant, window_length, pre_emphasis

writeFileLine: output_file$, "time,f1,f2,f3"
time = step_size
while time < duration
    f1 = Get value at time: 1, time, "hertz", "Linear"
    f2 = Get value at time: 2, time, "hertz", "Linear"
    f3 = Get value at time: 3, time, "hertz", "Linear"
    appendFileLine: output_file$, fixed$(time, 4), ",", f1, ",", f2, ",", f3
    time = time + step_size
endwhile
"#;

/// Parameters of a pitch and intensity track
#[derive(Debug, Clone, PartialEq)]
pub struct PitchParams {
    pub sample_step: f64,
    pub min_pitch: f64,
    pub max_pitch: f64,
    pub silence_threshold: f64,
}

impl Default for PitchParams {
    fn default() -> Self {
        Self { sample_step: 0.01, min_pitch: 75.0, max_pitch: 450.0, silence_threshold: 0.03 }
    }
}

/// Parameters of a formant track
#[derive(Debug, Clone, PartialEq)]
pub struct FormantParams {
    pub step_size: f64,
    // @field: 5500 for female voices, 5000 for male voices
    pub max_formant: f64,
    pub window_length: f64,
    pub pre_emphasis: f64,
}

impl Default for FormantParams {
    fn default() -> Self {
        Self { step_size: 0.01, max_formant: 5500.0, window_length: 0.025, pre_emphasis: 50.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchIntensity {
    pub time: f64,
    pub pitch: f64,
    pub intensity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormantFrame {
    pub time: f64,
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
}

/// A backend that measures acoustic properties of a recording
pub trait AcousticAnalyzer {
    fn extract_pitch_intensity(&self, audio: &Path, params: &PitchParams) -> Result<Vec<PitchIntensity>>;

    fn extract_formants(&self, audio: &Path, params: &FormantParams) -> Result<Vec<FormantFrame>>;
}

/// Runs Praat scripts as subprocesses
#[derive(Debug, Clone)]
pub struct PraatRunner {
    executable: PathBuf,
    undefined_value: Option<f64>,
}

impl PraatRunner {
    pub fn new<P: Into<PathBuf>>(executable: P) -> Self {
        Self { executable: executable.into(), undefined_value: None }
    }

    /// Substitute for undefined measurements instead of skipping their rows
    pub fn with_undefined_value(mut self, value: f64) -> Self {
        self.undefined_value = Some(value);
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Runs `praat --run script args...`, returning standard output
    pub fn run_script(&self, script: &Path, args: &[String]) -> Result<String> {
        if !script.exists() {
            return Err(ExternalToolError::NotFound(script.to_path_buf()));
        }

        let command = format!("{} --run {} {}", self.executable.display(), script.display(), args.join(" "));
        debug!("Running {}", command);

        let output = Command::new(&self.executable)
            .arg("--run")
            .arg(script)
            .args(args)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ExternalToolError::NotFound(self.executable.clone()),
                _ => ExternalToolError::Io(e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            error!("Praat failed: {}", stderr.trim());
            return Err(ExternalToolError::Failed { command, status: output.status.code(), stdout, stderr });
        }
        Ok(stdout)
    }

    /// Writes a bundled script to a temporary file and runs it
    fn run_bundled(&self, source: &str, args: &[String]) -> Result<String> {
        let mut script = tempfile::Builder::new().prefix("tiergrid_").suffix(".praat").tempfile()?;
        script.write_all(source.as_bytes())?;
        script.flush()?;
        self.run_script(script.path(), args)
    }

    /// Runs a bundled analysis script that writes CSV to its second argument
    fn analyze(&self, source: &str, audio: &Path, params: &[f64]) -> Result<Vec<Vec<f64>>> {
        if !audio.exists() {
            return Err(ExternalToolError::NotFound(audio.to_path_buf()));
        }
        let output_dir = tempfile::tempdir()?;
        let output = output_dir.path().join("measures.csv");

        let mut args = vec![path_arg(audio)?, path_arg(&output)?];
        args.extend(params.iter().map(|p| p.to_string()));
        self.run_bundled(source, &args)?;

        load_time_series(&output, self.undefined_value)
    }
}

impl AcousticAnalyzer for PraatRunner {
    fn extract_pitch_intensity(&self, audio: &Path, params: &PitchParams) -> Result<Vec<PitchIntensity>> {
        let rows = self.analyze(
            PITCH_INTENSITY_SCRIPT,
            audio,
            &[params.sample_step, params.min_pitch, params.max_pitch, params.silence_threshold],
        )?;
        rows.into_iter()
            .map(|row| match row.as_slice() {
                &[time, pitch, intensity] => Ok(PitchIntensity { time, pitch, intensity }),
                other => Err(ExternalToolError::OutputParse(format!("expected 3 columns, found {}", other.len()))),
            })
            .collect()
    }

    fn extract_formants(&self, audio: &Path, params: &FormantParams) -> Result<Vec<FormantFrame>> {
        let rows = self.analyze(
            FORMANTS_SCRIPT,
            audio,
            &[params.step_size, params.max_formant, params.window_length, params.pre_emphasis],
        )?;
        rows.into_iter()
            .map(|row| match row.as_slice() {
                &[time, f1, f2, f3] => Ok(FormantFrame { time, f1, f2, f3 }),
                other => Err(ExternalToolError::OutputParse(format!("expected 4 columns, found {}", other.len()))),
            })
            .collect()
    }
}

fn path_arg(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| ExternalToolError::OutputParse(format!("path {:?} is not valid UTF-8", path)))
}

/// Reads a CSV time series written by an analysis script
pub fn load_time_series(path: &Path, undefined_value: Option<f64>) -> Result<Vec<Vec<f64>>> {
    let data = fs::read_to_string(path)?;
    parse_time_series(&data, undefined_value)
}

/// Parses `time,value,...` rows, skipping a leading `time` header.
///
/// A value containing `--` is undefined: it becomes `undefined_value` when set,
/// otherwise the whole row is dropped.
pub fn parse_time_series(data: &str, undefined_value: Option<f64>) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (line_number, line) in data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || (line_number == 0 && line.starts_with("time")) {
            continue;
        }

        let mut row = Vec::new();
        let mut undefined = false;
        for field in line.split(',').map(str::trim) {
            if field.contains("--") {
                match undefined_value {
                    Some(value) => row.push(value),
                    None => {
                        undefined = true;
                        break;
                    }
                }
            } else {
                let value = field.parse::<f64>().map_err(|_| {
                    ExternalToolError::OutputParse(format!("line {}: '{}' is not a number", line_number + 1, field))
                })?;
                row.push(value);
            }
        }

        if undefined {
            skipped += 1;
        } else {
            rows.push(row);
        }
    }

    if skipped > 0 {
        warn!("Skipped {} rows with undefined values", skipped);
    }
    Ok(rows)
}
