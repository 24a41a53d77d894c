/*!
 * Audio collaborator.
 *
 * The annotation model only needs three things from audio: its duration, the
 * samples in a time range and the nearest zero crossing to a time. `AudioSource`
 * captures that; `SampleBuffer` implements it over samples in memory and
 * `WavAudio` loads a mono WAV file into one using the hound crate.
 */

use std::path::Path;

use log::debug;

use crate::errors::AudioError;

/// Step by which the zero-crossing search widens around the target time
pub const ZERO_CROSSING_STEP: f64 = 0.002;

/// What edit operations need from a recording
pub trait AudioSource {
    /// Length of the recording in seconds
    fn duration(&self) -> f64;

    /// Samples between `start` and `end` seconds, normalized to [-1, 1]
    fn get_frames(&self, start: f64, end: f64) -> Result<Vec<f64>, AudioError>;

    /// Time of the sample nearest `time` where the waveform changes sign,
    /// searching at most `search_window` seconds either side
    fn find_nearest_zero_crossing(&self, time: f64, search_window: f64) -> Option<f64>;
}

/// Mono samples held in memory
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn index_of(&self, time: f64) -> usize {
        ((time * self.sample_rate as f64).round().max(0.0) as usize).min(self.samples.len())
    }

    fn time_of(&self, index: usize) -> f64 {
        index as f64 / self.sample_rate as f64
    }

    /// The crossing closest to `time` among samples `[first, last]`, if any
    fn crossing_between(&self, time: f64, first: usize, last: usize) -> Option<f64> {
        if last <= first || last >= self.samples.len() {
            return None;
        }
        (first..last)
            .filter(|&i| (self.samples[i] > 0.0) != (self.samples[i + 1] > 0.0))
            .map(|i| {
                // the quieter sample of the pair is the crossing
                if self.samples[i].abs() <= self.samples[i + 1].abs() { i } else { i + 1 }
            })
            .map(|i| self.time_of(i))
            .min_by(|a, b| (a - time).abs().total_cmp(&(b - time).abs()).then(a.total_cmp(b)))
    }
}

impl AudioSource for SampleBuffer {
    fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    fn get_frames(&self, start: f64, end: f64) -> Result<Vec<f64>, AudioError> {
        if start < 0.0 || end <= start || end > self.duration() + 1.0 / self.sample_rate as f64 {
            return Err(AudioError::InvalidRange { start, end });
        }
        Ok(self.samples[self.index_of(start)..self.index_of(end)].to_vec())
    }

    fn find_nearest_zero_crossing(&self, time: f64, search_window: f64) -> Option<f64> {
        if self.samples.len() < 2 {
            return None;
        }
        let last_index = self.samples.len() - 1;

        // widen the search in small steps so a close crossing is found without scanning the window
        let mut radius = ZERO_CROSSING_STEP.min(search_window);
        loop {
            let first = self.index_of((time - radius).max(0.0));
            let last = self.index_of(time + radius).min(last_index);
            if let Some(crossing) = self.crossing_between(time, first, last) {
                return Some(crossing);
            }
            if radius >= search_window {
                return None;
            }
            radius = (radius + ZERO_CROSSING_STEP).min(search_window);
        }
    }
}

/// A mono WAV recording loaded into memory
#[derive(Debug, Clone)]
pub struct WavAudio {
    buffer: SampleBuffer,
    spec: hound::WavSpec,
}

impl WavAudio {
    /// Reads a mono WAV file, normalizing integer samples to [-1, 1]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AudioError> {
        let reader = hound::WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        if spec.channels != 1 {
            return Err(AudioError::NotMono(spec.channels));
        }

        let samples: Vec<f64> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .map(|s| s.map(|v| v as f64))
                .collect::<Result<Vec<f64>, _>>()?,
            hound::SampleFormat::Int => {
                let max_val = (1i64 << (spec.bits_per_sample - 1)) as f64;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f64 / max_val))
                    .collect::<Result<Vec<f64>, _>>()?
            }
        };

        debug!("Loaded {} samples at {} Hz from {:?}", samples.len(), spec.sample_rate, path.as_ref());
        Ok(Self { buffer: SampleBuffer::new(samples, spec.sample_rate), spec })
    }

    pub fn spec(&self) -> hound::WavSpec {
        self.spec
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Writes `[start, end]` to a new WAV file with the same format
    pub fn extract_segment<P: AsRef<Path>>(&self, start: f64, end: f64, output: P) -> Result<(), AudioError> {
        let frames = self.get_frames(start, end)?;
        write_samples(output.as_ref(), self.spec, &frames)
    }
}

impl AudioSource for WavAudio {
    fn duration(&self) -> f64 {
        self.buffer.duration()
    }

    fn get_frames(&self, start: f64, end: f64) -> Result<Vec<f64>, AudioError> {
        self.buffer.get_frames(start, end)
    }

    fn find_nearest_zero_crossing(&self, time: f64, search_window: f64) -> Option<f64> {
        self.buffer.find_nearest_zero_crossing(time, search_window)
    }
}

/// Writes normalized samples as a WAV file in the format described by `spec`
pub fn write_samples(path: &Path, spec: hound::WavSpec, samples: &[f64]) -> Result<(), AudioError> {
    let mut writer = hound::WavWriter::create(path, spec)?;
    match spec.sample_format {
        hound::SampleFormat::Float => {
            for &sample in samples {
                writer.write_sample(sample as f32)?;
            }
        }
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f64;
            for &sample in samples {
                let value = (sample * max_val).round().clamp(-max_val, max_val - 1.0);
                writer.write_sample(value as i32)?;
            }
        }
    }
    writer.finalize()?;
    Ok(())
}
