// Offline transcription - dominant-frequency notes from a prerecorded file
//
// The offline mode shares the estimator with the live pipeline but maps
// through the chromatic quantizer and skips the notch chain: recordings are
// made away from the amplifier, so there is no power-line hum to reject.
// Each fixed-length window yields one event; windows quieter than the 40 Hz
// floor become rests.

use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::analysis::spectral::DominantFrequencyEstimator;
use crate::mapping::{chromatic_note, Note};

/// Dominant frequencies below this are treated as silence.
pub const REST_THRESHOLD_HZ: f64 = 40.0;

/// One transcription window's worth of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum TranscriptionEvent {
    Note(Note),
    Rest,
}

impl std::fmt::Display for TranscriptionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptionEvent::Note(note) => write!(f, "{note}"),
            TranscriptionEvent::Rest => write!(f, "rest"),
        }
    }
}

/// Transcribe a WAV file into one event per `window_secs` window.
///
/// Trailing samples that do not fill a whole window are dropped, matching
/// the windowing of the live display. Multi-channel files use channel 0.
pub fn transcribe_wav<P: AsRef<Path>>(path: P, window_secs: f64) -> Result<Vec<TranscriptionEvent>> {
    let (samples, sample_rate) = load_wav(path.as_ref())?;
    Ok(transcribe_samples(&samples, sample_rate as f64, window_secs))
}

/// Windowed estimate-and-quantize over raw samples.
pub fn transcribe_samples(
    samples: &[f64],
    sample_rate_hz: f64,
    window_secs: f64,
) -> Vec<TranscriptionEvent> {
    let samples_per_window = (window_secs * sample_rate_hz) as usize;
    if samples_per_window < 2 {
        return Vec::new();
    }

    let mut estimator = DominantFrequencyEstimator::new();
    samples
        .chunks_exact(samples_per_window)
        .filter_map(|window| estimator.estimate(window, sample_rate_hz))
        .map(|hz| {
            if hz < REST_THRESHOLD_HZ {
                TranscriptionEvent::Rest
            } else {
                TranscriptionEvent::Note(chromatic_note(hz))
            }
        })
        .collect()
}

/// Read a WAV file as f64 samples from channel 0.
fn load_wav(path: &Path) -> Result<(Vec<f64>, u32)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    let sample_rate = spec.sample_rate;

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map(f64::from).map_err(|err| anyhow!(err)))
            .collect::<Result<_>>()?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            16 => reader
                .samples::<i16>()
                .map(|sample| sample.map(f64::from).map_err(|err| anyhow!(err)))
                .collect::<Result<_>>()?,
            24 | 32 => reader
                .samples::<i32>()
                .map(|sample| sample.map(f64::from).map_err(|err| anyhow!(err)))
                .collect::<Result<_>>()?,
            other => {
                return Err(anyhow!(
                    "Unsupported bits per sample {} in {}",
                    other,
                    path.display()
                ))
            }
        },
    };

    let channel0 = interleaved.iter().step_by(channels).copied().collect();
    Ok((channel0, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tone_wav(path: &Path, freq_hz: f64, fs: u32, secs: f64, channels: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: fs,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let n = (secs * fs as f64) as usize;
        for i in 0..n {
            let phase = 2.0 * std::f64::consts::PI * freq_hz * i as f64 / fs as f64;
            let value = (10_000.0 * phase.sin()) as i16;
            for _ in 0..channels {
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("spikersong-test-{name}"))
    }

    #[test]
    fn test_tone_transcribes_to_a4_per_window() {
        let path = temp_path("a440.wav");
        write_tone_wav(&path, 440.0, 8_000, 3.0, 1);

        let events = transcribe_wav(&path, 1.0).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(events.len(), 3);
        for event in events {
            assert_eq!(event.to_string(), "A4");
        }
    }

    #[test]
    fn test_silent_window_becomes_rest() {
        // One second of tone followed by one second of silence.
        let fs = 8_000.0;
        let mut samples: Vec<f64> = (0..8_000)
            .map(|i| (2.0 * std::f64::consts::PI * 220.0 * i as f64 / fs).sin())
            .collect();
        samples.extend(std::iter::repeat(0.0).take(8_000));

        let events = transcribe_samples(&samples, fs, 1.0);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].to_string(), "A3");
        assert_eq!(events[1], TranscriptionEvent::Rest);
    }

    #[test]
    fn test_partial_trailing_window_is_dropped() {
        let fs = 8_000.0;
        let samples: Vec<f64> = (0..12_000)
            .map(|i| (2.0 * std::f64::consts::PI * 440.0 * i as f64 / fs).sin())
            .collect();
        let events = transcribe_samples(&samples, fs, 1.0);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_stereo_uses_first_channel() {
        let path = temp_path("stereo.wav");
        write_tone_wav(&path, 440.0, 8_000, 1.0, 2);

        let events = transcribe_wav(&path, 1.0).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].to_string(), "A4");
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(transcribe_wav("/nonexistent/never.wav", 1.0).is_err());
    }
}
