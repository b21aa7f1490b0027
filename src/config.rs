//! Configuration for the acquisition and sonification pipeline
//!
//! Runtime configuration is loaded from a JSON file so session parameters
//! (serial port, window sizes, notch chain, participant range) can be
//! adjusted without recompilation. Missing or invalid files fall back to
//! defaults with a warning.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::notch::{DEFAULT_NOTCH_FREQUENCIES_HZ, SIGNAL_SAMPLING_RATE_HZ};

/// Session operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Record the participant's frequency range; no sound is produced.
    Calibration,
    /// Map estimates onto the calibrated range and play notes.
    Performance,
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub acquisition: AcquisitionConfig,
    pub filter: FilterConfig,
    pub mapping: MappingConfig,
    pub offline: OfflineConfig,
}

/// Byte-source and windowing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Serial device the amplifier is attached to.
    pub com_port: String,
    pub baud_rate: u32,
    /// Bytes requested per acquisition cycle; 20000 bytes covers 1 second.
    pub chunk_size_samples: usize,
    /// Session length in seconds; `None` runs until cancelled.
    pub total_session_secs: Option<f64>,
    /// Width of the rolling display/analysis window in seconds.
    pub display_window_secs: f64,
}

impl AcquisitionConfig {
    /// Wire rate of the amplifier: 20000 bytes per second.
    pub const BYTES_PER_SECOND: f64 = 20_000.0;

    /// Duration of one acquisition chunk, also used as the read timeout.
    pub fn chunk_secs(&self) -> f64 {
        self.chunk_size_samples as f64 / Self::BYTES_PER_SECOND
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            com_port: "/dev/ttyUSB0".to_string(),
            baud_rate: 230_400,
            chunk_size_samples: 20_000,
            total_session_secs: None,
            display_window_secs: 10.0,
        }
    }
}

/// Notch chain parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Center frequencies to reject, applied in order.
    pub notch_frequencies_hz: Vec<f64>,
    /// Sampling rate the filters and the estimator assume.
    pub sampling_rate_hz: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            notch_frequencies_hz: DEFAULT_NOTCH_FREQUENCIES_HZ.to_vec(),
            sampling_rate_hz: SIGNAL_SAMPLING_RATE_HZ,
        }
    }
}

/// Frequency-to-note mapping parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    pub mode: Mode,
    /// Participant baseline from a prior calibration run.
    pub participant_min_hz: f64,
    pub participant_max_hz: f64,
    /// Instrument passed through to the sonification collaborator.
    pub instrument_id: u32,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Performance,
            participant_min_hz: 10.0,
            participant_max_hz: 170.0,
            instrument_id: 1,
        }
    }
}

/// Offline WAV transcription parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineConfig {
    /// Length of each transcription window in seconds.
    pub window_secs: f64,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self { window_secs: 1.0 }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            acquisition: AcquisitionConfig::default(),
            filter: FilterConfig::default(),
            mapping: MappingConfig::default(),
            offline: OfflineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file is missing or malformed.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.acquisition.chunk_size_samples, 20_000);
        assert_eq!(config.acquisition.display_window_secs, 10.0);
        assert_eq!(config.filter.notch_frequencies_hz, vec![60.06, 299.0, 59.8]);
        assert_eq!(config.filter.sampling_rate_hz, 10_000.0);
        assert_eq!(config.mapping.mode, Mode::Performance);
        assert_eq!(config.offline.window_secs, 1.0);
    }

    #[test]
    fn test_chunk_secs() {
        let mut acq = AcquisitionConfig::default();
        assert_eq!(acq.chunk_secs(), 1.0);
        acq.chunk_size_samples = 10_000;
        assert_eq!(acq.chunk_secs(), 0.5);
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.acquisition.baud_rate, config.acquisition.baud_rate);
        assert_eq!(back.mapping.mode, config.mapping.mode);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/spikersong.json");
        assert_eq!(config.acquisition.chunk_size_samples, 20_000);
    }

    #[test]
    fn test_mode_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Calibration).unwrap(), "\"calibration\"");
        assert_eq!(serde_json::to_string(&Mode::Performance).unwrap(), "\"performance\"");
    }
}
