// SessionController - acquire -> decode -> buffer -> filter -> estimate -> map
//
// The controller owns every piece of pipeline state (rolling buffer,
// estimator, calibration accumulator) and drives one synchronous cycle at a
// time, so estimates are always computed on a fully updated buffer. The
// collaborators at the edges (byte source, sonification, display) are traits;
// the core treats them as opaque. Cancellation is cooperative: a token is
// checked at the top of every cycle and the byte source is closed on every
// exit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::analysis::notch::{apply_chain, NOTCH_Q};
use crate::analysis::spectral::DominantFrequencyEstimator;
use crate::analysis::FilterSpec;
use crate::buffer::RollingBuffer;
use crate::config::{AppConfig, Mode};
use crate::decode::decode_frames;
use crate::error::{log_session_error, AcquisitionError, SessionError};
use crate::mapping::{map_performance, CalibrationRange, Note};

/// Pause inserted when an estimate falls outside the participant range,
/// avoiding audio chatter between silent cycles.
pub const SILENCE_REST: Duration = Duration::from_millis(500);

/// Opaque byte source: serial line, socket, file replay - anything that can
/// hand over up to `n` bytes within a timeout.
pub trait ByteSource {
    /// Read up to `n` bytes; fewer (or none) may arrive on timeout.
    fn read(&mut self, n: usize) -> std::io::Result<Vec<u8>>;

    fn is_open(&self) -> bool;

    fn close(&mut self);

    /// Hint for transports that support read timeouts; the controller sets
    /// this to the chunk duration.
    fn set_timeout(&mut self, _timeout: Duration) {}
}

/// Sonification collaborator; calls are fire-and-forget.
pub trait NotePlayer {
    fn play(&mut self, note: Note, instrument: u32);
    fn rest(&mut self, duration: Duration);
}

/// Display collaborator, called once per cycle. Failures are logged and
/// swallowed; rendering never aborts the pipeline.
pub trait WaveformDisplay {
    fn render(
        &mut self,
        time_axis: &[f64],
        samples: &[f64],
    ) -> Result<(), Box<dyn std::error::Error>>;
}

/// No-op display for headless runs and tests.
#[derive(Debug, Default)]
pub struct NullDisplay;

impl WaveformDisplay for NullDisplay {
    fn render(&mut self, _: &[f64], _: &[f64]) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}

/// Cooperative cancellation token, settable from an interrupt handler.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Observable output of one pipeline cycle.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CycleOutput {
    /// Dominant frequency of the filtered analysis slice, in Hz.
    pub raw_hz: f64,
    /// Frequency rescaled onto C1..C5; empty in calibration mode and for
    /// out-of-range estimates.
    pub rescaled_hz: Option<f64>,
    /// Note for this cycle; empty whenever `rescaled_hz` is.
    pub note: Option<Note>,
}

/// Summary returned when the run loop ends.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub cycles: usize,
    /// Accumulated participant range; `Some` only for calibration sessions.
    pub calibration: Option<CalibrationRange>,
}

pub struct SessionController<S, P, D> {
    source: S,
    player: P,
    display: D,
    config: AppConfig,
    cancel: CancellationToken,
    buffer: RollingBuffer,
    estimator: DominantFrequencyEstimator,
    range: CalibrationRange,
    specs: Vec<FilterSpec>,
}

impl<S, P, D> SessionController<S, P, D>
where
    S: ByteSource,
    P: NotePlayer,
    D: WaveformDisplay,
{
    pub fn new(
        source: S,
        player: P,
        display: D,
        config: AppConfig,
        cancel: CancellationToken,
    ) -> Self {
        let chunk_secs = config.acquisition.chunk_secs();
        let buffer = RollingBuffer::new(chunk_secs, config.acquisition.display_window_secs);
        let specs = config
            .filter
            .notch_frequencies_hz
            .iter()
            .map(|&center_hz| FilterSpec {
                center_hz,
                q: NOTCH_Q,
                sampling_rate_hz: config.filter.sampling_rate_hz,
            })
            .collect();

        Self {
            source,
            player,
            display,
            config,
            cancel,
            buffer,
            estimator: DominantFrequencyEstimator::new(),
            range: CalibrationRange::new(),
            specs,
        }
    }

    /// Drive the pipeline until cancellation, source exhaustion, a transport
    /// failure, or the configured session length. The source is closed on
    /// every exit path.
    pub fn run(
        mut self,
        mut on_cycle: impl FnMut(&CycleOutput),
    ) -> Result<SessionReport, SessionError> {
        if !self.source.is_open() {
            return Err(AcquisitionError::Unavailable {
                source: self.config.acquisition.com_port.clone(),
                details: "source not open at session start".to_string(),
            }
            .into());
        }

        let chunk_secs = self.config.acquisition.chunk_secs();
        self.source.set_timeout(Duration::from_secs_f64(chunk_secs));

        let max_cycles = self
            .config
            .acquisition
            .total_session_secs
            .map(|total| (total / chunk_secs).floor() as usize);

        let result = self.run_loop(max_cycles, &mut on_cycle);
        self.source.close();
        tracing::info!("Acquisition source closed");

        if let Err(ref err) = result {
            log_session_error(err, "run loop");
        }
        result.map(|cycles| SessionReport {
            cycles,
            calibration: matches!(self.config.mapping.mode, Mode::Calibration)
                .then_some(self.range),
        })
    }

    fn run_loop(
        &mut self,
        max_cycles: Option<usize>,
        on_cycle: &mut impl FnMut(&CycleOutput),
    ) -> Result<usize, SessionError> {
        let mut cycles = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Cancellation requested, ending session after {cycles} cycles");
                break;
            }
            if max_cycles.is_some_and(|max| cycles >= max) {
                tracing::info!("Configured session length reached ({cycles} cycles)");
                break;
            }
            if !self.source.is_open() {
                tracing::info!("Byte source exhausted after {cycles} cycles");
                break;
            }

            let bytes = self
                .source
                .read(self.config.acquisition.chunk_size_samples)
                .map_err(AcquisitionError::from)?;
            cycles += 1;

            if let Some(output) = self.cycle(&bytes)? {
                on_cycle(&output);
            }
        }

        Ok(cycles)
    }

    /// One acquisition cycle. Returns `None` when the window is still too
    /// small to estimate from.
    fn cycle(&mut self, bytes: &[u8]) -> Result<Option<CycleOutput>, SessionError> {
        let decoded = decode_frames(bytes);
        if bytes.len() / 2 > decoded.len() + 1 {
            // Resynchronisation discarded bytes; normal at read boundaries.
            tracing::debug!(
                "Decode underrun: {} bytes yielded {} samples",
                bytes.len(),
                decoded.len()
            );
        }

        let chunk: Vec<f64> = decoded.iter().map(|&s| s as f64).collect();
        self.buffer.append(&chunk);

        if let Err(err) = self
            .display
            .render(&self.buffer.time_axis(), self.buffer.snapshot())
        {
            tracing::warn!("Display render failed (ignored): {err}");
        }

        let slice = self.buffer.analysis_slice();
        if slice.len() < 2 {
            return Ok(None);
        }

        let filtered = apply_chain(slice, &self.specs)?;
        let Some(raw_hz) = self
            .estimator
            .estimate(&filtered, self.config.filter.sampling_rate_hz)
        else {
            return Ok(None);
        };

        let output = match self.config.mapping.mode {
            Mode::Calibration => {
                self.range.observe(raw_hz);
                CycleOutput {
                    raw_hz,
                    rescaled_hz: None,
                    note: None,
                }
            }
            Mode::Performance => {
                let mapped = map_performance(
                    raw_hz,
                    self.config.mapping.participant_min_hz,
                    self.config.mapping.participant_max_hz,
                );
                match mapped {
                    Some((rescaled_hz, note)) => {
                        self.player.play(note, self.config.mapping.instrument_id);
                        CycleOutput {
                            raw_hz,
                            rescaled_hz: Some(rescaled_hz),
                            note: Some(note),
                        }
                    }
                    None => {
                        self.player.rest(SILENCE_REST);
                        CycleOutput {
                            raw_hz,
                            rescaled_hz: None,
                            note: None,
                        }
                    }
                }
            }
        };

        tracing::info!(
            "Dominant, rescaled, note: {:.2} Hz, {}, {}",
            output.raw_hz,
            output
                .rescaled_hz
                .map(|f| format!("{f:.2} Hz"))
                .unwrap_or_default(),
            output.note.map(|n| n.to_string()).unwrap_or_default()
        );

        Ok(Some(output))
    }
}
