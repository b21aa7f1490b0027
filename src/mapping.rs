// FrequencyMapper - calibration accumulation and frequency-to-note quantization
//
// Two quantizers coexist on purpose. The live sonification path rescales the
// participant's observed frequency range onto C1..C5 and quantizes to the
// 7-letter diatonic scale. The offline transcription path quantizes raw
// frequencies chromatically against the A4 = 440 Hz anchor. They use
// different reference pitches and scale systems and must not be merged.

use std::fmt;

/// C1 reference pitch, low end of the sonification range.
pub const C1_HZ: f64 = 32.7;

/// C5 reference pitch, high end of the sonification range.
pub const C5_HZ: f64 = 523.2;

/// Estimates at or above this are treated as electrode-contact noise and
/// excluded from calibration. (No muscle flexing reads ~4.5 kHz, an
/// averaging/FFT artefact.)
pub const CALIBRATION_CEILING_HZ: f64 = 500.0;

const DIATONIC_LETTERS: [&str; 7] = ["C", "D", "E", "F", "G", "A", "B"];
const CHROMATIC_LETTERS: [&str; 12] = [
    "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
];

/// A musical note, always recomputed from a frequency, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Note {
    pub letter: &'static str,
    pub octave: i32,
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.octave)
    }
}

/// Participant frequency range accumulated during a calibration session.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationRange {
    bounds: Option<(f64, f64)>,
}

impl CalibrationRange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one dominant-frequency estimate into the range. Estimates at or
    /// above the sanity ceiling are ignored.
    pub fn observe(&mut self, hz: f64) {
        if hz >= CALIBRATION_CEILING_HZ {
            return;
        }
        self.bounds = match self.bounds {
            None => Some((hz, hz)),
            Some((lo, hi)) => Some((lo.min(hz), hi.max(hz))),
        };
    }

    /// `(min_hz, max_hz)` observed so far, or `None` if nothing below the
    /// ceiling was seen.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }
}

/// Linearly rescale a frequency from the participant's `(min_hz, max_hz)`
/// baseline onto the C1..C5 reference range.
pub fn rescale_frequency(hz: f64, min_hz: f64, max_hz: f64) -> f64 {
    let stretch = (C5_HZ - C1_HZ) / (max_hz - min_hz);
    (hz - min_hz) * stretch + C1_HZ
}

/// Map one estimate through the performance-mode path.
///
/// Estimates outside the exclusive `(min_hz, max_hz)` interval are silence:
/// no rescaled value and no note. The range check also guarantees the
/// rescaled frequency stays positive before the quantizer takes its log.
pub fn map_performance(hz: f64, min_hz: f64, max_hz: f64) -> Option<(f64, Note)> {
    if !(hz > min_hz && hz < max_hz) {
        return None;
    }
    let rescaled = rescale_frequency(hz, min_hz, max_hz);
    debug_assert!(rescaled > 0.0);
    Some((rescaled, diatonic_note(rescaled)))
}

/// Quantize a (rescaled) frequency to the diatonic C-major ladder anchored
/// at C1 = 32.7 Hz. One step is a seventh of an octave.
pub fn diatonic_note(hz: f64) -> Note {
    let steps = (7.0 * (hz / C1_HZ).log2()).round() as i64;
    Note {
        letter: DIATONIC_LETTERS[steps.rem_euclid(7) as usize],
        octave: (steps.div_euclid(7) + 1) as i32,
    }
}

/// Quantize a raw frequency to the 12-semitone chromatic scale anchored at
/// A4 = 440 Hz (piano key numbering). Used by offline transcription.
pub fn chromatic_note(hz: f64) -> Note {
    let key = (12.0 * (hz / 440.0).log2() + 49.0).round() as i64;
    Note {
        letter: CHROMATIC_LETTERS[(key - 1).rem_euclid(12) as usize],
        octave: ((key + 8).div_euclid(12)) as i32,
    }
}
