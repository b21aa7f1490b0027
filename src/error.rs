// Error types for the sonification pipeline
//
// Transport and filter-design failures are the only conditions that abort a
// session. Numerical edge cases (empty windows, out-of-range estimates,
// decode underruns) are handled by precondition checks at the call sites and
// never surface as errors.

use log::error;
use std::fmt;

/// Acquisition-side errors
///
/// Cover opening and reading the byte source. A source that cannot be opened
/// is fatal at startup; a read failure mid-session aborts the session.
#[derive(Debug)]
pub enum AcquisitionError {
    /// Source could not be opened (bad port, missing replay file, ...)
    Unavailable { source: String, details: String },

    /// Read failed after the source was opened
    Transport { details: String },

    /// Read attempted on a source that is no longer open
    Closed,
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionError::Unavailable { source, details } => {
                write!(f, "failed to open acquisition source {}: {}", source, details)
            }
            AcquisitionError::Transport { details } => {
                write!(f, "acquisition read failed: {}", details)
            }
            AcquisitionError::Closed => write!(f, "acquisition source is closed"),
        }
    }
}

impl std::error::Error for AcquisitionError {}

impl From<std::io::Error> for AcquisitionError {
    fn from(err: std::io::Error) -> Self {
        AcquisitionError::Transport {
            details: err.to_string(),
        }
    }
}

/// Filter-design errors
///
/// Raised when a notch spec cannot be realised as a stable biquad section,
/// e.g. a center frequency at or above Nyquist.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    Unrealisable {
        center_hz: f64,
        sampling_rate_hz: f64,
    },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::Unrealisable {
                center_hz,
                sampling_rate_hz,
            } => write!(
                f,
                "cannot design notch at {} Hz for a {} Hz sampling rate",
                center_hz, sampling_rate_hz
            ),
        }
    }
}

impl std::error::Error for FilterError {}

/// Top-level session error, either collaborator side.
#[derive(Debug)]
pub enum SessionError {
    Acquisition(AcquisitionError),
    Filter(FilterError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Acquisition(err) => write!(f, "{}", err),
            SessionError::Filter(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Acquisition(err) => Some(err),
            SessionError::Filter(err) => Some(err),
        }
    }
}

impl From<AcquisitionError> for SessionError {
    fn from(err: AcquisitionError) -> Self {
        SessionError::Acquisition(err)
    }
}

impl From<FilterError> for SessionError {
    fn from(err: FilterError) -> Self {
        SessionError::Filter(err)
    }
}

/// Log a session error with its pipeline context before propagating it.
pub fn log_session_error(err: &SessionError, context: &str) {
    error!("Session error in {}: {}", context, err);
}
