// Spikersong - EMG/neural signal sonification
//
// Decodes 16-bit samples from the amplifier's 2-byte serial framing, keeps a
// rolling window, rejects narrowband interference, estimates the dominant
// frequency per cycle and maps it to a musical note. Live sessions run in
// calibration mode (record the participant's range) or performance mode
// (rescale onto C1..C5 and play diatonic notes); the offline mode transcribes
// a WAV file chromatically.

pub mod analysis;
pub mod buffer;
pub mod config;
pub mod decode;
pub mod error;
pub mod mapping;
pub mod offline;
pub mod replay;
pub mod session;

pub use config::{AppConfig, Mode};
pub use session::{CancellationToken, CycleOutput, SessionController, SessionReport};
