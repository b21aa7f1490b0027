// Analysis module - filtering and spectral estimation for the live pipeline
//
// Pipeline position: decoded samples come out of the rolling buffer, pass
// through the notch chain, and the dominant frequency of the filtered slice
// feeds the frequency mapper.

pub mod notch;
pub mod spectral;

pub use notch::{apply_chain, default_chain, FilterSpec};
pub use spectral::DominantFrequencyEstimator;
