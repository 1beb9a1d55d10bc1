use thiserror::Error;

/// Errors in the analysis setup
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid binning for {path}: {reason}")]
    InvalidBinning { path: String, reason: String },
    #[error("Invalid jet radius {0}: must be positive and below eta_max = {1}")]
    InvalidRadius(f64, f64),
    #[error("Invalid shape exponent {0}: must be non-negative")]
    InvalidExponent(f64),
    #[error("Expected {expected} spectrum definitions, one per jet radius, found {found}")]
    SpectrumCount { expected: usize, found: usize },
    #[error("Unknown {kind} index {idx} in {context}")]
    UnknownIndex {
        kind: &'static str,
        idx: usize,
        context: String,
    },
    #[error("Ratio {0} needs a HEPData table number")]
    MissingTable(String),
    #[error("Numerator and denominator of {0} have different binnings")]
    RatioBinning(String),
    #[error("Invalid jet momentum threshold {0}: must be non-negative")]
    InvalidMomentumCut(f64),
    #[error("Output path {0} is used more than once")]
    DuplicatePath(String),
}

/// Errors raised while combining or finalising histograms
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("Incompatible binning: {0} and {1}")]
    BinningMismatch(String, String),
    #[error("Cannot normalise to cross section: sum of event weights is {0}")]
    SumOfWeights(f64),
    #[error("Cannot merge analyses {0} and {1}")]
    Incompatible(String, String),
}
