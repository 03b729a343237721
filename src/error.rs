use thiserror::Error;

/// Errors raised at the engine's input boundary. The scoring functions
/// themselves are total once inputs have passed through here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{factor} must be a finite number, got {value}")]
    InvalidFactor { factor: &'static str, value: f64 },

    #[error("{factor} is required")]
    MissingFactor { factor: &'static str },

    #[error("{factor} change must be a finite percentage, got {value}")]
    InvalidModifier { factor: &'static str, value: f64 },

    #[error("division id `{0}` appears more than once")]
    DuplicateDivision(String),

    #[error("no division with id `{0}`")]
    UnknownDivision(String),

    #[error("failed to read division fixtures: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
