use thiserror::Error;

use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::controller::ControllerError;
use crate::evaluator::{EvaluationError, ExpressionError};
use crate::parameters::{BoundsError, ConversionError};
use crate::snapshot::SnapshotError;
use crate::store::{ConfigurationError, StoreError};

/// Error types for the rigparams-rs library.
#[derive(Error, Debug)]
pub enum RigError {
    /// A value could not be converted to a declared type.
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Invalid bounds or a value outside them.
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    /// An evaluator failed.
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// An expression could not be parsed.
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// The parameter set cannot be loaded.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// The controller configuration file is unreadable.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),
}

/// Result type alias for rigparams-rs operations.
pub type Result<T> = std::result::Result<T, RigError>;
