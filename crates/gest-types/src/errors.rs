use thiserror::Error;

use crate::vocs::Category;

/// Main error type for gest
#[derive(Error, Debug)]
pub enum GestError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Structural problems found while normalizing a VOCS.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("{category} {name}: domain [{low}, {high}] must satisfy low < high with a finite width")]
    InvalidDomain {
        category: Category,
        name: String,
        low: f64,
        high: f64,
    },

    #[error("variable {name}: discrete value set is empty")]
    EmptyValues { name: String },

    #[error("variable {name}: default value {value} lies outside the allowed values")]
    DefaultOutOfDomain { name: String, value: String },

    #[error("constraint {name}: constraint type '{kind}' is not supported")]
    UnknownConstraintKind { name: String, kind: String },

    #[error("objective {name}: objective type '{direction}' is not supported")]
    UnknownObjective { name: String, direction: String },

    #[error("{category} {name}: must provide a type field")]
    MissingType { category: Category, name: String },

    #[error("{category} {name}: type {type_name} is not available")]
    UnknownType {
        category: Category,
        name: String,
        type_name: String,
    },

    #[error("{category} {name}: input of kind {found} is not supported")]
    UnsupportedInput {
        category: Category,
        name: String,
        found: String,
    },

    #[error("{category} {name} is not correctly specified: {message}")]
    Malformed {
        category: Category,
        name: String,
        message: String,
    },

    #[error("name {name} is declared as {first} and again as {second}")]
    NameCollision {
        name: String,
        first: Category,
        second: Category,
    },

    #[error("VOCS document is not correctly specified: {message}")]
    Document { message: String },
}

/// Errors surfaced by generator construction and by `suggest`/`ingest`/`finalize`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeneratorError {
    #[error("{generator} generator cannot accept this VOCS: {reason}")]
    Incompatible { generator: String, reason: String },

    #[error("{generator} generator configuration is invalid: {message}")]
    InvalidConfig { generator: String, message: String },

    #[error("requested {requested} points but only {available} can be produced")]
    InfeasibleCount { requested: usize, available: usize },

    #[error("point {index} carries unknown identifier {id}")]
    UnknownId { index: usize, id: String },

    #[error("point {index} is missing field {field}")]
    MissingField { index: usize, field: String },

    #[error("{generator} generator has been finalized")]
    Finalized { generator: String },

    #[error("background worker failed: {message}")]
    Worker { message: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Result type alias for gest operations
pub type GestResult<T> = Result<T, GestError>;

/// Result type alias for VOCS construction
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type alias for generator calls
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Macro for creating compatibility errors from a generator's VOCS hook
#[macro_export]
macro_rules! incompatible {
    ($generator:expr, $($arg:tt)*) => {
        $crate::GeneratorError::Incompatible {
            generator: $generator.to_string(),
            reason: format!($($arg)*),
        }
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::GestError::Config(format!($($arg)*))
    };
}
