//! Error types for verdis

use thiserror::Error;

/// Main error type for verdis operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("No band named {0:?} in image")]
    BandNotFound(String),

    #[error("Missing image property: {0}")]
    MissingProperty(String),

    #[error("Property {name} is not a {expected}")]
    PropertyType {
        name: String,
        expected: &'static str,
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Imagery provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for verdis operations
pub type Result<T> = std::result::Result<T, Error>;
