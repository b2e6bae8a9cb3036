use thiserror::Error;

/// Result type for preview geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building preview geometry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Occupancy mask has {actual} cells, grid expects {expected}")]
    MaskLengthMismatch { expected: usize, actual: usize },

    #[error("Core error: {0}")]
    CoreError(#[from] mesh_stream_core::Error),
}
