//! Buffer Error Types

use crate::buffer::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// Admission was rejected because every usable slot is occupied.
    /// This is the designed backpressure signal, not a fault.
    #[error("Buffer is full ({usable} usable slots)")]
    BufferFull { usable: usize },

    #[error("Buffer is not initialised")]
    NotInitialized,

    #[error("Invalid or excessive buffer capacity requested: {requested}")]
    InvalidCapacity { requested: usize },

    #[error("Dispatcher is still running; shut it down before destroying the buffer")]
    DispatcherActive,

    #[error("{message}")]
    Poisoned { message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;
