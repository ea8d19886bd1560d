use thiserror::Error;

/// Custom error types for the paging scheduler
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid frame position {0}, must be 0-7")]
    InvalidFramePosition(u8),

    #[error("Message has no payload codewords")]
    EmptyMessage,

    #[error("Message needs {required} batches but the queue accepts at most {limit}")]
    MessageTooLarge { required: usize, limit: usize },

    #[error("Invalid slot specification: {0}")]
    InvalidSlotSpec(String),

    #[error("Transmission error: {0}")]
    Transmission(String),

    #[error("Slot refresh error: {0}")]
    Refresh(String),
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new slot specification error
    pub fn invalid_slot_spec(msg: impl Into<String>) -> Self {
        Error::InvalidSlotSpec(msg.into())
    }

    /// Creates a new transmission error
    pub fn transmission(msg: impl Into<String>) -> Self {
        Error::Transmission(msg.into())
    }

    /// Creates a new slot refresh error
    pub fn refresh(msg: impl Into<String>) -> Self {
        Error::Refresh(msg.into())
    }
}
