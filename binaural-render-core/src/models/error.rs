use thiserror::Error;

/// Errors that can occur while sequencing renders or capturing their output.
///
/// Storage failures are recoverable at the sequencer level (the pass is
/// logged as a gap). `StreamNotOpen` and `InvalidState` indicate misuse of
/// an API and are returned before any byte is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("capture stream is not open")]
    StreamNotOpen,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),
}
