//! Error handling for Cantor
//!
//! Every fallible operation in the library returns [`Result`]. A render that
//! cannot proceed because of a zero MIDI resolution is not an error; see
//! [`crate::engine::RenderOutcome::Aborted`].

use thiserror::Error;

/// Result type alias for Cantor operations
pub type Result<T> = std::result::Result<T, CantorError>;

/// Main error type for Cantor operations
#[derive(Error, Debug)]
pub enum CantorError {
    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid MIDI file: {reason}")]
    InvalidMidi {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Export Errors
    #[error("Encoding failed: {reason}")]
    Encoding { reason: String },

    // Melody Errors
    #[error("Corpus contains too few symbols: found {found}, need at least {required}")]
    EmptyCorpus { found: usize, required: usize },

    #[error("Invalid symbol: {symbol}")]
    InvalidSymbol { symbol: String },

    #[error("Prediction failed: {reason}")]
    Prediction { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CantorError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            CantorError::FileNotFound { .. } => "FILE_NOT_FOUND",
            CantorError::InvalidMidi { .. } => "INVALID_MIDI",
            CantorError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            CantorError::InvalidConfig { .. } => "INVALID_CONFIG",
            CantorError::Encoding { .. } => "ENCODING_ERROR",
            CantorError::EmptyCorpus { .. } => "EMPTY_CORPUS",
            CantorError::InvalidSymbol { .. } => "INVALID_SYMBOL",
            CantorError::Prediction { .. } => "PREDICTION_ERROR",
            CantorError::Io(_) => "IO_ERROR",
            CantorError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            CantorError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            CantorError::InvalidMidi { .. } => vec![
                "Check the file opens in another MIDI application",
                "The file may be truncated - try re-exporting it",
            ],
            CantorError::UnsupportedFormat { .. } => vec![
                "Use a .mp3 or .wav output path",
                "SMPTE-timed MIDI files are not supported; re-export with metrical timing",
            ],
            CantorError::EmptyCorpus { .. } => vec![
                "Add more MIDI files to the corpus directory",
                "Reduce the sequence length",
            ],
            CantorError::Encoding { .. } => vec![
                "Check there is free disk space at the output location",
                "Try exporting to WAV instead",
            ],
            _ => vec![],
        }
    }

    pub(crate) fn invalid_midi<E>(reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CantorError::InvalidMidi {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }
}
