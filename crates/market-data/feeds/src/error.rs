//! Feed decoding errors

use thiserror::Error;

/// Errors raised while framing or decoding an ITCH byte stream
#[derive(Debug, Error)]
pub enum FeedError {
    /// The declared frame runs past the end of the data
    #[error("truncated frame at offset {offset}: need {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Offset of the length prefix
        offset: usize,
        /// Bytes the frame declares, including the prefix
        needed: usize,
        /// Bytes left in the data
        remaining: usize,
    },

    /// A decoded message declared a length other than its fixed layout
    #[error("message '{kind}' at offset {offset} has length {actual}, expected {expected}")]
    LengthMismatch {
        /// Message type letter
        kind: char,
        /// Offset of the length prefix
        offset: usize,
        /// Fixed layout length
        expected: usize,
        /// Declared length
        actual: usize,
    },

    /// The type byte names no known message
    #[error("unknown message type {byte:#04x} at offset {offset}")]
    UnknownMessage {
        /// Raw type byte
        byte: u8,
        /// Offset of the length prefix
        offset: usize,
    },

    /// Buy/sell indicator was neither 'B' nor 'S'
    #[error("invalid side indicator {byte:#04x} at offset {offset}")]
    InvalidSide {
        /// Raw indicator byte
        byte: u8,
        /// Offset of the length prefix
        offset: usize,
    },

    /// No directory entry for this symbol
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    /// Opening or mapping the input failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for feed operations
pub type FeedResult<T> = Result<T, FeedError>;
