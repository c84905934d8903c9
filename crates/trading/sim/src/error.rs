//! Error types for the replay simulator

use bus::RingError;
use common::{Locate, OrderId, Qty};
use feeds::FeedError;
use lob::BookError;
use thiserror::Error;

/// Setup and environment failures
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration loaded but is unusable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Ring capacity rejected
    #[error(transparent)]
    Ring(#[from] RingError),

    /// Thread could not be pinned
    #[error("cannot pin thread to core {core} ({available} cores available)")]
    CorePinning {
        /// Requested core id
        core: usize,
        /// Cores reported by the OS
        available: usize,
    },
}

/// Feed event the books cannot absorb
///
/// Either variant means the book and the feed have diverged, so the replay
/// stops rather than continue on a corrupt book.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManagerError {
    /// The feed referenced an order the book does not hold
    #[error("Could not {action} order {order_id} (size {size}) on {locate}")]
    UnknownOrder {
        /// Operation that failed
        action: &'static str,
        /// Instrument
        locate: Locate,
        /// Referenced order
        order_id: OrderId,
        /// Size carried by the message
        size: Qty,
    },

    /// The book rejected the update as an accounting violation
    #[error("book {locate} rejected update: {source}")]
    Book {
        /// Instrument
        locate: Locate,
        /// Violation reported by the book
        #[source]
        source: BookError,
    },
}

/// Why a scheduler step did not run an event
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The market data source is exhausted
    #[error("end of market data")]
    EndOfStream,

    /// The next market data event could not be decoded
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// The event ran but the books rejected it
    #[error(transparent)]
    Manager(#[from] ManagerError),
}
