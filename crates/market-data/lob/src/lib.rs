//! Price-time priority limit order book
//!
//! Tracks exchange-reported resting orders per instrument. Orders are looked
//! up by id in O(1) and levels are kept in ordered maps so the best bid and
//! ask are always at hand.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)] // Handled by cargo-deny configuration
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod book;
pub mod locked;
pub mod ops;
pub mod price_levels;
pub mod top;

pub use arena::{OrderArena, OrderKey};
pub use book::{
    BookError, ExecuteResult, ExecutionDiagnostics, LevelSummary, LimitOrderBook, OrderBook,
    OrderView,
};
pub use locked::LockedOrderBook;
pub use ops::BookOps;
pub use price_levels::{OrderNode, PriceLevelQueue};
pub use top::TopOfBook;
