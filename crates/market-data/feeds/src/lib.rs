//! NASDAQ TotalView-ITCH 5.0 feed decoding
//!
//! - `itch`: message model and the framed byte-stream reader
//! - `symbols`: locate code directory from the pre-open messages
//! - `mapped`: memory-mapped capture files
//! - `stats`: per-type message counts for a whole capture

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)] // Handled by cargo-deny configuration
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![deny(unsafe_code)] // Only the file mapping opts out

pub mod error;
pub mod itch;
pub mod mapped;
pub mod stats;
pub mod symbols;

pub use error::{FeedError, FeedResult};
pub use itch::{
    AddOrder, DeleteOrder, ExecuteOrder, Header, ItchMessage, ItchReader, MessageType,
    ReduceOrder, ReplaceOrder,
};
pub use mapped::MappedFile;
pub use stats::{ScanStats, scan_stats};
pub use symbols::Symbols;
