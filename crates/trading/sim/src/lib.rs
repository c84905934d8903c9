//! ITCH replay simulator
//!
//! Replays a recorded ITCH 5.0 session into per-instrument limit order
//! books. Every change to a book's top is published on that instrument's
//! broadcast ring, where strategies poll for it, either inline on the
//! replay thread or on threads of their own.
//!
//! - [`scheduler`]: merges the feed with injected events in time order
//! - [`manager`]: owns the books and publishes top-of-book changes
//! - [`strategy`]: ring consumers and their signals
//! - [`runner`]: wires everything together for a run

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

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod manager;
pub mod pinning;
pub mod runner;
pub mod scheduler;
pub mod strategy;

pub use config::{RunMode, SimConfig};
pub use diagnostics::StrategyDiagnostics;
pub use error::{ManagerError, SchedulerError, SimError};
pub use events::{ItchEventSource, MarketEvent, MarketEventKind};
pub use manager::{BookUpdate, BooksManager, TopOfBookBuffer};
pub use runner::{RunReport, SymbolReport, run, run_multi_threaded, run_single_threaded};
pub use scheduler::{Action, EventHandler, EventScheduler, MarketDataSource};
pub use strategy::{RollingMean, Signal, Strategy, TestStrategy, TrivialStrategy};
