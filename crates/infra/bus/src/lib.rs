//! Lock-free broadcast ring for publishing book updates to many readers
//!
//! One writer appends with [`RingBuffer::push`]. Any number of readers pull
//! windows of recent history with [`RingBuffer::read`], each keeping its own
//! cursor. Readers never block the writer; a reader that falls more than
//! `capacity` items behind is told how many items it lost.

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

pub mod ring;

pub use ring::{ReadBatch, RingBuffer, RingError, RingItem};
