//! Strategy consumers of top-of-book rings
//!
//! A strategy owns its read cursor. [`Strategy::poll`] does one ring read,
//! updates the diagnostics and hands each update to
//! [`Strategy::on_update`]. [`Strategy::run_loop`] spins on `poll` until the
//! writer clears the running flag.

mod rolling;
mod test_strategy;
mod trivial;

pub use rolling::RollingMean;
pub use test_strategy::{Signal, TestStrategy};
pub use trivial::TrivialStrategy;

use crate::diagnostics::StrategyDiagnostics;
use crate::manager::TopOfBookBuffer;
use common::Ts;
use lob::TopOfBook;
use std::sync::atomic::{AtomicBool, Ordering};

/// Consumer of top-of-book updates
pub trait Strategy {
    /// React to one update published at `ts`
    fn on_update(&mut self, ts: Ts, top: &TopOfBook);

    /// Accumulated diagnostics
    fn diagnostics(&self) -> &StrategyDiagnostics;

    /// Mutable diagnostics, for the polling bookkeeping
    fn diagnostics_mut(&mut self) -> &mut StrategyDiagnostics;

    /// Read once from `cursor` and return the next cursor
    fn poll(&mut self, buffer: &TopOfBookBuffer, cursor: usize) -> usize {
        let batch = buffer.read(cursor);
        if batch.is_empty() && !batch.overflowed() {
            return cursor;
        }
        self.diagnostics_mut().record_read(&batch);
        for update in &batch.items {
            let lag = Ts::now().saturating_since(update.published);
            self.diagnostics_mut().record_lag(lag);
            self.on_update(update.published, &update.top);
        }
        batch.next_cursor()
    }

    /// Poll until `running` is cleared, checking it every `batch` reads
    ///
    /// One last read after the flag drops picks up whatever the writer
    /// published before stopping. Returns the final cursor.
    fn run_loop(&mut self, running: &AtomicBool, buffer: &TopOfBookBuffer, batch: usize) -> usize {
        let mut cursor = 0;
        while running.load(Ordering::Acquire) {
            for _ in 0..batch {
                cursor = self.poll(buffer, cursor);
            }
        }
        self.poll(buffer, cursor)
    }
}
