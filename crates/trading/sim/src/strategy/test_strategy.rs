//! Microprice mean-reversion signal

use super::{RollingMean, Strategy};
use crate::diagnostics::StrategyDiagnostics;
use common::Ts;
use lob::TopOfBook;
use tracing::info;

/// Trade direction suggested by [`TestStrategy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Ask fell more than two deviations below the rolling microprice
    Buy,
    /// Bid rose more than two deviations above the rolling microprice
    Sell,
}

/// Flags tops that stray two standard deviations from the rolling microprice
///
/// One-sided books are ignored. Signals are logged and counted; nothing is
/// sent anywhere.
#[derive(Debug, Clone)]
pub struct TestStrategy {
    prices: RollingMean,
    squares: RollingMean,
    buys: u64,
    sells: u64,
    last_signal: Option<Signal>,
    diagnostics: StrategyDiagnostics,
}

impl TestStrategy {
    /// Strategy over a rolling window of `window` microprices
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            prices: RollingMean::new(window),
            squares: RollingMean::new(window),
            buys: 0,
            sells: 0,
            last_signal: None,
            diagnostics: StrategyDiagnostics::default(),
        }
    }

    /// Buy and sell signals raised so far
    #[must_use]
    pub const fn signals(&self) -> (u64, u64) {
        (self.buys, self.sells)
    }

    /// Signal raised by the most recent update, if any
    #[must_use]
    pub const fn last_signal(&self) -> Option<Signal> {
        self.last_signal
    }

    /// Consume the strategy, keeping its diagnostics
    #[must_use]
    pub fn into_diagnostics(self) -> StrategyDiagnostics {
        self.diagnostics
    }
}

impl Default for TestStrategy {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Strategy for TestStrategy {
    fn on_update(&mut self, _ts: Ts, top: &TopOfBook) {
        self.last_signal = None;
        let Some(price) = top.microprice() else {
            return;
        };
        let (bid, ask) = (top.bid.as_f64(), top.ask.as_f64());
        self.diagnostics.record_observation(bid, ask);

        self.prices.push(price);
        self.squares.push(price * price);
        let (Some(mean), Some(mean_sq)) = (self.prices.mean(), self.squares.mean()) else {
            return;
        };
        let stdev = (mean_sq - mean * mean).max(0.0).sqrt();

        if bid > 2.0f64.mul_add(stdev, mean) {
            self.sells += 1;
            self.last_signal = Some(Signal::Sell);
            info!("sell. b:{} a:{} mp:{:.4} mean:{:.4} stdev:{:.4}", bid, ask, price, mean, stdev);
        } else if ask < 2.0f64.mul_add(-stdev, mean) {
            self.buys += 1;
            self.last_signal = Some(Signal::Buy);
            info!("buy. b:{} a:{} mp:{:.4} mean:{:.4} stdev:{:.4}", bid, ask, price, mean, stdev);
        }
    }

    fn diagnostics(&self) -> &StrategyDiagnostics {
        &self.diagnostics
    }

    fn diagnostics_mut(&mut self) -> &mut StrategyDiagnostics {
        &mut self.diagnostics
    }
}
