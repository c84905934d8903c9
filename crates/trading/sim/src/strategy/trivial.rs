//! Strategy that only records what it sees

use super::Strategy;
use crate::diagnostics::StrategyDiagnostics;
use common::Ts;
use lob::TopOfBook;

/// Records every observed top and does nothing else
#[derive(Debug, Clone, Default)]
pub struct TrivialStrategy {
    diagnostics: StrategyDiagnostics,
}

impl TrivialStrategy {
    /// Consume the strategy, keeping its diagnostics
    #[must_use]
    pub fn into_diagnostics(self) -> StrategyDiagnostics {
        self.diagnostics
    }
}

impl Strategy for TrivialStrategy {
    fn on_update(&mut self, _ts: Ts, top: &TopOfBook) {
        self.diagnostics
            .record_observation(top.bid.as_f64(), top.ask.as_f64());
    }

    fn diagnostics(&self) -> &StrategyDiagnostics {
        &self.diagnostics
    }

    fn diagnostics_mut(&mut self) -> &mut StrategyDiagnostics {
        &mut self.diagnostics
    }
}
