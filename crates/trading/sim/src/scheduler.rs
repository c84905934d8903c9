//! Discrete-event scheduler merging market data with injected events
//!
//! Market data is pulled lazily, one look-ahead event at a time. Injected
//! events wait in a min-heap. Each [`EventScheduler::step`] runs whichever is
//! earlier, with market data winning exact ties.

use crate::error::{ManagerError, SchedulerError};
use common::Ts;
use feeds::FeedError;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::trace;

/// Pull-based producer of timestamped market data events
pub trait MarketDataSource {
    /// Event payload
    type Event;

    /// Next event, `None` once the source is exhausted
    ///
    /// # Errors
    /// Decoding failures in the underlying feed.
    fn next_event(&mut self) -> Result<Option<(Ts, Self::Event)>, FeedError>;
}

/// Consumer that applies market data events
pub trait EventHandler<E> {
    /// Apply one event
    ///
    /// # Errors
    /// The event could not be applied consistently.
    fn handle(&mut self, ts: Ts, event: E) -> Result<(), ManagerError>;
}

/// Injected action, run against the same handler as market data
pub type Action<H> = Box<dyn FnOnce(&mut H) -> Result<(), ManagerError> + Send>;

struct Pending<H> {
    ts: Ts,
    seq: u64,
    action: Action<H>,
}

impl<H> PartialEq for Pending<H> {
    fn eq(&self, other: &Self) -> bool {
        self.ts == other.ts && self.seq == other.seq
    }
}

impl<H> Eq for Pending<H> {}

impl<H> PartialOrd for Pending<H> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<H> Ord for Pending<H> {
    // Reversed so the max-heap pops the earliest event, insertion order on ties
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .ts
            .cmp(&self.ts)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Two-way merge of a lazy market data stream and a queue of injected events
pub struct EventScheduler<S: MarketDataSource, H> {
    source: S,
    lookahead: Option<(Ts, S::Event)>,
    pending: BinaryHeap<Pending<H>>,
    next_seq: u64,
    steps: u64,
}

impl<S: MarketDataSource, H: EventHandler<S::Event>> EventScheduler<S, H> {
    /// Wrap a source, pulling its first event
    ///
    /// # Errors
    /// Decoding failures while pulling the first event.
    pub fn new(mut source: S) -> Result<Self, SchedulerError> {
        let lookahead = source.next_event()?;
        Ok(Self {
            source,
            lookahead,
            pending: BinaryHeap::new(),
            next_seq: 0,
            steps: 0,
        })
    }

    /// Queue an action to run at `ts`
    pub fn add_event(
        &mut self,
        ts: Ts,
        action: impl FnOnce(&mut H) -> Result<(), ManagerError> + Send + 'static,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            ts,
            seq,
            action: Box::new(action),
        });
    }

    /// Run the earliest event and return its timestamp
    ///
    /// # Errors
    /// [`SchedulerError::EndOfStream`] once market data is exhausted, which is
    /// the normal end of a run. Decoding and book errors are fatal.
    pub fn step(&mut self, handler: &mut H) -> Result<Ts, SchedulerError> {
        let market_ts = match &self.lookahead {
            Some((ts, _)) => *ts,
            None => return Err(SchedulerError::EndOfStream),
        };

        let injected = if self
            .pending
            .peek()
            .is_some_and(|pending| pending.ts < market_ts)
        {
            self.pending.pop()
        } else {
            None
        };

        self.steps += 1;
        if let Some(pending) = injected {
            trace!("{} (S)", pending.ts.to_clock_string());
            (pending.action)(handler)?;
            return Ok(pending.ts);
        }

        // Pull first so a decoding error leaves the look-ahead unrun
        let next = self.source.next_event()?;
        if let Some((ts, event)) = std::mem::replace(&mut self.lookahead, next) {
            trace!("{} (M)", ts.to_clock_string());
            handler.handle(ts, event)?;
        }
        Ok(market_ts)
    }

    /// Injected events not yet run
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// True once the market data source has nothing left
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.lookahead.is_none()
    }

    /// Steps taken so far
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Underlying source
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    struct VecSource(VecDeque<u64>);

    impl MarketDataSource for VecSource {
        type Event = u64;

        fn next_event(&mut self) -> Result<Option<(Ts, u64)>, FeedError> {
            Ok(self.0.pop_front().map(|t| (Ts::from_nanos(t), t)))
        }
    }

    #[derive(Default)]
    struct Log(Vec<String>);

    impl EventHandler<u64> for Log {
        fn handle(&mut self, _ts: Ts, event: u64) -> Result<(), ManagerError> {
            self.0.push(format!("M{event}"));
            Ok(())
        }
    }

    fn scheduler(times: &[u64]) -> EventScheduler<VecSource, Log> {
        EventScheduler::new(VecSource(times.iter().copied().collect()))
            .unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn test_merge_with_market_data_winning_ties() -> Result<(), SchedulerError> {
        let mut sim = scheduler(&[5, 15, 25]);
        let mut log = Log::default();
        sim.add_event(Ts::from_nanos(15), |log: &mut Log| {
            log.0.push("S15".into());
            Ok(())
        });
        sim.add_event(Ts::from_nanos(10), |log: &mut Log| {
            log.0.push("S10".into());
            Ok(())
        });

        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(sim.step(&mut log)?.as_nanos());
        }
        assert_eq!(seen, vec![5, 10, 15, 15, 25]);
        assert_eq!(log.0, vec!["M5", "S10", "M15", "S15", "M25"]);
        assert!(matches!(sim.step(&mut log), Err(SchedulerError::EndOfStream)));
        assert!(sim.is_exhausted());
        assert_eq!(sim.steps(), 5);
        Ok(())
    }

    #[test]
    fn test_injected_ties_run_in_insertion_order() -> Result<(), SchedulerError> {
        let mut sim = scheduler(&[100]);
        let mut log = Log::default();
        for name in ["a", "b", "c"] {
            sim.add_event(Ts::from_nanos(50), move |log: &mut Log| {
                log.0.push(name.into());
                Ok(())
            });
        }
        for _ in 0..4 {
            sim.step(&mut log)?;
        }
        assert_eq!(log.0, vec!["a", "b", "c", "M100"]);
        assert_eq!(sim.pending_len(), 0);
        Ok(())
    }

    #[test]
    fn test_empty_source_ends_immediately() {
        let mut sim = scheduler(&[]);
        assert!(matches!(
            sim.step(&mut Log::default()),
            Err(SchedulerError::EndOfStream)
        ));
    }

    #[test]
    fn test_action_error_propagates() {
        let mut sim = scheduler(&[10]);
        sim.add_event(Ts::from_nanos(1), |_: &mut Log| {
            Err(ManagerError::UnknownOrder {
                action: "delete",
                locate: common::Locate::new(1),
                order_id: common::OrderId::new(9),
                size: common::Qty::ZERO,
            })
        });
        assert!(matches!(
            sim.step(&mut Log::default()),
            Err(SchedulerError::Manager(ManagerError::UnknownOrder { .. }))
        ));
    }
}
