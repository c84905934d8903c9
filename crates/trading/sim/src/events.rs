//! Book events decoded from the ITCH stream

use crate::scheduler::MarketDataSource;
use common::{Direction, Locate, OrderId, Px, Qty, Ts};
use feeds::{FeedError, ItchMessage, ItchReader};
use tracing::debug;

/// Book mutation carried by a market data event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketEventKind {
    /// New resting order
    Add {
        /// Feed order id
        order_id: OrderId,
        /// Side
        direction: Direction,
        /// Displayed size
        shares: Qty,
        /// Limit price
        price: Px,
    },
    /// Order removed
    Delete {
        /// Feed order id
        order_id: OrderId,
    },
    /// Partial cancel
    Reduce {
        /// Feed order id
        order_id: OrderId,
        /// Cancelled size
        shares: Qty,
    },
    /// Cancel-replace under a new id
    Replace {
        /// Original order id
        order_id: OrderId,
        /// New order id
        new_order_id: OrderId,
        /// New size
        shares: Qty,
        /// New price
        price: Px,
    },
    /// Execution against a resting order
    Execute {
        /// Feed order id
        order_id: OrderId,
        /// Executed size
        shares: Qty,
    },
}

/// Timestamped book event for one instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketEvent {
    /// Exchange timestamp
    pub ts: Ts,
    /// Instrument
    pub locate: Locate,
    /// Mutation
    pub kind: MarketEventKind,
}

impl MarketEvent {
    /// Book event for a decoded message, `None` for messages without book state
    #[must_use]
    pub fn from_message(message: &ItchMessage) -> Option<Self> {
        let header = message.header();
        let kind = match message {
            ItchMessage::AddOrder(m) => MarketEventKind::Add {
                order_id: m.order_id,
                direction: m.direction,
                shares: m.shares,
                price: m.price,
            },
            ItchMessage::DeleteOrder(m) => MarketEventKind::Delete {
                order_id: m.order_id,
            },
            ItchMessage::ReduceOrder(m) => MarketEventKind::Reduce {
                order_id: m.order_id,
                shares: m.shares,
            },
            ItchMessage::ReplaceOrder(m) => MarketEventKind::Replace {
                order_id: m.order_id,
                new_order_id: m.new_order_id,
                shares: m.shares,
                price: m.price,
            },
            ItchMessage::ExecuteOrder(m) => MarketEventKind::Execute {
                order_id: m.order_id,
                shares: m.shares,
            },
            ItchMessage::SystemEvent { .. }
            | ItchMessage::StockDirectory { .. }
            | ItchMessage::Other { .. } => return None,
        };
        Some(Self {
            ts: header.timestamp,
            locate: header.locate,
            kind,
        })
    }
}

/// Market data source over an ITCH reader
///
/// Skips every message that carries no book state without decoding it.
#[derive(Debug)]
pub struct ItchEventSource<'a> {
    reader: ItchReader<'a>,
    events: u64,
    skipped: u64,
}

impl<'a> ItchEventSource<'a> {
    /// Pull events from the reader's current position
    #[must_use]
    pub const fn new(reader: ItchReader<'a>) -> Self {
        Self {
            reader,
            events: 0,
            skipped: 0,
        }
    }

    /// Book events produced so far
    #[must_use]
    pub const fn events(&self) -> u64 {
        self.events
    }

    /// Messages skipped so far
    #[must_use]
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl MarketDataSource for ItchEventSource<'_> {
    type Event = MarketEvent;

    fn next_event(&mut self) -> Result<Option<(Ts, MarketEvent)>, FeedError> {
        while let Some(kind) = self.reader.peek_type()? {
            if !kind.is_book_event() {
                self.reader.skip()?;
                self.skipped += 1;
                continue;
            }
            if let Some(event) = self
                .reader
                .next_message()?
                .as_ref()
                .and_then(MarketEvent::from_message)
            {
                self.events += 1;
                return Ok(Some((event.ts, event)));
            }
        }
        debug!(
            "End of messages after {} events, {} skipped",
            self.events, self.skipped
        );
        Ok(None)
    }
}
