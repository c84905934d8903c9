//! Per-instrument books and their top-of-book broadcast rings

use crate::error::{ManagerError, SimError};
use crate::events::{MarketEvent, MarketEventKind};
use crate::scheduler::EventHandler;
use bus::{RingBuffer, RingItem};
use common::{Direction, Locate, OrderId, Px, Qty, Ts};
use lob::{BookError, BookOps, ExecuteResult, OrderBook, TopOfBook};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Ring item: a top-of-book snapshot and when it was published
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookUpdate {
    /// Wall clock at push time
    pub published: Ts,
    /// Snapshot after the mutation
    pub top: TopOfBook,
}

const fn to_word(value: i64) -> u64 {
    u64::from_ne_bytes(value.to_ne_bytes())
}

const fn from_word(word: u64) -> i64 {
    i64::from_ne_bytes(word.to_ne_bytes())
}

impl RingItem for BookUpdate {
    type Words = [u64; 5];

    fn to_words(&self) -> Self::Words {
        [
            self.published.as_nanos(),
            to_word(self.top.bid.ticks()),
            to_word(self.top.bid_depth.as_i64()),
            to_word(self.top.ask.ticks()),
            to_word(self.top.ask_depth.as_i64()),
        ]
    }

    fn from_words(words: &Self::Words) -> Self {
        Self {
            published: Ts::from_nanos(words[0]),
            top: TopOfBook {
                bid: Px::from_ticks(from_word(words[1])),
                bid_depth: Qty::from_i64(from_word(words[2])),
                ask: Px::from_ticks(from_word(words[3])),
                ask_depth: Qty::from_i64(from_word(words[4])),
            },
        }
    }
}

/// Ring of top-of-book updates for one instrument
pub type TopOfBookBuffer = RingBuffer<BookUpdate>;

/// Applies feed events to one book per instrument
///
/// After every mutation the top of book is compared with its value before;
/// if it moved, a [`BookUpdate`] is pushed to that instrument's ring. The
/// manager is the only writer of books and rings.
#[derive(Debug)]
pub struct BooksManager<B: BookOps = OrderBook> {
    books: FxHashMap<Locate, B>,
    buffers: FxHashMap<Locate, Arc<TopOfBookBuffer>>,
    capacity_log2: u32,
    published: u64,
}

impl<B: BookOps> BooksManager<B> {
    /// Create a manager whose rings hold `capacity` updates
    ///
    /// # Errors
    /// [`SimError::Ring`] unless `capacity` is a non-zero power of two.
    pub fn new(capacity: usize) -> Result<Self, SimError> {
        TopOfBookBuffer::check_capacity(capacity)?;
        Ok(Self {
            books: FxHashMap::default(),
            buffers: FxHashMap::default(),
            capacity_log2: capacity.trailing_zeros(),
            published: 0,
        })
    }

    /// Book for an instrument, if it has seen any event
    #[must_use]
    pub fn book(&self, locate: Locate) -> Option<&B> {
        self.books.get(&locate)
    }

    /// Ring for an instrument, if one exists
    #[must_use]
    pub fn buffer(&self, locate: Locate) -> Option<Arc<TopOfBookBuffer>> {
        self.buffers.get(&locate).cloned()
    }

    /// Ring for an instrument, created on first use
    ///
    /// Subscribers call this before the run so they hold the same ring the
    /// writer will push into.
    pub fn ensure_buffer(&mut self, locate: Locate) -> Arc<TopOfBookBuffer> {
        let log2 = self.capacity_log2;
        Arc::clone(self.buffers.entry(locate).or_insert_with(|| {
            debug!("Creating top-of-book ring for {}", locate);
            Arc::new(RingBuffer::with_capacity_log2(log2))
        }))
    }

    /// Instruments with a book
    #[must_use]
    pub fn books_count(&self) -> usize {
        self.books.len()
    }

    /// Updates pushed across all rings
    #[must_use]
    pub const fn published(&self) -> u64 {
        self.published
    }

    /// Add an order
    ///
    /// # Errors
    /// Adds always succeed; the `Result` keeps the mutators uniform.
    pub fn add_order(
        &mut self,
        locate: Locate,
        order_id: OrderId,
        direction: Direction,
        shares: Qty,
        price: Px,
    ) -> Result<(), ManagerError> {
        self.mutate(locate, |book| {
            book.add_order(order_id, direction, shares, price);
            Ok(())
        })
    }

    /// Delete an order
    ///
    /// # Errors
    /// [`ManagerError::UnknownOrder`] if the book does not hold it.
    pub fn delete_order(&mut self, locate: Locate, order_id: OrderId) -> Result<(), ManagerError> {
        self.mutate(locate, |book| {
            if book.delete_order(order_id) {
                Ok(())
            } else {
                Err(unknown("delete", locate, order_id, Qty::ZERO))
            }
        })
    }

    /// Partially cancel an order
    ///
    /// # Errors
    /// Unknown order, or a reduction that would empty it.
    pub fn reduce_order(
        &mut self,
        locate: Locate,
        order_id: OrderId,
        shares: Qty,
    ) -> Result<(), ManagerError> {
        self.mutate(locate, |book| {
            if book.reduce_order(order_id, shares).map_err(book_error(locate))? {
                Ok(())
            } else {
                Err(unknown("reduce", locate, order_id, shares))
            }
        })
    }

    /// Cancel-replace an order
    ///
    /// # Errors
    /// Unknown order, or a zero replacement size.
    pub fn replace_order(
        &mut self,
        locate: Locate,
        order_id: OrderId,
        new_order_id: OrderId,
        shares: Qty,
        price: Px,
    ) -> Result<(), ManagerError> {
        self.mutate(locate, |book| {
            if book
                .replace_order(order_id, new_order_id, shares, price)
                .map_err(book_error(locate))?
            {
                Ok(())
            } else {
                Err(unknown("replace", locate, order_id, shares))
            }
        })
    }

    /// Execute against an order
    ///
    /// # Errors
    /// Unknown order, or an execution larger than the resting size.
    pub fn execute_order(
        &mut self,
        locate: Locate,
        order_id: OrderId,
        shares: Qty,
    ) -> Result<(), ManagerError> {
        self.mutate(locate, |book| {
            match book.execute_order(order_id, shares).map_err(book_error(locate))? {
                ExecuteResult::Full | ExecuteResult::Partial => Ok(()),
                ExecuteResult::Error => Err(unknown("execute", locate, order_id, shares)),
            }
        })
    }

    /// Dispatch one decoded event
    ///
    /// # Errors
    /// See the individual mutators.
    pub fn apply(&mut self, event: &MarketEvent) -> Result<(), ManagerError> {
        let locate = event.locate;
        match event.kind {
            MarketEventKind::Add {
                order_id,
                direction,
                shares,
                price,
            } => self.add_order(locate, order_id, direction, shares, price),
            MarketEventKind::Delete { order_id } => self.delete_order(locate, order_id),
            MarketEventKind::Reduce { order_id, shares } => {
                self.reduce_order(locate, order_id, shares)
            }
            MarketEventKind::Replace {
                order_id,
                new_order_id,
                shares,
                price,
            } => self.replace_order(locate, order_id, new_order_id, shares, price),
            MarketEventKind::Execute { order_id, shares } => {
                self.execute_order(locate, order_id, shares)
            }
        }
    }

    fn mutate(
        &mut self,
        locate: Locate,
        f: impl FnOnce(&mut B) -> Result<(), ManagerError>,
    ) -> Result<(), ManagerError> {
        let book = self.books.entry(locate).or_default();
        let before = book.top_of_book();
        f(book)?;
        let after = book.top_of_book();
        if after != before {
            trace!("{} top: {}", locate, after);
            self.ensure_buffer(locate).push(BookUpdate {
                published: Ts::now(),
                top: after,
            });
            self.published += 1;
        }
        Ok(())
    }
}

impl<B: BookOps> EventHandler<MarketEvent> for BooksManager<B> {
    fn handle(&mut self, _ts: Ts, event: MarketEvent) -> Result<(), ManagerError> {
        self.apply(&event)
    }
}

const fn unknown(
    action: &'static str,
    locate: Locate,
    order_id: OrderId,
    size: Qty,
) -> ManagerError {
    ManagerError::UnknownOrder {
        action,
        locate,
        order_id,
        size,
    }
}

fn book_error(locate: Locate) -> impl FnOnce(BookError) -> ManagerError {
    move |source| ManagerError::Book { locate, source }
}
