//! Order book guarded by a reader/writer lock

use crate::book::{BookError, ExecuteResult, ExecutionDiagnostics, LimitOrderBook};
use crate::ops::BookOps;
use crate::top::TopOfBook;
use common::{Direction, Level, OrderId, PRICE_PRECISION, Qty};
use parking_lot::RwLock;

/// [`LimitOrderBook`] behind a [`RwLock`] so it can be shared between threads
///
/// Every mutation takes the write lock and every query the read lock, so
/// methods take `&self` and the book can sit in an `Arc`. Costs one lock
/// round trip per call compared with the plain book.
#[derive(Debug, Default)]
pub struct LockedOrderBook<const P: u32 = PRICE_PRECISION> {
    inner: RwLock<LimitOrderBook<P>>,
}

impl<const P: u32> LockedOrderBook<P> {
    /// Create an empty guarded book
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LimitOrderBook::new()),
        }
    }

    /// Wrap an existing book
    #[must_use]
    pub const fn from_book(book: LimitOrderBook<P>) -> Self {
        Self {
            inner: RwLock::new(book),
        }
    }

    /// Add an order under a synthetic id
    pub fn add(&self, direction: Direction, size: Qty, level: Level<P>) -> OrderId {
        self.inner.write().add(direction, size, level)
    }

    /// Add an order with a caller-supplied id
    pub fn add_with_id(
        &self,
        order_id: OrderId,
        direction: Direction,
        size: Qty,
        level: Level<P>,
    ) -> OrderId {
        self.inner
            .write()
            .add_with_id(order_id, direction, size, level)
    }

    /// Remove an order, false if unknown
    pub fn delete(&self, order_id: OrderId) -> bool {
        self.inner.write().delete(order_id)
    }

    /// Partially cancel an order
    ///
    /// # Errors
    /// See [`LimitOrderBook::reduce`].
    pub fn reduce(&self, order_id: OrderId, amount: Qty) -> Result<bool, BookError> {
        self.inner.write().reduce(order_id, amount)
    }

    /// Cancel-replace an order
    ///
    /// # Errors
    /// See [`LimitOrderBook::replace`].
    pub fn replace(
        &self,
        old_id: OrderId,
        new_id: OrderId,
        new_size: Qty,
        new_level: Level<P>,
    ) -> Result<bool, BookError> {
        self.inner
            .write()
            .replace(old_id, new_id, new_size, new_level)
    }

    /// Apply an execution
    ///
    /// # Errors
    /// See [`LimitOrderBook::execute`].
    pub fn execute(&self, order_id: OrderId, size: Qty) -> Result<ExecuteResult, BookError> {
        self.inner.write().execute(order_id, size)
    }

    /// Current top of book
    #[must_use]
    pub fn top(&self) -> TopOfBook<P> {
        self.inner.read().top()
    }

    /// True if any bid is resting
    #[must_use]
    pub fn has_bids(&self) -> bool {
        self.inner.read().has_bids()
    }

    /// True if any ask is resting
    #[must_use]
    pub fn has_asks(&self) -> bool {
        self.inner.read().has_asks()
    }

    /// Execution priority counters
    #[must_use]
    pub fn execution_diagnostics(&self) -> ExecutionDiagnostics {
        *self.inner.read().execution_diagnostics()
    }

    /// Run a read-only closure against the book under the read lock
    pub fn with_book<R>(&self, f: impl FnOnce(&LimitOrderBook<P>) -> R) -> R {
        f(&self.inner.read())
    }

    /// Unwrap the guarded book
    #[must_use]
    pub fn into_inner(self) -> LimitOrderBook<P> {
        self.inner.into_inner()
    }
}

impl<const P: u32> BookOps<P> for LockedOrderBook<P> {
    fn add_order(
        &mut self,
        order_id: OrderId,
        direction: Direction,
        size: Qty,
        level: Level<P>,
    ) -> OrderId {
        Self::add_with_id(self, order_id, direction, size, level)
    }

    fn delete_order(&mut self, order_id: OrderId) -> bool {
        Self::delete(self, order_id)
    }

    fn reduce_order(&mut self, order_id: OrderId, amount: Qty) -> Result<bool, BookError> {
        Self::reduce(self, order_id, amount)
    }

    fn replace_order(
        &mut self,
        old_id: OrderId,
        new_id: OrderId,
        new_size: Qty,
        new_level: Level<P>,
    ) -> Result<bool, BookError> {
        Self::replace(self, old_id, new_id, new_size, new_level)
    }

    fn execute_order(&mut self, order_id: OrderId, size: Qty) -> Result<ExecuteResult, BookError> {
        Self::execute(self, order_id, size)
    }

    fn top_of_book(&self) -> TopOfBook<P> {
        Self::top(self)
    }
}
