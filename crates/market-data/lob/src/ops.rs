//! Mutation interface shared by the plain and the lock-guarded book

use crate::book::{BookError, ExecuteResult, LimitOrderBook};
use crate::top::TopOfBook;
use common::{Direction, Level, OrderId, PRICE_PRECISION, Qty};

/// Order book operations driven by a feed handler
///
/// Implemented by [`LimitOrderBook`] for single-writer use and by
/// [`crate::LockedOrderBook`] where several threads share one book. Callers
/// pick the variant through a type parameter.
pub trait BookOps<const P: u32 = PRICE_PRECISION>: Default + Send {
    /// Add an order with a feed-assigned id
    fn add_order(
        &mut self,
        order_id: OrderId,
        direction: Direction,
        size: Qty,
        level: Level<P>,
    ) -> OrderId;

    /// Remove an order, false if unknown
    fn delete_order(&mut self, order_id: OrderId) -> bool;

    /// Partially cancel an order
    ///
    /// # Errors
    /// See [`LimitOrderBook::reduce`].
    fn reduce_order(&mut self, order_id: OrderId, amount: Qty) -> Result<bool, BookError>;

    /// Cancel-replace an order
    ///
    /// # Errors
    /// See [`LimitOrderBook::replace`].
    fn replace_order(
        &mut self,
        old_id: OrderId,
        new_id: OrderId,
        new_size: Qty,
        new_level: Level<P>,
    ) -> Result<bool, BookError>;

    /// Apply an execution against a resting order
    ///
    /// # Errors
    /// See [`LimitOrderBook::execute`].
    fn execute_order(&mut self, order_id: OrderId, size: Qty) -> Result<ExecuteResult, BookError>;

    /// Current top of book
    fn top_of_book(&self) -> TopOfBook<P>;
}

impl<const P: u32> BookOps<P> for LimitOrderBook<P> {
    #[inline]
    fn add_order(
        &mut self,
        order_id: OrderId,
        direction: Direction,
        size: Qty,
        level: Level<P>,
    ) -> OrderId {
        self.add_with_id(order_id, direction, size, level)
    }

    #[inline]
    fn delete_order(&mut self, order_id: OrderId) -> bool {
        self.delete(order_id)
    }

    #[inline]
    fn reduce_order(&mut self, order_id: OrderId, amount: Qty) -> Result<bool, BookError> {
        self.reduce(order_id, amount)
    }

    #[inline]
    fn replace_order(
        &mut self,
        old_id: OrderId,
        new_id: OrderId,
        new_size: Qty,
        new_level: Level<P>,
    ) -> Result<bool, BookError> {
        self.replace(old_id, new_id, new_size, new_level)
    }

    #[inline]
    fn execute_order(&mut self, order_id: OrderId, size: Qty) -> Result<ExecuteResult, BookError> {
        self.execute(order_id, size)
    }

    #[inline]
    fn top_of_book(&self) -> TopOfBook<P> {
        self.top()
    }
}
