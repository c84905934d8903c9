//! Core order book implementation

use crate::arena::{OrderArena, OrderKey};
use crate::price_levels::{OrderNode, PriceLevelQueue};
use crate::top::TopOfBook;
use common::{Direction, Level, OrderId, OrderIdGenerator, PRICE_PRECISION, Qty};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Outcome of [`LimitOrderBook::execute`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteResult {
    /// The order was filled and removed
    Full,
    /// The order was partially filled and keeps resting
    Partial,
    /// No order with that id is resting
    Error,
}

/// Read-only view of a resting order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderView<const P: u32> {
    /// Order id
    pub id: OrderId,
    /// Side of the book
    pub direction: Direction,
    /// Price level
    pub level: Level<P>,
    /// Remaining size
    pub size: Qty,
}

/// Aggregate state of one occupied price level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSummary<const P: u32> {
    /// Price level
    pub level: Level<P>,
    /// Sum of remaining sizes
    pub depth: Qty,
    /// Number of resting orders
    pub orders: usize,
}

/// Counters for executions the feed reported out of price-time order
///
/// These never block an execution. The feed is authoritative, so a count here
/// means the book and the feed disagree about who should have traded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionDiagnostics {
    /// Executions applied
    pub executions: u64,
    /// Executions against an order not at its side's best level
    pub off_best: u64,
    /// Executions against an order not at the front of its level
    pub priority_violations: u64,
    /// Queue position of the most recently executed order (1 is the front)
    pub last_priority: usize,
}

/// Limit order book for one instrument with `P` decimal price precision
///
/// Orders live in a generation-checked arena. The id index maps each resting
/// order to its arena key, and each occupied level keeps a FIFO of keys.
/// Side maps only ever hold non-empty levels.
#[derive(Debug, Clone)]
pub struct LimitOrderBook<const P: u32 = PRICE_PRECISION> {
    orders: OrderArena<OrderNode<P>>,
    index: FxHashMap<OrderId, OrderKey>,
    bids: BTreeMap<Level<P>, PriceLevelQueue>,
    asks: BTreeMap<Level<P>, PriceLevelQueue>,
    ids: OrderIdGenerator,
    diagnostics: ExecutionDiagnostics,
}

/// Order book at exchange feed precision
pub type OrderBook = LimitOrderBook<PRICE_PRECISION>;

impl<const P: u32> LimitOrderBook<P> {
    /// Create a new empty order book
    #[must_use]
    pub fn new() -> Self {
        Self::with_id_generator(OrderIdGenerator::new())
    }

    /// Create an empty book that draws synthetic ids from `ids`
    #[must_use]
    pub fn with_id_generator(ids: OrderIdGenerator) -> Self {
        Self {
            orders: OrderArena::new(),
            index: FxHashMap::default(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            ids,
            diagnostics: ExecutionDiagnostics::default(),
        }
    }

    #[inline]
    const fn side(&self, direction: Direction) -> &BTreeMap<Level<P>, PriceLevelQueue> {
        match direction {
            Direction::Buy => &self.bids,
            Direction::Sell => &self.asks,
        }
    }

    #[inline]
    const fn side_mut(&mut self, direction: Direction) -> &mut BTreeMap<Level<P>, PriceLevelQueue> {
        match direction {
            Direction::Buy => &mut self.bids,
            Direction::Sell => &mut self.asks,
        }
    }

    /// Add an order under a freshly generated synthetic id
    pub fn add(&mut self, direction: Direction, size: Qty, level: Level<P>) -> OrderId {
        let order_id = self.ids.next_id();
        self.add_with_id(order_id, direction, size, level)
    }

    /// Add an order with a caller-supplied id at the back of its level
    ///
    /// The caller guarantees the id is not already resting.
    pub fn add_with_id(
        &mut self,
        order_id: OrderId,
        direction: Direction,
        size: Qty,
        level: Level<P>,
    ) -> OrderId {
        let node = OrderNode::new(order_id, direction, level, size);
        let Self {
            orders, bids, asks, ..
        } = self;
        let side = match direction {
            Direction::Buy => bids,
            Direction::Sell => asks,
        };
        let key = side.entry(level).or_default().push_back(orders, node);
        self.index.insert(order_id, key);
        order_id
    }

    /// Remove an order and its level if that leaves the level empty
    ///
    /// Returns false if the id is unknown.
    pub fn delete(&mut self, order_id: OrderId) -> bool {
        let Some(key) = self.index.remove(&order_id) else {
            return false;
        };
        self.unlink(key).is_some()
    }

    fn unlink(&mut self, key: OrderKey) -> Option<OrderNode<P>> {
        let (direction, level) = {
            let node = self.orders.get(key)?;
            (node.direction, node.level)
        };
        let Self {
            orders, bids, asks, ..
        } = self;
        let side = match direction {
            Direction::Buy => bids,
            Direction::Sell => asks,
        };
        let queue = side.get_mut(&level)?;
        let node = queue.unlink(orders, key);
        if queue.is_empty() {
            side.remove(&level);
        }
        node
    }

    /// Decrease an order's size by `amount`
    ///
    /// Returns `Ok(false)` if the id is unknown.
    ///
    /// # Errors
    /// [`BookError::NonPositiveReduce`] if the order would be left with zero
    /// or negative size. The book is unchanged in that case.
    pub fn reduce(&mut self, order_id: OrderId, amount: Qty) -> Result<bool, BookError> {
        let Some(&key) = self.index.get(&order_id) else {
            return Ok(false);
        };
        let Some(node) = self.orders.get_mut(key) else {
            return Ok(false);
        };
        if node.size <= amount {
            return Err(BookError::NonPositiveReduce {
                order_id,
                size: node.size,
                amount,
                level: node.level.ticks(),
            });
        }
        node.size -= amount;
        let (direction, level) = (node.direction, node.level);
        if let Some(queue) = self.side_mut(direction).get_mut(&level) {
            queue.shrink(amount);
        }
        Ok(true)
    }

    /// Replace an order with a new id, size and level on the same side
    ///
    /// The new order always joins the back of its level, even when the level
    /// is unchanged, so a same-level replace loses time priority. Returns
    /// `Ok(false)` if `old_id` is unknown.
    ///
    /// # Errors
    /// [`BookError::ZeroSizeReplace`] if `new_size` is zero. The old order is
    /// left in place in that case.
    pub fn replace(
        &mut self,
        old_id: OrderId,
        new_id: OrderId,
        new_size: Qty,
        new_level: Level<P>,
    ) -> Result<bool, BookError> {
        let Some(&key) = self.index.get(&old_id) else {
            return Ok(false);
        };
        if new_size.is_zero() {
            return Err(BookError::ZeroSizeReplace { old_id, new_id });
        }
        self.index.remove(&old_id);
        let Some(old) = self.unlink(key) else {
            return Ok(false);
        };
        self.add_with_id(new_id, old.direction, new_size, new_level);
        Ok(true)
    }

    /// Consume `size` units of liquidity from a resting order
    ///
    /// An execution against an order that is not at the best level or not at
    /// the front of its queue is still applied, and counted in
    /// [`Self::execution_diagnostics`].
    ///
    /// # Errors
    /// [`BookError::ExecuteExceedsSize`] if `size` is larger than the remaining
    /// size. The book is unchanged in that case.
    pub fn execute(&mut self, order_id: OrderId, size: Qty) -> Result<ExecuteResult, BookError> {
        let Some(&key) = self.index.get(&order_id) else {
            return Ok(ExecuteResult::Error);
        };
        let Some(node) = self.orders.get(key) else {
            return Ok(ExecuteResult::Error);
        };
        let (direction, level, remaining) = (node.direction, node.level, node.size);
        if size > remaining {
            return Err(BookError::ExecuteExceedsSize {
                order_id,
                size: remaining,
                executed: size,
                level: level.ticks(),
            });
        }

        self.check_execution_priority(order_id, key, direction, level);

        if size == remaining {
            self.index.remove(&order_id);
            self.unlink(key);
            return Ok(ExecuteResult::Full);
        }
        if let Some(node) = self.orders.get_mut(key) {
            node.size -= size;
        }
        if let Some(queue) = self.side_mut(direction).get_mut(&level) {
            queue.shrink(size);
        }
        Ok(ExecuteResult::Partial)
    }

    fn check_execution_priority(
        &mut self,
        order_id: OrderId,
        key: OrderKey,
        direction: Direction,
        level: Level<P>,
    ) {
        self.diagnostics.executions += 1;

        let best = match direction {
            Direction::Buy => self.bids.last_key_value().map(|(l, _)| *l),
            Direction::Sell => self.asks.first_key_value().map(|(l, _)| *l),
        };
        if best != Some(level) {
            self.diagnostics.off_best += 1;
            warn!(
                "Execution of {} at {} is off the best {} level {:?}",
                order_id, level, direction, best
            );
        }

        let priority = self
            .side(direction)
            .get(&level)
            .and_then(|queue| queue.position(&self.orders, key))
            .unwrap_or(0);
        self.diagnostics.last_priority = priority;
        if priority != 1 {
            self.diagnostics.priority_violations += 1;
            warn!(
                "Execution of {} at {} has queue priority {} instead of 1",
                order_id, level, priority
            );
        }
    }

    /// Best bid and ask with depths, zero for an empty side
    #[inline]
    #[must_use]
    pub fn top(&self) -> TopOfBook<P> {
        let mut top = TopOfBook::default();
        if let Some((bid, depth)) = self.best_bid() {
            top.bid = bid;
            top.bid_depth = depth;
        }
        if let Some((ask, depth)) = self.best_ask() {
            top.ask = ask;
            top.ask_depth = depth;
        }
        top
    }

    /// Get the best bid level and depth
    #[inline]
    #[must_use]
    pub fn best_bid(&self) -> Option<(Level<P>, Qty)> {
        self.bids
            .last_key_value()
            .map(|(level, queue)| (*level, queue.depth()))
    }

    /// Get the best ask level and depth
    #[inline]
    #[must_use]
    pub fn best_ask(&self) -> Option<(Level<P>, Qty)> {
        self.asks
            .first_key_value()
            .map(|(level, queue)| (*level, queue.depth()))
    }

    /// True if any bid is resting
    #[inline]
    #[must_use]
    pub fn has_bids(&self) -> bool {
        !self.bids.is_empty()
    }

    /// True if any ask is resting
    #[inline]
    #[must_use]
    pub fn has_asks(&self) -> bool {
        !self.asks.is_empty()
    }

    /// Best bid level
    #[inline]
    #[must_use]
    pub fn bid(&self) -> Option<Level<P>> {
        self.best_bid().map(|(level, _)| level)
    }

    /// Best ask level
    #[inline]
    #[must_use]
    pub fn ask(&self) -> Option<Level<P>> {
        self.best_ask().map(|(level, _)| level)
    }

    /// Depth at the best bid
    #[inline]
    #[must_use]
    pub fn bid_depth(&self) -> Option<Qty> {
        self.best_bid().map(|(_, depth)| depth)
    }

    /// Depth at the best ask
    #[inline]
    #[must_use]
    pub fn ask_depth(&self) -> Option<Qty> {
        self.best_ask().map(|(_, depth)| depth)
    }

    /// Depth at an arbitrary level, `None` if the level is unoccupied
    #[must_use]
    pub fn depth_at(&self, direction: Direction, level: Level<P>) -> Option<Qty> {
        self.side(direction).get(&level).map(PriceLevelQueue::depth)
    }

    /// Orders at a level from oldest to newest
    #[must_use]
    pub fn orders_at(&self, direction: Direction, level: Level<P>) -> Vec<OrderId> {
        self.side(direction)
            .get(&level)
            .map(|queue| {
                queue
                    .keys(&self.orders)
                    .filter_map(|key| self.orders.get(key).map(|node| node.id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Occupied levels of one side, best first
    #[must_use]
    pub fn levels(&self, direction: Direction) -> Vec<LevelSummary<P>> {
        let summary = |(level, queue): (&Level<P>, &PriceLevelQueue)| LevelSummary {
            level: *level,
            depth: queue.depth(),
            orders: queue.len(),
        };
        match direction {
            Direction::Buy => self.bids.iter().rev().map(summary).collect(),
            Direction::Sell => self.asks.iter().map(summary).collect(),
        }
    }

    /// Look up a resting order
    #[must_use]
    pub fn order(&self, order_id: OrderId) -> Option<OrderView<P>> {
        let key = self.index.get(&order_id)?;
        self.orders.get(*key).map(|node| OrderView {
            id: node.id,
            direction: node.direction,
            level: node.level,
            size: node.size,
        })
    }

    /// 1-based time priority of an order within its level
    #[must_use]
    pub fn queue_position(&self, order_id: OrderId) -> Option<usize> {
        let key = *self.index.get(&order_id)?;
        let node = self.orders.get(key)?;
        self.side(node.direction)
            .get(&node.level)?
            .position(&self.orders, key)
    }

    /// Number of resting orders
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if no order is resting
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Execution priority counters
    #[must_use]
    pub const fn execution_diagnostics(&self) -> &ExecutionDiagnostics {
        &self.diagnostics
    }

    /// Get a hash of the book state for deterministic verification
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn state_hash(&self) -> u64 {
        let mut hash = 0u64;
        for (level, queue) in self.bids.iter().chain(self.asks.iter()) {
            hash = hash.wrapping_mul(31).wrapping_add(level.ticks() as u64);
            hash = hash.wrapping_mul(31).wrapping_add(queue.depth().as_i64() as u64);
            for key in queue.keys(&self.orders) {
                if let Some(node) = self.orders.get(key) {
                    hash = hash.wrapping_mul(31).wrapping_add(node.id.as_u64());
                }
            }
        }
        hash
    }
}

impl<const P: u32> Default for LimitOrderBook<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const P: u32> fmt::Display for LimitOrderBook<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[ LimitOrderBook begin ]")?;
        writeln!(f, "Bids:")?;
        for level in self.levels(Direction::Buy) {
            writeln!(
                f,
                "Level {}, num: {}, total depth {}",
                level.level, level.orders, level.depth
            )?;
        }
        writeln!(f, "Asks:")?;
        for level in self.levels(Direction::Sell) {
            writeln!(
                f,
                "Level {}, num: {}, total depth {}",
                level.level, level.orders, level.depth
            )?;
        }
        write!(f, "[ LimitOrderBook end ]")
    }
}

/// Invariant violations that leave the book unsafe to keep mutating
///
/// Levels are reported in raw ticks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookError {
    /// A reduce would leave the order with zero or negative size
    #[error("Reduce of order {order_id} by {amount} at level {level} leaves non-positive size (resting {size})")]
    NonPositiveReduce {
        /// Order being reduced
        order_id: OrderId,
        /// Size before the reduce
        size: Qty,
        /// Requested reduction
        amount: Qty,
        /// Level of the order in ticks
        level: i64,
    },

    /// An execution larger than the resting size
    #[error("Execution of {executed} against order {order_id} at level {level} exceeds resting size {size}")]
    ExecuteExceedsSize {
        /// Order being executed
        order_id: OrderId,
        /// Size before the execution
        size: Qty,
        /// Requested execution size
        executed: Qty,
        /// Level of the order in ticks
        level: i64,
    },

    /// A replace with zero size
    #[error("Replace of order {old_id} with {new_id} has zero size")]
    ZeroSizeReplace {
        /// Order being replaced
        old_id: OrderId,
        /// Replacement order id
        new_id: OrderId,
    },
}
