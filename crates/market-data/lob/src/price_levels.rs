//! Time-priority queues of resting orders at one price level
//!
//! Each queue is a doubly linked list threaded through the shared
//! [`OrderArena`], so unlinking an order found through the id index is O(1).

use crate::arena::{OrderArena, OrderKey};
use common::{Direction, Level, OrderId, Qty};

/// A resting order as stored in the arena
#[derive(Debug, Clone)]
pub struct OrderNode<const P: u32> {
    pub(crate) id: OrderId,
    pub(crate) direction: Direction,
    pub(crate) level: Level<P>,
    pub(crate) size: Qty,
    prev: Option<OrderKey>,
    next: Option<OrderKey>,
}

impl<const P: u32> OrderNode<P> {
    /// Build an unlinked node
    #[must_use]
    pub const fn new(id: OrderId, direction: Direction, level: Level<P>, size: Qty) -> Self {
        Self {
            id,
            direction,
            level,
            size,
            prev: None,
            next: None,
        }
    }

    /// Remaining size
    #[must_use]
    pub const fn size(&self) -> Qty {
        self.size
    }
}

/// FIFO of orders at one (direction, level) with cached aggregate depth
#[derive(Debug, Clone, Default)]
pub struct PriceLevelQueue {
    head: Option<OrderKey>,
    tail: Option<OrderKey>,
    depth: Qty,
    count: usize,
}

impl PriceLevelQueue {
    /// Create an empty queue
    #[must_use]
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            depth: Qty::ZERO,
            count: 0,
        }
    }

    /// Sum of remaining sizes
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> Qty {
        self.depth
    }

    /// Number of resting orders
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// True once the last order has left
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Oldest order, the first eligible to trade
    #[inline]
    #[must_use]
    pub const fn front(&self) -> Option<OrderKey> {
        self.head
    }

    /// Append at the lowest priority position
    pub fn push_back<const P: u32>(
        &mut self,
        arena: &mut OrderArena<OrderNode<P>>,
        mut node: OrderNode<P>,
    ) -> OrderKey {
        let size = node.size;
        node.prev = self.tail;
        node.next = None;
        let key = arena.insert(node);
        match self.tail.and_then(|tail| arena.get_mut(tail)) {
            Some(tail) => tail.next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        self.depth += size;
        self.count += 1;
        key
    }

    /// Remove an order from the queue and the arena
    pub fn unlink<const P: u32>(
        &mut self,
        arena: &mut OrderArena<OrderNode<P>>,
        key: OrderKey,
    ) -> Option<OrderNode<P>> {
        let node = arena.remove(key)?;
        match node.prev.and_then(|prev| arena.get_mut(prev)) {
            Some(prev) => prev.next = node.next,
            None => self.head = node.next,
        }
        match node.next.and_then(|next| arena.get_mut(next)) {
            Some(next) => next.prev = node.prev,
            None => self.tail = node.prev,
        }
        self.depth -= node.size;
        self.count -= 1;
        Some(node)
    }

    /// Account for an in-place size decrease of one of this queue's orders
    pub(crate) fn shrink(&mut self, amount: Qty) {
        self.depth -= amount;
    }

    /// Keys from oldest to newest
    pub fn keys<'a, const P: u32>(
        &self,
        arena: &'a OrderArena<OrderNode<P>>,
    ) -> impl Iterator<Item = OrderKey> + 'a {
        std::iter::successors(self.head, move |key| arena.get(*key).and_then(|node| node.next))
    }

    /// 1-based time priority of `key` within this queue
    #[must_use]
    pub fn position<const P: u32>(
        &self,
        arena: &OrderArena<OrderNode<P>>,
        key: OrderKey,
    ) -> Option<usize> {
        if self.head == Some(key) {
            return Some(1);
        }
        self.keys(arena).position(|k| k == key).map(|index| index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Px;

    fn node(id: u64, size: i64) -> OrderNode<4> {
        OrderNode::new(
            OrderId::new(id),
            Direction::Buy,
            Px::from_ticks(100),
            Qty::from_i64(size),
        )
    }

    #[test]
    fn test_fifo_order_and_depth() {
        let mut arena = OrderArena::new();
        let mut queue = PriceLevelQueue::new();
        let a = queue.push_back(&mut arena, node(1, 10));
        let b = queue.push_back(&mut arena, node(2, 20));
        let c = queue.push_back(&mut arena, node(3, 30));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.depth(), Qty::from_i64(60));
        assert_eq!(queue.front(), Some(a));
        assert_eq!(queue.keys(&arena).collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(queue.position(&arena, c), Some(3));
    }

    #[test]
    fn test_unlink_middle_head_tail() {
        let mut arena = OrderArena::new();
        let mut queue = PriceLevelQueue::new();
        let a = queue.push_back(&mut arena, node(1, 10));
        let b = queue.push_back(&mut arena, node(2, 20));
        let c = queue.push_back(&mut arena, node(3, 30));

        assert_eq!(queue.unlink(&mut arena, b).map(|n| n.id), Some(OrderId::new(2)));
        assert_eq!(queue.keys(&arena).collect::<Vec<_>>(), vec![a, c]);

        queue.unlink(&mut arena, a);
        assert_eq!(queue.front(), Some(c));
        assert_eq!(queue.position(&arena, c), Some(1));

        queue.unlink(&mut arena, c);
        assert!(queue.is_empty());
        assert_eq!(queue.depth(), Qty::ZERO);
        assert_eq!(queue.front(), None);
        assert!(arena.is_empty());

        // Unlinking twice is a no-op
        assert!(queue.unlink(&mut arena, c).is_none());
    }
}
