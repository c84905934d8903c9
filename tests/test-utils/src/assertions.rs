//! Custom assertions for testing

use common::{Direction, Level};
use lob::LimitOrderBook;
use std::fmt::Debug;

/// Assert that two floating point values are approximately equal
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "Values not approximately equal: {} != {} (diff: {}, tolerance: {})",
        left,
        right,
        diff,
        tolerance
    );
}

/// Assert that a collection is sorted
pub fn assert_sorted<T: PartialOrd + Debug>(collection: &[T]) {
    for window in collection.windows(2) {
        assert!(
            window[0] <= window[1],
            "Collection not sorted at elements: {:?} > {:?}",
            window[0],
            window[1]
        );
    }
}

/// Assert that an error contains a specific message
pub fn assert_error_contains<E: std::fmt::Display>(error: &E, expected: &str) {
    let error_str = error.to_string();
    assert!(
        error_str.contains(expected),
        "Error message '{}' does not contain '{}'",
        error_str,
        expected
    );
}

/// Assert the book's structural invariants
///
/// Every listed level is non-empty, its depth is the sum of the sizes of the
/// orders queued there, both sides are strictly ordered best-first and the
/// book does not cross.
pub fn assert_book_consistent<const P: u32>(book: &LimitOrderBook<P>) {
    let mut resting = 0;
    for direction in [Direction::Buy, Direction::Sell] {
        let levels = book.levels(direction);
        for summary in &levels {
            assert!(summary.orders > 0, "empty level {} on {}", summary.level, direction);
            let ids = book.orders_at(direction, summary.level);
            assert_eq!(ids.len(), summary.orders, "order count at {}", summary.level);
            let total: i64 = ids
                .iter()
                .filter_map(|id| book.order(*id))
                .map(|order| order.size.as_i64())
                .sum();
            assert_eq!(total, summary.depth.as_i64(), "depth at {}", summary.level);
            resting += summary.orders;
        }
        let prices: Vec<Level<P>> = levels.iter().map(|l| l.level).collect();
        for pair in prices.windows(2) {
            match direction {
                Direction::Buy => assert!(pair[0] > pair[1], "bids out of order: {:?}", prices),
                Direction::Sell => assert!(pair[0] < pair[1], "asks out of order: {:?}", prices),
            }
        }
    }
    assert_eq!(resting, book.len(), "index and levels disagree");
    if let (Some(bid), Some(ask)) = (book.bid(), book.ask()) {
        assert!(bid < ask, "crossed book: {} >= {}", bid, ask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Px, Qty};

    #[test]
    fn test_consistent_book_passes() {
        let mut book = lob::OrderBook::new();
        book.add(Direction::Buy, Qty::from_i64(10), Px::from_ticks(99));
        book.add(Direction::Buy, Qty::from_i64(5), Px::from_ticks(98));
        book.add(Direction::Sell, Qty::from_i64(7), Px::from_ticks(101));
        assert_book_consistent(&book);
    }

    #[test]
    #[should_panic(expected = "crossed book")]
    fn test_crossed_book_fails() {
        let mut book = lob::OrderBook::new();
        book.add(Direction::Buy, Qty::from_i64(10), Px::from_ticks(101));
        book.add(Direction::Sell, Qty::from_i64(7), Px::from_ticks(100));
        assert_book_consistent(&book);
    }
}
