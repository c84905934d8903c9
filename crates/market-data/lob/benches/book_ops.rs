//! Book mutation and query throughput

#![allow(missing_docs)]

use common::{Direction, OrderId, Px, Qty};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use lob::{LockedOrderBook, OrderBook};
use rand::prelude::*;

const MID: i64 = 2_313_000;

fn populated(orders: u64, rng: &mut StdRng) -> OrderBook {
    let mut book = OrderBook::new();
    for id in 0..orders {
        let direction = if id % 2 == 0 {
            Direction::Buy
        } else {
            Direction::Sell
        };
        let offset = rng.gen_range(1..50) * 100;
        let level = match direction {
            Direction::Buy => MID - offset,
            Direction::Sell => MID + offset,
        };
        book.add_with_id(
            OrderId::new(id),
            direction,
            Qty::from_i64(rng.gen_range(1..500)),
            Px::from_ticks(level),
        );
    }
    book
}

fn bench_add_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_delete");
    for size in [1_000u64, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut rng = StdRng::seed_from_u64(42);
            let mut book = populated(size, &mut rng);
            let mut next = size;
            b.iter(|| {
                let id = OrderId::new(next);
                next += 1;
                book.add_with_id(id, Direction::Buy, Qty::from_i64(100), Px::from_ticks(MID - 100));
                black_box(book.delete(id));
            });
        });
    }
    group.finish();
}

fn bench_execute_front(c: &mut Criterion) {
    c.bench_function("execute_partial_front", |b| {
        let mut book = OrderBook::new();
        let id = book.add(Direction::Sell, Qty::from_i64(i64::MAX / 2), Px::from_ticks(MID));
        b.iter(|| black_box(book.execute(id, Qty::from_i64(1))));
    });
}

fn bench_top(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let book = populated(10_000, &mut rng);
    c.bench_function("top_of_book", |b| b.iter(|| black_box(book.top())));

    let locked = LockedOrderBook::from_book(book);
    c.bench_function("top_of_book_locked", |b| b.iter(|| black_box(locked.top())));
}

criterion_group!(benches, bench_add_delete, bench_execute_front, bench_top);
criterion_main!(benches);
