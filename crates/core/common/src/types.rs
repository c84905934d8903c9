//! Core types for the LOB replay

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Decimal digits carried by exchange prices (ITCH prices are 1/10000 dollars)
pub const PRICE_PRECISION: u32 = 4;

/// First id handed out for orders created inside the book rather than by the feed
pub const SYNTHETIC_ORDER_ID_BASE: u64 = 1 << 63;

/// Instrument locator assigned by the exchange feed
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Locate(pub u16);

impl Locate {
    /// Create a new locator
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Raw locator value
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Locate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LOC_{}", self.0)
    }
}

/// Order identifier, either feed-assigned or synthetic
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct OrderId(pub u64);

impl OrderId {
    /// Create an order id from its raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id value
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// True if this id came from an [`OrderIdGenerator`] with the default seed
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        self.0 >= SYNTHETIC_ORDER_ID_BASE
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic source of synthetic order ids
///
/// Owned by whoever creates orders internally. Ids start at
/// [`SYNTHETIC_ORDER_ID_BASE`] so they never collide with feed-assigned ids.
#[derive(Debug, Clone)]
pub struct OrderIdGenerator {
    next: u64,
}

impl OrderIdGenerator {
    /// Generator seeded at [`SYNTHETIC_ORDER_ID_BASE`]
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(SYNTHETIC_ORDER_ID_BASE)
    }

    /// Generator seeded at an arbitrary value
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Hand out the next id
    pub const fn next_id(&mut self) -> OrderId {
        let id = OrderId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Peek at the id the next call will return
    #[must_use]
    pub const fn peek(&self) -> OrderId {
        OrderId(self.next)
    }
}

impl Default for OrderIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Resting bid
    Buy,
    /// Resting offer
    Sell,
}

impl Direction {
    /// The other side of the book
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("Buy"),
            Self::Sell => f.write_str("Sell"),
        }
    }
}

/// Fixed-point price level with `PRECISION` decimal digits
///
/// Stored as integer ticks so ordering and hashing are exact. The display
/// price is `ticks * 10^-PRECISION`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Level<const PRECISION: u32>(i64);

impl<const PRECISION: u32> Level<PRECISION> {
    /// Zero level, used for an empty side in a top-of-book snapshot
    pub const ZERO: Self = Self(0);

    /// Ticks per unit of display price
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn scale() -> f64 {
        10f64.powi(PRECISION as i32)
    }

    /// Create from integer ticks
    #[must_use]
    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Create from a display price (rounds to the nearest tick)
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(value: f64) -> Self {
        Self((value * Self::scale()).round() as i64)
    }

    /// Integer tick count
    #[must_use]
    pub const fn ticks(&self) -> i64 {
        self.0
    }

    /// Display price
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / Self::scale()
    }

    /// True for the zero level
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl<const PRECISION: u32> fmt::Display for Level<PRECISION> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", PRECISION as usize, self.as_f64())
    }
}

/// Exchange price level at feed precision
pub type Px = Level<PRICE_PRECISION>;

/// Order size in whole shares
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Qty(i64);

impl Qty {
    /// Zero quantity
    pub const ZERO: Self = Self(0);

    /// Create from whole units
    #[must_use]
    pub const fn from_i64(units: i64) -> Self {
        Self(units)
    }

    /// Get quantity as i64 units
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Check if quantity is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Check if quantity is strictly positive
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Sum, `None` on overflow
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }

    /// Difference, `None` on overflow
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }
}

impl From<u32> for Qty {
    fn from(units: u32) -> Self {
        Self(i64::from(units))
    }
}

impl Add for Qty {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Qty {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Qty {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Qty {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp in nanoseconds
///
/// Feed timestamps count from midnight, wall-clock timestamps from the UNIX
/// epoch. Only differences between values of the same origin are meaningful.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Ts(pub u64);

impl Ts {
    /// Get current wall-clock timestamp
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| std::time::Duration::from_secs(0))
            .as_nanos() as u64;
        Self(nanos)
    }

    /// Create timestamp from nanoseconds
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Get timestamp as nanoseconds
    #[must_use]
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Get timestamp as microseconds
    #[must_use]
    pub const fn as_micros(&self) -> u64 {
        self.0 / 1000
    }

    /// Get timestamp as milliseconds
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0 / 1_000_000
    }

    /// Nanoseconds elapsed since `earlier`, zero if `earlier` is later
    #[must_use]
    pub const fn saturating_since(&self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Render as `HH:MM:SS.mmm.uuu.nnn`, reading the value as time since midnight
    #[must_use]
    pub fn to_clock_string(&self) -> String {
        let nanos = self.0 % 1000;
        let micros = (self.0 / 1000) % 1000;
        let millis = (self.0 / 1_000_000) % 1000;
        let total_secs = self.0 / 1_000_000_000;
        let secs = total_secs % 60;
        let minutes = (total_secs / 60) % 60;
        let hours = total_secs / 3600;
        format!("{hours:02}:{minutes:02}:{secs:02}.{millis:03}.{micros:03}.{nanos:03}")
    }
}

impl fmt::Display for Ts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_px_serde() -> Result<(), Box<dyn std::error::Error>> {
        let px = Px::from_ticks(231_400);
        let encoded = bincode::serialize(&px)?;
        let decoded: Px = bincode::deserialize(&encoded)?;
        assert_eq!(px, decoded);
        Ok(())
    }

    #[rstest]
    #[case(231_400, 23.14)]
    #[case(1_010_000, 101.0)]
    #[case(1, 0.0001)]
    #[case(0, 0.0)]
    fn test_px_display_price(#[case] ticks: i64, #[case] expected: f64) {
        let px = Px::from_ticks(ticks);
        assert!((px.as_f64() - expected).abs() < 1e-9);
        assert_eq!(Px::from_f64(expected), px);
    }

    #[test]
    fn test_level_precision_is_type_level() {
        let two = Level::<2>::from_ticks(12_345);
        assert!((two.as_f64() - 123.45).abs() < 1e-9);
        assert_eq!(two.to_string(), "123.45");
        assert_eq!(Px::from_ticks(12_345).to_string(), "1.2345");
    }

    #[test]
    fn test_level_ordering_follows_ticks() {
        assert!(Px::from_ticks(230_900) < Px::from_ticks(231_300));
        assert_eq!(Px::default(), Px::ZERO);
        assert!(Px::ZERO.is_zero());
    }

    #[test]
    fn test_qty_arithmetic() {
        let mut q = Qty::from(100u32);
        q -= Qty::from_i64(30);
        assert_eq!(q, Qty::from_i64(70));
        q += Qty::from_i64(5);
        assert_eq!(q.as_i64(), 75);
        assert!(q.is_positive());
        assert!((q - Qty::from_i64(75)).is_zero());
        assert_eq!(Qty::from_i64(i64::MAX).checked_add(Qty::from_i64(1)), None);
        assert_eq!(q.checked_sub(Qty::from_i64(80)), Some(Qty::from_i64(-5)));
    }

    #[test]
    fn test_generator_is_monotonic_and_seeded_high() {
        let mut ids = OrderIdGenerator::new();
        let first = ids.next_id();
        let second = ids.next_id();
        assert_eq!(first.as_u64(), SYNTHETIC_ORDER_ID_BASE);
        assert!(second > first);
        assert!(first.is_synthetic());
        assert!(!OrderId::new(9_000_000).is_synthetic());
        assert_eq!(ids.peek(), OrderId::new(SYNTHETIC_ORDER_ID_BASE + 2));
    }

    #[test]
    fn test_clock_string() {
        let ts = Ts::from_nanos(
            9 * 3_600_000_000_000 + 30 * 60_000_000_000 + 5 * 1_000_000_000 + 123_456_789,
        );
        assert_eq!(ts.to_clock_string(), "09:30:05.123.456.789");
        assert_eq!(Ts::from_nanos(0).to_clock_string(), "00:00:00.000.000.000");
    }

    #[test]
    fn test_ts_saturating_since() {
        assert_eq!(Ts::from_nanos(50).saturating_since(Ts::from_nanos(20)), 30);
        assert_eq!(Ts::from_nanos(20).saturating_since(Ts::from_nanos(50)), 0);
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Buy.opposite(), Direction::Sell);
        assert_eq!(Direction::Sell.opposite(), Direction::Buy);
    }

    proptest! {
        #[test]
        fn prop_ticks_survive_display_conversion(ticks in 0i64..1_000_000_000) {
            let px = Px::from_ticks(ticks);
            prop_assert_eq!(Px::from_f64(px.as_f64()), px);
        }
    }
}
