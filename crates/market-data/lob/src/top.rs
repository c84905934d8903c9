//! Top-of-book snapshot

use common::{Level, PRICE_PRECISION, Qty};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Best bid and ask with their depths
///
/// An empty side reads as zero level and zero depth, so level zero is the
/// empty-side sentinel. ITCH prices are always positive. Snapshots compare by
/// value, which is how publishers detect that the top moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopOfBook<const P: u32 = PRICE_PRECISION> {
    /// Best bid level
    pub bid: Level<P>,
    /// Aggregate size at the best bid
    pub bid_depth: Qty,
    /// Best ask level
    pub ask: Level<P>,
    /// Aggregate size at the best ask
    pub ask_depth: Qty,
}

impl<const P: u32> TopOfBook<P> {
    /// True if both sides are populated
    ///
    /// A side is populated when its level is non-zero. A book that somehow
    /// rests orders at level zero reports that side as empty.
    #[inline]
    #[must_use]
    pub const fn is_two_sided(&self) -> bool {
        !self.bid.is_zero() && !self.ask.is_zero()
    }

    /// Mid price in display units
    #[inline]
    #[must_use]
    pub fn mid(&self) -> Option<f64> {
        self.is_two_sided()
            .then(|| (self.bid.as_f64() + self.ask.as_f64()) / 2.0)
    }

    /// Size-weighted mid in display units
    ///
    /// Each side's price is weighted by the opposite side's depth, so the
    /// value leans towards the thinner side.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn microprice(&self) -> Option<f64> {
        if !self.is_two_sided() {
            return None;
        }
        let bid_qty = self.bid_depth.as_i64() as f64;
        let ask_qty = self.ask_depth.as_i64() as f64;
        let total = bid_qty + ask_qty;
        if total > 0.0 {
            Some((bid_qty * self.ask.as_f64() + ask_qty * self.bid.as_f64()) / total)
        } else {
            self.mid()
        }
    }

    /// Spread in ticks
    #[inline]
    #[must_use]
    pub const fn spread_ticks(&self) -> Option<i64> {
        if self.is_two_sided() {
            Some(self.ask.ticks() - self.bid.ticks())
        } else {
            None
        }
    }
}

impl<const P: u32> fmt::Display for TopOfBook<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} | {} x {}",
            self.bid_depth, self.bid, self.ask, self.ask_depth
        )
    }
}
