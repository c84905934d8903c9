//! Factories for synthetic ITCH 5.0 byte streams

use common::Direction;

/// Builder for a framed ITCH byte stream
///
/// Each method appends one message with a 2-byte big-endian length prefix.
/// Arguments are raw wire values: timestamps in nanoseconds since midnight,
/// prices in 1/10000 dollars.
#[derive(Debug, Clone, Default)]
pub struct ItchFeedBuilder {
    buf: Vec<u8>,
    tracking: u16,
    messages: usize,
}

impl ItchFeedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages appended so far
    pub fn len(&self) -> usize {
        self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages == 0
    }

    fn header(&mut self, kind: u8, body_len: usize, ts: u64, locate: u16) -> Vec<u8> {
        self.tracking = self.tracking.wrapping_add(1);
        let mut body = Vec::with_capacity(body_len);
        body.push(kind);
        body.extend_from_slice(&locate.to_be_bytes());
        body.extend_from_slice(&self.tracking.to_be_bytes());
        body.extend_from_slice(&ts.to_be_bytes()[2..]);
        body
    }

    fn push(mut self, mut body: Vec<u8>, body_len: usize) -> Self {
        body.resize(body_len, 0);
        let len = u16::try_from(body.len()).unwrap_or(u16::MAX);
        self.buf.extend_from_slice(&len.to_be_bytes());
        self.buf.extend_from_slice(&body);
        self.messages += 1;
        self
    }

    fn stock(body: &mut Vec<u8>, stock: &str) {
        let mut padded = [b' '; 8];
        for (slot, byte) in padded.iter_mut().zip(stock.bytes()) {
            *slot = byte;
        }
        body.extend_from_slice(&padded);
    }

    const fn side(direction: Direction) -> u8 {
        match direction {
            Direction::Buy => b'B',
            Direction::Sell => b'S',
        }
    }

    /// 'S' system event
    pub fn system_event(mut self, ts: u64, code: u8) -> Self {
        let mut body = self.header(b'S', 12, ts, 0);
        body.push(code);
        self.push(body, 12)
    }

    /// 'R' stock directory
    pub fn stock_directory(mut self, ts: u64, locate: u16, stock: &str) -> Self {
        let mut body = self.header(b'R', 39, ts, locate);
        Self::stock(&mut body, stock);
        body.push(b'Q');
        self.push(body, 39)
    }

    /// 'A' add order
    #[allow(clippy::too_many_arguments)]
    pub fn add_order(
        mut self,
        ts: u64,
        locate: u16,
        oid: u64,
        direction: Direction,
        shares: u32,
        stock: &str,
        price: u32,
    ) -> Self {
        let mut body = self.header(b'A', 36, ts, locate);
        body.extend_from_slice(&oid.to_be_bytes());
        body.push(Self::side(direction));
        body.extend_from_slice(&shares.to_be_bytes());
        Self::stock(&mut body, stock);
        body.extend_from_slice(&price.to_be_bytes());
        self.push(body, 36)
    }

    /// 'F' add order with attribution
    #[allow(clippy::too_many_arguments)]
    pub fn add_order_mpid(
        mut self,
        ts: u64,
        locate: u16,
        oid: u64,
        direction: Direction,
        shares: u32,
        stock: &str,
        price: u32,
        mpid: [u8; 4],
    ) -> Self {
        let mut body = self.header(b'F', 40, ts, locate);
        body.extend_from_slice(&oid.to_be_bytes());
        body.push(Self::side(direction));
        body.extend_from_slice(&shares.to_be_bytes());
        Self::stock(&mut body, stock);
        body.extend_from_slice(&price.to_be_bytes());
        body.extend_from_slice(&mpid);
        self.push(body, 40)
    }

    /// 'E' order executed
    pub fn execute(mut self, ts: u64, locate: u16, oid: u64, shares: u32, match_number: u64) -> Self {
        let mut body = self.header(b'E', 31, ts, locate);
        body.extend_from_slice(&oid.to_be_bytes());
        body.extend_from_slice(&shares.to_be_bytes());
        body.extend_from_slice(&match_number.to_be_bytes());
        self.push(body, 31)
    }

    /// 'C' order executed with price
    pub fn execute_with_price(
        mut self,
        ts: u64,
        locate: u16,
        oid: u64,
        shares: u32,
        match_number: u64,
        price: u32,
    ) -> Self {
        let mut body = self.header(b'C', 36, ts, locate);
        body.extend_from_slice(&oid.to_be_bytes());
        body.extend_from_slice(&shares.to_be_bytes());
        body.extend_from_slice(&match_number.to_be_bytes());
        body.push(b'Y');
        body.extend_from_slice(&price.to_be_bytes());
        self.push(body, 36)
    }

    /// 'X' order cancel
    pub fn reduce(mut self, ts: u64, locate: u16, oid: u64, shares: u32) -> Self {
        let mut body = self.header(b'X', 23, ts, locate);
        body.extend_from_slice(&oid.to_be_bytes());
        body.extend_from_slice(&shares.to_be_bytes());
        self.push(body, 23)
    }

    /// 'D' order delete
    pub fn delete(mut self, ts: u64, locate: u16, oid: u64) -> Self {
        let mut body = self.header(b'D', 19, ts, locate);
        body.extend_from_slice(&oid.to_be_bytes());
        self.push(body, 19)
    }

    /// 'U' order replace
    pub fn replace(
        mut self,
        ts: u64,
        locate: u16,
        oid: u64,
        new_oid: u64,
        shares: u32,
        price: u32,
    ) -> Self {
        let mut body = self.header(b'U', 35, ts, locate);
        body.extend_from_slice(&oid.to_be_bytes());
        body.extend_from_slice(&new_oid.to_be_bytes());
        body.extend_from_slice(&shares.to_be_bytes());
        body.extend_from_slice(&price.to_be_bytes());
        self.push(body, 35)
    }

    /// Any message type with a zero-filled body of `body_len` bytes
    pub fn other(mut self, kind: u8, body_len: usize, ts: u64, locate: u16) -> Self {
        let body = self.header(kind, body_len, ts, locate);
        self.push(body, body_len)
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

/// One instrument in [`sample_session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSymbol {
    pub name: &'static str,
    pub locate: u16,
    /// Final best bid, which is also the centre of the ladder
    pub price: u32,
}

pub const SAMPLE_SYMBOLS: [SampleSymbol; 4] = [
    SampleSymbol { name: "QQQ", locate: 1, price: 2_313_000 },
    SampleSymbol { name: "SPY", locate: 2, price: 4_500_000 },
    SampleSymbol { name: "AMD", locate: 3, price: 1_200_000 },
    SampleSymbol { name: "IWM", locate: 4, price: 2_000_000 },
];

/// Book messages per symbol in [`sample_session`]
pub const SAMPLE_EVENTS_PER_SYMBOL: usize = 8;

/// Top-of-book changes each symbol goes through in [`sample_session`]
pub const SAMPLE_TOP_CHANGES_PER_SYMBOL: usize = 6;

/// Start of the sample session's book messages, 09:30
pub const SAMPLE_OPEN_NS: u64 = 34_200_000_000_000;

/// A short session over [`SAMPLE_SYMBOLS`]
///
/// Directory entries and the start-of-system-hours event come first. Then each
/// symbol runs through the same eight book messages, interleaved across
/// symbols with strictly increasing timestamps, and an end-of-messages event
/// closes the feed. Every symbol finishes with a bid of 150 at `price` and an
/// ask of 60 at `price + 100`.
pub fn sample_session() -> Vec<u8> {
    let mut feed = ItchFeedBuilder::new().system_event(1_000, b'O');
    for (i, symbol) in SAMPLE_SYMBOLS.iter().enumerate() {
        feed = feed.stock_directory(2_000 + i as u64, symbol.locate, symbol.name);
    }
    feed = feed.system_event(3_000, b'S');

    let mut ts = SAMPLE_OPEN_NS;
    for step in 0..SAMPLE_EVENTS_PER_SYMBOL {
        for symbol in &SAMPLE_SYMBOLS {
            let l = symbol.locate;
            let p = symbol.price;
            let oid = |k: u64| u64::from(l) * 100 + k;
            feed = match step {
                0 => feed.add_order(ts, l, oid(1), Direction::Buy, 100, symbol.name, p - 100),
                1 => feed.add_order(ts, l, oid(2), Direction::Sell, 100, symbol.name, p + 100),
                2 => feed.add_order(ts, l, oid(3), Direction::Buy, 200, symbol.name, p - 200),
                3 => feed.add_order(ts, l, oid(4), Direction::Sell, 50, symbol.name, p + 100),
                4 => feed.execute(ts, l, oid(2), 40, oid(90)),
                5 => feed.reduce(ts, l, oid(3), 50),
                6 => feed.replace(ts, l, oid(1), oid(5), 150, p),
                _ => feed.delete(ts, l, oid(4)),
            };
            ts += 1_000;
        }
    }
    feed.system_event(ts, b'C').build()
}
