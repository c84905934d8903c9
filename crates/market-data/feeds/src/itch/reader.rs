//! Cursor over a framed ITCH byte stream

use super::{
    AddOrder, DeleteOrder, ExecuteOrder, Header, ItchMessage, LENGTH_PREFIX, MessageType,
    ReduceOrder, ReplaceOrder,
};
use crate::error::{FeedError, FeedResult};
use byteorder::{BigEndian, ByteOrder};
use common::{Direction, Locate, OrderId, Px, Qty, Ts};
use tracing::trace;

/// Smallest readable frame: length prefix plus the type byte
const MIN_FRAME: usize = LENGTH_PREFIX + 1;

/// Bytes of the common header at the front of every body
const HEADER_LEN: usize = 11;

/// One framed message located in the data
#[derive(Debug, Clone, Copy)]
struct Frame<'a> {
    offset: usize,
    type_byte: u8,
    body: &'a [u8],
}

impl Frame<'_> {
    const fn end(&self) -> usize {
        self.offset + LENGTH_PREFIX + self.body.len()
    }

    fn kind(&self) -> FeedResult<MessageType> {
        match MessageType::from_byte(self.type_byte) {
            Some(kind) => Ok(kind),
            None => Err(FeedError::UnknownMessage {
                byte: self.type_byte,
                offset: self.offset,
            }),
        }
    }
}

/// Forward-only reader over ITCH 5.0 frames
///
/// Borrows the underlying bytes, so decoding never copies more than the
/// fixed-width fields. The cursor only moves when a call succeeds; after an
/// error it still points at the offending frame.
#[derive(Debug, Clone)]
pub struct ItchReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ItchReader<'a> {
    /// Read from the start of `data`
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes left after the cursor
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Cursor offset from the start of the data
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// True once too few bytes remain for another frame
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining() < MIN_FRAME
    }

    /// Move the cursor, clamped to the end of the data
    pub fn reset(&mut self, offset: usize) {
        self.pos = offset.min(self.data.len());
    }

    /// Type of the next message without consuming it
    ///
    /// # Errors
    /// [`FeedError::UnknownMessage`] if the type byte is not an ITCH type.
    pub fn peek_type(&self) -> FeedResult<Option<MessageType>> {
        if self.is_exhausted() {
            return Ok(None);
        }
        let byte = self.data[self.pos + LENGTH_PREFIX];
        MessageType::from_byte(byte)
            .map(Some)
            .ok_or(FeedError::UnknownMessage {
                byte,
                offset: self.pos,
            })
    }

    /// Timestamp of the next message without consuming it
    ///
    /// # Errors
    /// Framing errors, or a body too short to carry the header.
    pub fn peek_timestamp(&self) -> FeedResult<Option<Ts>> {
        let Some(frame) = self.frame()? else {
            return Ok(None);
        };
        if frame.body.len() < HEADER_LEN {
            let kind = frame.kind()?;
            return Err(FeedError::LengthMismatch {
                kind: kind.as_char(),
                offset: frame.offset,
                expected: kind.body_len(),
                actual: frame.body.len(),
            });
        }
        Ok(Some(decode_header(frame.body).timestamp))
    }

    /// Move past the next message without decoding it
    ///
    /// Returns false at the end of the data.
    ///
    /// # Errors
    /// [`FeedError::Truncated`] if the frame runs past the end of the data.
    pub fn skip(&mut self) -> FeedResult<bool> {
        match self.frame()? {
            Some(frame) => {
                self.pos = frame.end();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Decode and consume the next message
    ///
    /// Returns `None` at the end of the data.
    ///
    /// # Errors
    /// Framing errors, unknown types, a declared length that does not match
    /// the type's layout and invalid side indicators.
    pub fn next_message(&mut self) -> FeedResult<Option<ItchMessage>> {
        let Some(frame) = self.frame()? else {
            return Ok(None);
        };
        let message = decode(&frame)?;
        self.pos = frame.end();
        Ok(Some(message))
    }

    fn frame(&self) -> FeedResult<Option<Frame<'a>>> {
        if self.is_exhausted() {
            return Ok(None);
        }
        let offset = self.pos;
        let len = usize::from(BigEndian::read_u16(&self.data[offset..]));
        let end = offset + LENGTH_PREFIX + len;
        if end > self.data.len() {
            return Err(FeedError::Truncated {
                offset,
                needed: LENGTH_PREFIX + len,
                remaining: self.remaining(),
            });
        }
        Ok(Some(Frame {
            offset,
            type_byte: self.data[offset + LENGTH_PREFIX],
            body: &self.data[offset + LENGTH_PREFIX..end],
        }))
    }
}

fn decode_header(body: &[u8]) -> Header {
    Header {
        locate: Locate::new(BigEndian::read_u16(&body[1..3])),
        tracking: BigEndian::read_u16(&body[3..5]),
        timestamp: Ts::from_nanos(BigEndian::read_uint(&body[5..11], 6)),
    }
}

fn order_id(body: &[u8], at: usize) -> OrderId {
    OrderId::new(BigEndian::read_u64(&body[at..at + 8]))
}

fn shares(body: &[u8], at: usize) -> Qty {
    Qty::from(BigEndian::read_u32(&body[at..at + 4]))
}

fn price(body: &[u8], at: usize) -> Px {
    Px::from_ticks(i64::from(BigEndian::read_u32(&body[at..at + 4])))
}

fn decode(frame: &Frame<'_>) -> FeedResult<ItchMessage> {
    let kind = frame.kind()?;
    let body = frame.body;
    if body.len() != kind.body_len() {
        return Err(FeedError::LengthMismatch {
            kind: kind.as_char(),
            offset: frame.offset,
            expected: kind.body_len(),
            actual: body.len(),
        });
    }
    let header = decode_header(body);
    trace!("{} {} @ {}", kind.as_char(), header.locate, header.timestamp);

    let message = match kind {
        MessageType::SystemEvent => ItchMessage::SystemEvent {
            header,
            code: body[11],
        },
        MessageType::StockDirectory => ItchMessage::StockDirectory {
            header,
            stock: String::from_utf8_lossy(&body[11..19]).trim_end().to_owned(),
            market_category: body[19],
        },
        MessageType::AddOrder | MessageType::AddOrderMpid => {
            let direction = match body[19] {
                b'B' => Direction::Buy,
                b'S' => Direction::Sell,
                byte => {
                    return Err(FeedError::InvalidSide {
                        byte,
                        offset: frame.offset,
                    });
                }
            };
            let attribution = (kind == MessageType::AddOrderMpid)
                .then(|| [body[36], body[37], body[38], body[39]]);
            ItchMessage::AddOrder(AddOrder {
                header,
                order_id: order_id(body, 11),
                direction,
                shares: shares(body, 20),
                price: price(body, 32),
                attribution,
            })
        }
        MessageType::ExecuteOrder | MessageType::ExecuteOrderWithPrice => {
            ItchMessage::ExecuteOrder(ExecuteOrder {
                header,
                order_id: order_id(body, 11),
                shares: shares(body, 19),
                match_number: BigEndian::read_u64(&body[23..31]),
                price: (kind == MessageType::ExecuteOrderWithPrice).then(|| price(body, 32)),
            })
        }
        MessageType::ReduceOrder => ItchMessage::ReduceOrder(ReduceOrder {
            header,
            order_id: order_id(body, 11),
            shares: shares(body, 19),
        }),
        MessageType::DeleteOrder => ItchMessage::DeleteOrder(DeleteOrder {
            header,
            order_id: order_id(body, 11),
        }),
        MessageType::ReplaceOrder => ItchMessage::ReplaceOrder(ReplaceOrder {
            header,
            order_id: order_id(body, 11),
            new_order_id: order_id(body, 19),
            shares: shares(body, 27),
            price: price(body, 31),
        }),
        other => ItchMessage::Other {
            header,
            kind: other,
        },
    };
    Ok(message)
}
