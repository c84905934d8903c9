//! NASDAQ TotalView-ITCH 5.0 message model
//!
//! Every message is framed by a 2-byte big-endian length followed by the body.
//! The body starts with the type letter, the stock locate, the tracking number
//! and a 6-byte timestamp in nanoseconds since midnight. Order book messages
//! are decoded into typed structs; everything else is recognised by length
//! and skipped.

pub mod reader;

pub use reader::ItchReader;

use common::{Direction, Locate, OrderId, Px, Qty, Ts};

/// Size of the big-endian length prefix in front of every body
pub const LENGTH_PREFIX: usize = 2;

/// ITCH 5.0 message types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageType {
    /// 'S' system event
    SystemEvent,
    /// 'R' stock directory
    StockDirectory,
    /// 'H' stock trading action
    TradingAction,
    /// 'Y' Reg SHO short sale price test
    RegShoRestriction,
    /// 'L' market participant position
    MpidPosition,
    /// 'V' MWCB decline level
    MwcbDecline,
    /// 'W' MWCB status
    MwcbStatus,
    /// 'K' IPO quoting period update
    IpoQuoteUpdate,
    /// 'J' LULD auction collar
    LuldAuctionCollar,
    /// 'A' add order without attribution
    AddOrder,
    /// 'F' add order with MPID attribution
    AddOrderMpid,
    /// 'E' order executed
    ExecuteOrder,
    /// 'C' order executed with price
    ExecuteOrderWithPrice,
    /// 'X' order cancel
    ReduceOrder,
    /// 'D' order delete
    DeleteOrder,
    /// 'U' order replace
    ReplaceOrder,
    /// 'P' non-cross trade
    Trade,
    /// 'Q' cross trade
    CrossTrade,
    /// 'B' broken trade
    BrokenTrade,
    /// 'I' net order imbalance indicator
    NetOrderImbalance,
    /// 'N' retail price improvement indicator
    RetailPriceImprovement,
}

impl MessageType {
    /// Every known type
    pub const ALL: [Self; 21] = [
        Self::SystemEvent,
        Self::StockDirectory,
        Self::TradingAction,
        Self::RegShoRestriction,
        Self::MpidPosition,
        Self::MwcbDecline,
        Self::MwcbStatus,
        Self::IpoQuoteUpdate,
        Self::LuldAuctionCollar,
        Self::AddOrder,
        Self::AddOrderMpid,
        Self::ExecuteOrder,
        Self::ExecuteOrderWithPrice,
        Self::ReduceOrder,
        Self::DeleteOrder,
        Self::ReplaceOrder,
        Self::Trade,
        Self::CrossTrade,
        Self::BrokenTrade,
        Self::NetOrderImbalance,
        Self::RetailPriceImprovement,
    ];

    /// Parse a type byte
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            b'S' => Self::SystemEvent,
            b'R' => Self::StockDirectory,
            b'H' => Self::TradingAction,
            b'Y' => Self::RegShoRestriction,
            b'L' => Self::MpidPosition,
            b'V' => Self::MwcbDecline,
            b'W' => Self::MwcbStatus,
            b'K' => Self::IpoQuoteUpdate,
            b'J' => Self::LuldAuctionCollar,
            b'A' => Self::AddOrder,
            b'F' => Self::AddOrderMpid,
            b'E' => Self::ExecuteOrder,
            b'C' => Self::ExecuteOrderWithPrice,
            b'X' => Self::ReduceOrder,
            b'D' => Self::DeleteOrder,
            b'U' => Self::ReplaceOrder,
            b'P' => Self::Trade,
            b'Q' => Self::CrossTrade,
            b'B' => Self::BrokenTrade,
            b'I' => Self::NetOrderImbalance,
            b'N' => Self::RetailPriceImprovement,
            _ => return None,
        })
    }

    /// Type letter on the wire
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::SystemEvent => b'S',
            Self::StockDirectory => b'R',
            Self::TradingAction => b'H',
            Self::RegShoRestriction => b'Y',
            Self::MpidPosition => b'L',
            Self::MwcbDecline => b'V',
            Self::MwcbStatus => b'W',
            Self::IpoQuoteUpdate => b'K',
            Self::LuldAuctionCollar => b'J',
            Self::AddOrder => b'A',
            Self::AddOrderMpid => b'F',
            Self::ExecuteOrder => b'E',
            Self::ExecuteOrderWithPrice => b'C',
            Self::ReduceOrder => b'X',
            Self::DeleteOrder => b'D',
            Self::ReplaceOrder => b'U',
            Self::Trade => b'P',
            Self::CrossTrade => b'Q',
            Self::BrokenTrade => b'B',
            Self::NetOrderImbalance => b'I',
            Self::RetailPriceImprovement => b'N',
        }
    }

    /// Type letter as a char
    #[must_use]
    pub const fn as_char(self) -> char {
        self.as_byte() as char
    }

    /// Fixed body length, excluding the length prefix
    #[must_use]
    pub const fn body_len(self) -> usize {
        match self {
            Self::SystemEvent | Self::MwcbStatus => 12,
            Self::StockDirectory => 39,
            Self::TradingAction => 25,
            Self::RegShoRestriction | Self::RetailPriceImprovement => 20,
            Self::MpidPosition => 26,
            Self::MwcbDecline | Self::LuldAuctionCollar | Self::ReplaceOrder => 35,
            Self::IpoQuoteUpdate => 28,
            Self::AddOrder | Self::ExecuteOrderWithPrice => 36,
            Self::AddOrderMpid | Self::CrossTrade => 40,
            Self::ExecuteOrder => 31,
            Self::ReduceOrder => 23,
            Self::DeleteOrder | Self::BrokenTrade => 19,
            Self::Trade => 44,
            Self::NetOrderImbalance => 50,
        }
    }

    /// True for messages that mutate an order book
    #[must_use]
    pub const fn is_book_event(self) -> bool {
        matches!(
            self,
            Self::AddOrder
                | Self::AddOrderMpid
                | Self::ExecuteOrder
                | Self::ExecuteOrderWithPrice
                | Self::ReduceOrder
                | Self::DeleteOrder
                | Self::ReplaceOrder
        )
    }
}

/// Fields common to every message body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Instrument locate code
    pub locate: Locate,
    /// Nasdaq internal tracking number
    pub tracking: u16,
    /// Nanoseconds since midnight
    pub timestamp: Ts,
}

/// System event codes of interest
pub mod event_code {
    /// Start of messages
    pub const START_OF_MESSAGES: u8 = b'O';
    /// Start of system hours
    pub const START_OF_SYSTEM_HOURS: u8 = b'S';
    /// Start of market hours
    pub const START_OF_MARKET_HOURS: u8 = b'Q';
    /// End of market hours
    pub const END_OF_MARKET_HOURS: u8 = b'M';
    /// End of system hours
    pub const END_OF_SYSTEM_HOURS: u8 = b'E';
    /// End of messages
    pub const END_OF_MESSAGES: u8 = b'C';
}

/// 'A' and 'F'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOrder {
    /// Common header
    pub header: Header,
    /// Order reference number
    pub order_id: OrderId,
    /// Buy/sell indicator
    pub direction: Direction,
    /// Displayed shares
    pub shares: Qty,
    /// Limit price
    pub price: Px,
    /// MPID attribution, only on 'F'
    pub attribution: Option<[u8; 4]>,
}

/// 'E' and 'C'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOrder {
    /// Common header
    pub header: Header,
    /// Order reference number
    pub order_id: OrderId,
    /// Executed shares
    pub shares: Qty,
    /// Exchange match number
    pub match_number: u64,
    /// Execution price when it differs from the order's limit, only on 'C'
    pub price: Option<Px>,
}

/// 'X'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceOrder {
    /// Common header
    pub header: Header,
    /// Order reference number
    pub order_id: OrderId,
    /// Cancelled shares
    pub shares: Qty,
}

/// 'D'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOrder {
    /// Common header
    pub header: Header,
    /// Order reference number
    pub order_id: OrderId,
}

/// 'U'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOrder {
    /// Common header
    pub header: Header,
    /// Original order reference number
    pub order_id: OrderId,
    /// New order reference number
    pub new_order_id: OrderId,
    /// New displayed shares
    pub shares: Qty,
    /// New limit price
    pub price: Px,
}

/// Decoded ITCH message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItchMessage {
    /// 'S'
    SystemEvent {
        /// Common header
        header: Header,
        /// Event code, see [`event_code`]
        code: u8,
    },
    /// 'R'
    StockDirectory {
        /// Common header
        header: Header,
        /// Symbol with trailing padding removed
        stock: String,
        /// Listing market category
        market_category: u8,
    },
    /// 'A' or 'F'
    AddOrder(AddOrder),
    /// 'E' or 'C'
    ExecuteOrder(ExecuteOrder),
    /// 'X'
    ReduceOrder(ReduceOrder),
    /// 'D'
    DeleteOrder(DeleteOrder),
    /// 'U'
    ReplaceOrder(ReplaceOrder),
    /// Known message that carries no book state
    Other {
        /// Common header
        header: Header,
        /// Message type
        kind: MessageType,
    },
}

impl ItchMessage {
    /// Common header
    #[must_use]
    pub const fn header(&self) -> &Header {
        match self {
            Self::SystemEvent { header, .. }
            | Self::StockDirectory { header, .. }
            | Self::Other { header, .. } => header,
            Self::AddOrder(m) => &m.header,
            Self::ExecuteOrder(m) => &m.header,
            Self::ReduceOrder(m) => &m.header,
            Self::DeleteOrder(m) => &m.header,
            Self::ReplaceOrder(m) => &m.header,
        }
    }

    /// Message timestamp
    #[must_use]
    pub const fn timestamp(&self) -> Ts {
        self.header().timestamp
    }

    /// Wire type this message was decoded from
    #[must_use]
    pub const fn kind(&self) -> MessageType {
        match self {
            Self::SystemEvent { .. } => MessageType::SystemEvent,
            Self::StockDirectory { .. } => MessageType::StockDirectory,
            Self::AddOrder(m) if m.attribution.is_some() => MessageType::AddOrderMpid,
            Self::AddOrder(_) => MessageType::AddOrder,
            Self::ExecuteOrder(m) if m.price.is_some() => MessageType::ExecuteOrderWithPrice,
            Self::ExecuteOrder(_) => MessageType::ExecuteOrder,
            Self::ReduceOrder(_) => MessageType::ReduceOrder,
            Self::DeleteOrder(_) => MessageType::DeleteOrder,
            Self::ReplaceOrder(_) => MessageType::ReplaceOrder,
            Self::Other { kind, .. } => *kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_byte_round_trip() {
        for kind in MessageType::ALL {
            assert_eq!(MessageType::from_byte(kind.as_byte()), Some(kind));
        }
        assert_eq!(MessageType::from_byte(b'Z'), None);
    }

    #[test]
    fn test_fixed_lengths() {
        assert_eq!(MessageType::AddOrder.body_len(), 36);
        assert_eq!(MessageType::AddOrderMpid.body_len(), 40);
        assert_eq!(MessageType::ExecuteOrder.body_len(), 31);
        assert_eq!(MessageType::ExecuteOrderWithPrice.body_len(), 36);
        assert_eq!(MessageType::ReduceOrder.body_len(), 23);
        assert_eq!(MessageType::DeleteOrder.body_len(), 19);
        assert_eq!(MessageType::ReplaceOrder.body_len(), 35);
        assert_eq!(MessageType::NetOrderImbalance.body_len(), 50);
        assert_eq!(
            MessageType::ALL.iter().filter(|k| k.is_book_event()).count(),
            7
        );
    }
}
