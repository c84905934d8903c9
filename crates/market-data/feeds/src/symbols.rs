//! Locate code directory built from the pre-open stock directory messages

use crate::error::{FeedError, FeedResult};
use crate::itch::{ItchMessage, ItchReader, MessageType, event_code};
use common::Locate;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Two-way map between stock symbols and locate codes
#[derive(Debug, Clone, Default)]
pub struct Symbols {
    by_name: BTreeMap<String, Locate>,
    by_locate: FxHashMap<Locate, String>,
}

impl Symbols {
    /// Build the directory from the start of a feed
    ///
    /// Consumes messages up to and including the start-of-system-hours event,
    /// leaving the reader on the first message after it. Messages other than
    /// directory entries are skipped.
    ///
    /// # Errors
    /// Any framing or decoding error from the reader.
    pub fn scan(reader: &mut ItchReader<'_>) -> FeedResult<Self> {
        let mut symbols = Self::default();
        loop {
            match reader.peek_type()? {
                None => {
                    debug!("Feed ended before system hours, {} symbols", symbols.len());
                    break;
                }
                Some(MessageType::SystemEvent | MessageType::StockDirectory) => {
                    match reader.next_message()? {
                        Some(ItchMessage::SystemEvent { code, .. })
                            if code == event_code::START_OF_SYSTEM_HOURS =>
                        {
                            break;
                        }
                        Some(ItchMessage::StockDirectory { header, stock, .. }) => {
                            symbols.insert(header.locate, stock);
                        }
                        _ => {}
                    }
                }
                Some(_) => {
                    reader.skip()?;
                }
            }
        }
        info!("Loaded {} symbols", symbols.len());
        Ok(symbols)
    }

    /// Record one directory entry
    pub fn insert(&mut self, locate: Locate, name: impl Into<String>) {
        let name = name.into();
        self.by_locate.insert(locate, name.clone());
        self.by_name.insert(name, locate);
    }

    /// Locate code for a symbol
    ///
    /// # Errors
    /// [`FeedError::SymbolNotFound`] if the symbol is not listed.
    pub fn by_name(&self, name: &str) -> FeedResult<Locate> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| FeedError::SymbolNotFound(name.to_owned()))
    }

    /// Symbol for a locate code
    #[must_use]
    pub fn by_locate(&self, locate: Locate) -> Option<&str> {
        self.by_locate.get(&locate).map(String::as_str)
    }

    /// Number of listed symbols
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True if nothing is listed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Symbols in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Locate)> {
        self.by_name.iter().map(|(name, locate)| (name.as_str(), *locate))
    }
}
