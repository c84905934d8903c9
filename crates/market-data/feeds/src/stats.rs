//! Whole-file message statistics

use crate::error::FeedResult;
use crate::itch::ItchReader;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Message counts per type letter for one pass over a feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Messages seen per type letter
    pub counts: BTreeMap<char, u64>,
    /// Messages decoded
    pub total: u64,
    /// Bytes consumed
    pub bytes: usize,
    /// Wall time spent decoding
    pub elapsed: Duration,
}

impl ScanStats {
    /// Count for one type letter
    #[must_use]
    pub fn count(&self, kind: char) -> u64 {
        self.counts.get(&kind).copied().unwrap_or_default()
    }

    /// Mean decode time per message
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn nanos_per_message(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.elapsed.as_nanos() as f64 / self.total as f64
    }
}

impl fmt::Display for ScanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, count) in &self.counts {
            writeln!(f, "{kind}: {count}")?;
        }
        write!(
            f,
            "{} messages in {} nanos, {:.2} nanos per message",
            self.total,
            self.elapsed.as_nanos(),
            self.nanos_per_message()
        )
    }
}

/// Decode every remaining message, counting by type
///
/// # Errors
/// The first decoding error stops the scan.
pub fn scan_stats(reader: &mut ItchReader<'_>) -> FeedResult<ScanStats> {
    let start_offset = reader.position();
    let started = Instant::now();
    let mut stats = ScanStats::default();
    while let Some(message) = reader.next_message()? {
        *stats.counts.entry(message.kind().as_char()).or_default() += 1;
        stats.total += 1;
    }
    stats.elapsed = started.elapsed();
    stats.bytes = reader.position() - start_offset;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Direction;
    use test_utils::ItchFeedBuilder;

    #[test]
    fn test_counts_per_type() -> Result<(), crate::FeedError> {
        let data = ItchFeedBuilder::new()
            .system_event(1, b'O')
            .add_order(2, 1, 1, Direction::Buy, 10, "QQQ", 1)
            .add_order(3, 1, 2, Direction::Buy, 10, "QQQ", 1)
            .add_order_mpid(4, 1, 3, Direction::Sell, 10, "QQQ", 2, *b"MSCO")
            .delete(5, 1, 1)
            .other(b'P', 44, 6, 1)
            .build();
        let stats = scan_stats(&mut ItchReader::new(&data))?;

        assert_eq!(stats.total, 5 + 1);
        assert_eq!(stats.count('A'), 2);
        assert_eq!(stats.count('F'), 1);
        assert_eq!(stats.count('P'), 1);
        assert_eq!(stats.count('E'), 0);
        assert_eq!(stats.bytes, data.len());
        let text = stats.to_string();
        assert!(text.starts_with("A: 2\nD: 1\nF: 1\nP: 1\nS: 1\n6 messages in "));
        Ok(())
    }
}
