//! Simulator configuration

use crate::error::SimError;
use bus::RingBuffer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Execution model for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Scheduler and strategy on one thread
    #[default]
    Single,
    /// Dedicated writer thread plus one polling thread per symbol
    Multi,
}

/// Replay run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// ITCH 5.0 capture to replay
    pub data_file: PathBuf,
    /// Upper bound on scheduler steps
    pub iterations: u64,
    /// Execution model
    pub mode: RunMode,
    /// Symbols polled by strategy threads in multi-threaded mode
    pub symbols: Vec<String>,
    /// Symbol observed by the inline strategy in single-threaded mode
    pub single_thread_symbol: String,
    /// Per-symbol ring capacity, a power of two
    pub ring_capacity: usize,
    /// Ring reads between checks of the running flag
    pub strategy_batch: usize,
    /// Delay before the writer starts so readers are already spinning
    pub writer_warmup_ms: u64,
    /// Output directory for diagnostics JSON
    pub diagnostics_dir: PathBuf,
    /// Pin each thread to its own core
    pub pin_cores: bool,
    /// First core used when pinning
    pub core_offset: usize,
    /// Rolling window of the microprice strategy
    pub window: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/itch.bin"),
            iterations: 10_000_000,
            mode: RunMode::Single,
            symbols: ["QQQ", "SPY", "AMD", "IWM"].map(String::from).to_vec(),
            single_thread_symbol: "QQQ".to_string(),
            ring_capacity: 64,
            strategy_batch: 10_000,
            writer_warmup_ms: 1_000,
            diagnostics_dir: PathBuf::from("diagnostics"),
            pin_cores: true,
            core_offset: 0,
            window: 100,
        }
    }
}

impl SimConfig {
    /// Load configuration from a file, then apply `LOBSIM_*` environment overrides
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("LOBSIM")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("symbols"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Reject settings the runner cannot work with
    ///
    /// # Errors
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<(), SimError> {
        RingBuffer::<crate::BookUpdate>::check_capacity(self.ring_capacity)?;
        if self.strategy_batch == 0 {
            return Err(SimError::InvalidConfig("strategy_batch must be positive".into()));
        }
        if self.window == 0 {
            return Err(SimError::InvalidConfig("window must be positive".into()));
        }
        if self.mode == RunMode::Multi && self.symbols.is_empty() {
            return Err(SimError::InvalidConfig(
                "multi-threaded mode needs at least one symbol".into(),
            ));
        }
        let pinned_threads = self.symbols.len() + 1;
        if self.mode == RunMode::Multi
            && self.pin_cores
            && self.core_offset.checked_add(pinned_threads).is_none()
        {
            return Err(SimError::InvalidConfig(format!(
                "core_offset {} leaves no room for {} pinned threads",
                self.core_offset, pinned_threads
            )));
        }
        Ok(())
    }

    /// Diagnostics output path for a run tag and symbol, e.g. `MT_QQQ.json`
    #[must_use]
    pub fn diagnostics_path(&self, tag: &str, symbol: &str) -> PathBuf {
        self.diagnostics_dir.join(format!("{tag}_{symbol}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ring_capacity, 64);
        assert_eq!(config.symbols, vec!["QQQ", "SPY", "AMD", "IWM"]);
        assert_eq!(
            config.diagnostics_path("ST", "QQQ"),
            PathBuf::from("diagnostics/ST_QQQ.json")
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "mode = \"multi\"\niterations = 500\nsymbols = [\"AMD\"]")?;
        file.flush()?;

        let config = SimConfig::from_file(file.path())?;
        assert_eq!(config.mode, RunMode::Multi);
        assert_eq!(config.iterations, 500);
        assert_eq!(config.symbols, vec!["AMD"]);
        assert_eq!(config.window, 100);
        Ok(())
    }

    #[test]
    fn test_rejects_bad_settings() {
        let bad_ring = SimConfig {
            ring_capacity: 100,
            ..SimConfig::default()
        };
        assert!(matches!(bad_ring.validate(), Err(SimError::Ring(_))));

        let no_symbols = SimConfig {
            mode: RunMode::Multi,
            symbols: Vec::new(),
            ..SimConfig::default()
        };
        assert!(matches!(no_symbols.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_core_offset_must_fit_every_pinned_thread() {
        let config = SimConfig {
            mode: RunMode::Multi,
            pin_cores: true,
            core_offset: usize::MAX - 2,
            ..SimConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        let unpinned = SimConfig {
            pin_cores: false,
            ..config
        };
        assert!(unpinned.validate().is_ok());
    }
}
