//! lobsim - replay ITCH 5.0 sessions into limit order books

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)] // Handled by cargo-deny configuration
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use common::Locate;
use feeds::{ItchReader, MappedFile, Symbols, scan_stats};
use sim::{RunMode, SimConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lobsim")]
#[command(about = "ITCH 5.0 limit order book replay simulator")]
#[command(version)]
struct Cli {
    /// Log filter, e.g. `info` or `sim=debug`; falls back to `RUST_LOG`
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a session through the books and strategies
    Run(RunArgs),
    /// Print the stock directory of a session
    Symbols {
        /// ITCH file
        #[arg(long)]
        file: PathBuf,
        /// Only list symbols starting with this prefix
        #[arg(long)]
        filter: Option<String>,
    },
    /// Count messages per type
    Scan {
        /// ITCH file
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// Configuration file; `LOBSIM_*` variables override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// ITCH file
    #[arg(long)]
    file: Option<PathBuf>,
    /// Maximum scheduler steps
    #[arg(long)]
    iterations: Option<u64>,
    /// Threading mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Symbol to follow; repeat for several
    #[arg(long = "symbol")]
    symbols: Vec<String>,
    /// Leave threads unpinned
    #[arg(long)]
    no_pin: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Single,
    Multi,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => Self::Single,
            ModeArg::Multi => Self::Multi,
        }
    }
}

impl RunArgs {
    fn load(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => SimConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut SimConfig) {
        if let Some(file) = &self.file {
            config.data_file.clone_from(file);
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if !self.symbols.is_empty() {
            // A single symbol is also what the single-threaded run follows
            if let [only] = self.symbols.as_slice() {
                config.single_thread_symbol.clone_from(only);
            }
            config.symbols.clone_from(&self.symbols);
        }
        if self.no_pin {
            config.pin_cores = false;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = cli.log.as_deref().map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        EnvFilter::new,
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_timer(fmt::time::uptime()),
        )
        .init();

    match cli.command {
        Commands::Run(args) => {
            let config = args.load()?;
            info!("Replaying {} ({:?} mode)", config.data_file.display(), config.mode);
            let report = sim::run(&config)?;
            print!("{report}");
        }
        Commands::Symbols { file, filter } => {
            let file = MappedFile::open(&file)
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let symbols = Symbols::scan(&mut ItchReader::new(file.bytes()))?;
            for (name, locate) in listed(&symbols, filter.as_deref()) {
                println!("{:>6} {}", locate.as_u16(), name);
            }
        }
        Commands::Scan { file } => {
            let file = MappedFile::open(&file)
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let stats = scan_stats(&mut ItchReader::new(file.bytes()))?;
            print!("{stats}");
        }
    }

    Ok(())
}

fn listed<'a>(
    symbols: &'a Symbols,
    prefix: Option<&'a str>,
) -> impl Iterator<Item = (&'a str, Locate)> + 'a {
    symbols
        .iter()
        .filter(move |(name, _)| prefix.is_none_or(|p| name.starts_with(p)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run_args(args: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(std::iter::once("lobsim").chain(args.iter().copied()));
        match cli.map(|cli| cli.command) {
            Ok(Commands::Run(args)) => args,
            _ => panic!("not a run command: {args:?}"),
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = run_args(&[
            "run",
            "--file",
            "session.itch",
            "--iterations",
            "42",
            "--mode",
            "multi",
            "--symbol",
            "AMD",
            "--symbol",
            "IWM",
            "--no-pin",
        ]);
        let mut config = SimConfig::default();
        args.apply(&mut config);

        assert_eq!(config.data_file, PathBuf::from("session.itch"));
        assert_eq!(config.iterations, 42);
        assert_eq!(config.mode, RunMode::Multi);
        assert_eq!(config.symbols, vec!["AMD".to_string(), "IWM".to_string()]);
        assert_eq!(config.single_thread_symbol, "QQQ");
        assert!(!config.pin_cores);
    }

    #[test]
    fn test_single_symbol_selects_single_thread_symbol() {
        let mut config = SimConfig::default();
        run_args(&["run", "--symbol", "SPY"]).apply(&mut config);
        assert_eq!(config.single_thread_symbol, "SPY");
        assert_eq!(config.mode, RunMode::Single);

        let mut untouched = SimConfig::default();
        RunArgs::default().apply(&mut untouched);
        assert_eq!(untouched.symbols, SimConfig::default().symbols);
        assert!(untouched.pin_cores);
    }

    #[test]
    fn test_symbol_filter() {
        let mut symbols = Symbols::default();
        symbols.insert(Locate::new(1), "QQQ");
        symbols.insert(Locate::new(2), "QQQM");
        symbols.insert(Locate::new(3), "SPY");

        let names = |prefix| listed(&symbols, prefix).map(|(n, _)| n).collect::<Vec<_>>();
        assert_eq!(names(Some("QQQ")), vec!["QQQ", "QQQM"]);
        assert_eq!(names(None).len(), 3);
    }
}
