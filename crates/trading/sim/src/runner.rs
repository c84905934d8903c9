//! Single and multi-threaded replay drivers
//!
//! Both drivers map the ITCH file, resolve instruments from the stock
//! directory preamble and then step an [`EventScheduler`] over the book
//! events. The single-threaded driver feeds one inline strategy after every
//! step. The multi-threaded one runs one [`TestStrategy`] per subscribed
//! instrument on its own thread, each polling that instrument's ring while
//! a writer thread replays the feed.

use crate::config::{RunMode, SimConfig};
use crate::diagnostics::StrategyDiagnostics;
use crate::error::SchedulerError;
use crate::events::ItchEventSource;
use crate::manager::{BooksManager, TopOfBookBuffer};
use crate::pinning::{check_cores, pin_current_thread};
use crate::scheduler::EventScheduler;
use crate::strategy::{Strategy, TestStrategy, TrivialStrategy};
use anyhow::{Context, Result, anyhow};
use common::{Locate, Ts};
use feeds::{ItchReader, MappedFile, Symbols};
use lob::OrderBook;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info};

type Replay<'a> = EventScheduler<ItchEventSource<'a>, BooksManager<OrderBook>>;

/// One strategy's outcome
#[derive(Debug, Clone)]
pub struct SymbolReport {
    /// Instrument the strategy followed
    pub symbol: String,
    /// What it saw
    pub diagnostics: StrategyDiagnostics,
    /// Where the diagnostics were written
    pub saved_to: PathBuf,
}

/// Outcome of a replay
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Threading mode used
    pub mode: RunMode,
    /// Scheduler steps taken
    pub steps: u64,
    /// True if the feed ran out before the iteration budget
    pub end_of_stream: bool,
    /// Top-of-book updates pushed to rings
    pub published: u64,
    /// Instruments with a book
    pub books: usize,
    /// Wall time of the replay itself
    pub elapsed: Duration,
    /// Per-strategy results
    pub strategies: Vec<SymbolReport>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:?} replay: {} steps in {:.3}s{}, {} books, {} updates published",
            self.mode,
            self.steps,
            self.elapsed.as_secs_f64(),
            if self.end_of_stream { " (end of stream)" } else { "" },
            self.books,
            self.published
        )?;
        for report in &self.strategies {
            writeln!(f, "Diagnostics for {}", report.symbol)?;
            write!(f, "{}", report.diagnostics.summary())?;
        }
        Ok(())
    }
}

/// Run in the mode the configuration asks for
///
/// # Errors
/// Invalid configuration, unreadable input, unknown symbols, pinning
/// failures and any replay error other than the feed running out.
pub fn run(config: &SimConfig) -> Result<RunReport> {
    match config.mode {
        RunMode::Single => run_single_threaded(config),
        RunMode::Multi => run_multi_threaded(config),
    }
}

/// Replay on the calling thread, feeding the single-thread symbol's top to
/// a [`TrivialStrategy`] after every step
///
/// # Errors
/// See [`run`].
pub fn run_single_threaded(config: &SimConfig) -> Result<RunReport> {
    config.validate()?;
    let file = open(config)?;
    let mut reader = ItchReader::new(file.bytes());
    let symbols = Symbols::scan(&mut reader)?;
    let locate = symbols.by_name(&config.single_thread_symbol)?;

    let mut manager = BooksManager::<OrderBook>::new(config.ring_capacity)?;
    let mut scheduler = EventScheduler::new(ItchEventSource::new(reader))?;
    let mut strategy = TrivialStrategy::default();

    let started = Instant::now();
    let (steps, end_of_stream) = drive(
        &mut scheduler,
        &mut manager,
        config.iterations,
        |ts, manager| {
            let top = manager.book(locate).map(OrderBook::top).unwrap_or_default();
            strategy.on_update(ts, &top);
        },
    )?;
    let elapsed = started.elapsed();

    let diagnostics = strategy.into_diagnostics();
    let saved_to = config.diagnostics_path("ST", &config.single_thread_symbol);
    diagnostics.save(&saved_to)?;

    Ok(RunReport {
        mode: RunMode::Single,
        steps,
        end_of_stream,
        published: manager.published(),
        books: manager.books_count(),
        elapsed,
        strategies: vec![SymbolReport {
            symbol: config.single_thread_symbol.clone(),
            diagnostics,
            saved_to,
        }],
    })
}

/// Replay on a writer thread while one [`TestStrategy`] thread per
/// configured symbol polls that symbol's ring
///
/// With pinning on, strategy `i` runs on core `core_offset + i` and the
/// writer on the core after the last strategy.
///
/// # Errors
/// See [`run`]. A strategy that fails to pin or save stops only itself; its
/// error is returned once all threads have been joined.
pub fn run_multi_threaded(config: &SimConfig) -> Result<RunReport> {
    config.validate()?;
    let file = open(config)?;
    let mut reader = ItchReader::new(file.bytes());
    let symbols = Symbols::scan(&mut reader)?;

    let mut manager = BooksManager::<OrderBook>::new(config.ring_capacity)?;
    let subscriptions = config
        .symbols
        .iter()
        .map(|name| {
            let locate: Locate = symbols.by_name(name)?;
            Ok((name.clone(), manager.ensure_buffer(locate)))
        })
        .collect::<Result<Vec<(String, Arc<TopOfBookBuffer>)>>>()?;

    let writer_core = config.core_offset.saturating_add(subscriptions.len());
    if config.pin_cores {
        check_cores(config.core_offset, subscriptions.len() + 1)?;
    }

    let mut scheduler = EventScheduler::new(ItchEventSource::new(reader))?;
    let running = AtomicBool::new(true);

    let (writer_outcome, strategy_outcomes) = thread::scope(|scope| {
        let running = &running;
        let readers = subscriptions
            .iter()
            .enumerate()
            .map(|(i, (name, ring))| {
                thread::Builder::new()
                    .name(format!("strategy-{name}"))
                    .spawn_scoped(scope, move || {
                        run_strategy(config, i, name, ring, running)
                    })
            })
            .collect::<Vec<_>>();

        let manager = &mut manager;
        let scheduler = &mut scheduler;
        let writer = thread::Builder::new()
            .name("writer".to_string())
            .spawn_scoped(scope, move || {
                let outcome = run_writer(config, writer_core, scheduler, manager);
                running.store(false, Ordering::Release);
                outcome
            });
        if writer.is_err() {
            running.store(false, Ordering::Release);
        }

        let writer_outcome = writer
            .context("Failed to spawn writer thread")
            .and_then(|handle| {
                handle
                    .join()
                    .map_err(|_| anyhow!("writer thread panicked"))?
            });
        let strategy_outcomes = readers
            .into_iter()
            .map(|spawned| {
                spawned
                    .context("Failed to spawn strategy thread")?
                    .join()
                    .map_err(|_| anyhow!("strategy thread panicked"))?
            })
            .collect::<Vec<Result<SymbolReport>>>();
        (writer_outcome, strategy_outcomes)
    });

    let (steps, end_of_stream, elapsed) = writer_outcome?;
    let strategies = strategy_outcomes.into_iter().collect::<Result<Vec<_>>>()?;

    Ok(RunReport {
        mode: RunMode::Multi,
        steps,
        end_of_stream,
        published: manager.published(),
        books: manager.books_count(),
        elapsed,
        strategies,
    })
}

fn open(config: &SimConfig) -> Result<MappedFile> {
    MappedFile::open(&config.data_file)
        .with_context(|| format!("Failed to open {}", config.data_file.display()))
}

fn run_writer(
    config: &SimConfig,
    core: usize,
    scheduler: &mut Replay<'_>,
    manager: &mut BooksManager<OrderBook>,
) -> Result<(u64, bool, Duration)> {
    if config.pin_cores {
        pin_current_thread(core)?;
    }
    thread::sleep(Duration::from_millis(config.writer_warmup_ms));

    let started = Instant::now();
    let (steps, end_of_stream) = drive(scheduler, manager, config.iterations, |_, _| {})?;
    Ok((steps, end_of_stream, started.elapsed()))
}

fn run_strategy(
    config: &SimConfig,
    index: usize,
    symbol: &str,
    ring: &TopOfBookBuffer,
    running: &AtomicBool,
) -> Result<SymbolReport> {
    if config.pin_cores {
        pin_current_thread(config.core_offset.saturating_add(index))?;
    }
    let mut strategy = TestStrategy::new(config.window);
    strategy.run_loop(running, ring, config.strategy_batch);
    let (buys, sells) = strategy.signals();
    info!("{} strategy done: {} buy and {} sell signals", symbol, buys, sells);

    let diagnostics = strategy.into_diagnostics();
    let saved_to = config.diagnostics_path("MT", symbol);
    diagnostics.save(&saved_to)?;
    Ok(SymbolReport {
        symbol: symbol.to_string(),
        diagnostics,
        saved_to,
    })
}

/// Step up to `iterations` times, calling `after_step` after each step
///
/// Returns the steps taken and whether the feed ran out first.
fn drive(
    scheduler: &mut Replay<'_>,
    manager: &mut BooksManager<OrderBook>,
    iterations: u64,
    mut after_step: impl FnMut(Ts, &BooksManager<OrderBook>),
) -> Result<(u64, bool)> {
    for step in 0..iterations {
        match scheduler.step(manager) {
            Ok(ts) => after_step(ts, &*manager),
            Err(SchedulerError::EndOfStream) => {
                info!("End of messages after {} steps", step);
                return Ok((step, true));
            }
            Err(e) => {
                error!("Replay stopped at step {}: {}", step, e);
                return Err(anyhow::Error::new(e).context(format!("Replay failed at step {step}")));
            }
        }
    }
    info!("Completed {} steps", iterations);
    Ok((iterations, false))
}
