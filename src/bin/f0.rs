//! `f0` estimates the number of distinct lines read from files or stdin.
//!
//! ```text
//! $ cat access.log | f0 --epsilon 0.05 --top-k 3
//! 48213
//! 1024	GET /index.html
//! 512	GET /favicon.ico
//! 256	GET /robots.txt
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use f0_estimator::coin::{BitAndCoin, UniformRangeCoin};
use f0_estimator::config::{DEFAULT_DELTA, DEFAULT_EPSILON};
use f0_estimator::{CardinalityEstimator, Coin, Config};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Estimate the number of distinct lines in a stream")]
struct Cli {
    /// Input files, stdin when empty or `-`
    files: Vec<PathBuf>,

    /// Relative-error target
    #[arg(short, long, default_value_t = DEFAULT_EPSILON)]
    epsilon: f64,

    /// Failure-probability target
    #[arg(short, long, default_value_t = DEFAULT_DELTA)]
    delta: f64,

    /// Upper bound on the number of lines, used to size the sample
    #[arg(short = 'n', long, default_value_t = u64::MAX)]
    max_items: u64,

    /// Report the approximate `K` most frequent lines
    #[arg(short = 'k', long, value_name = "K", default_value_t = 0)]
    top_k: usize,

    /// Never report more distinct lines than lines read
    #[arg(long)]
    cheat: bool,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Formulation of the sampling coin
    #[arg(long, value_enum, default_value_t = CoinArg::BitAnd)]
    coin: CoinArg,

    /// Log exact and estimated counts every `N` lines (keeps every distinct line in memory)
    #[arg(long, value_name = "N")]
    debug_every: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CoinArg {
    BitAnd,
    UniformRange,
}

impl From<CoinArg> for Coin {
    fn from(arg: CoinArg) -> Self {
        match arg {
            CoinArg::BitAnd => Coin::BitAnd(BitAndCoin),
            CoinArg::UniformRange => Coin::UniformRange(UniformRangeCoin),
        }
    }
}

/// Exact distinct count kept on the side to log running accuracy
struct AccuracyTracker {
    every: u64,
    distinct: HashSet<Vec<u8>>,
}

impl AccuracyTracker {
    fn new(every: u64) -> Self {
        Self {
            every,
            distinct: HashSet::new(),
        }
    }

    fn record(&mut self, line: &[u8]) {
        if !self.distinct.contains(line) {
            self.distinct.insert(line.to_vec());
        }
    }

    fn report(&self, estimator: &CardinalityEstimator<Vec<u8>>) {
        let seen = estimator.total_seen();
        if seen % self.every != 0 {
            return;
        }
        let exact = self.distinct.len();
        let estimate = estimator.estimate();
        let relative_error = if exact == 0 {
            0.0
        } else {
            (estimate as f64 - exact as f64).abs() / exact as f64
        };
        info!(
            seen,
            exact,
            estimate,
            relative_error,
            round = estimator.round(),
            "running accuracy"
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(log_level(cli.verbose, cli.debug_every.is_some()));

    let config = Config::default()
        .with_max_items(cli.max_items)
        .with_epsilon(cli.epsilon)
        .with_delta(cli.delta)
        .with_top_k(cli.top_k)
        .with_cheat(cli.cheat)
        .with_coin(cli.coin);
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut estimator =
        CardinalityEstimator::with_rng(config, rng).context("invalid estimator configuration")?;
    let mut tracker = cli.debug_every.filter(|&n| n > 0).map(AccuracyTracker::new);

    let inputs = if cli.files.is_empty() {
        vec![PathBuf::from("-")]
    } else {
        cli.files
    };
    for path in &inputs {
        let reader = open(path)?;
        observe_lines(reader, &mut estimator, tracker.as_mut())
            .with_context(|| format!("failed to read {}", path.display()))?;
    }

    debug!(
        total_seen = estimator.total_seen(),
        round = estimator.round(),
        sample = estimator.sample_len(),
        capacity = estimator.capacity(),
        "finished reading input"
    );

    let mut out = io::stdout().lock();
    write!(out, "{}", estimator.estimate())?;
    if estimator.is_exact() {
        write!(out, " (exact)")?;
    }
    writeln!(out)?;
    for (item, weight) in estimator.top_k() {
        writeln!(out, "{weight}\t{}", String::from_utf8_lossy(item))?;
    }
    out.flush()?;

    Ok(())
}

/// Open `path` for line reading, `-` stands for stdin
fn open(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Observe every line of `reader` as raw bytes, so input need not be UTF-8
fn observe_lines(
    reader: impl BufRead,
    estimator: &mut CardinalityEstimator<Vec<u8>>,
    mut tracker: Option<&mut AccuracyTracker>,
) -> io::Result<()> {
    for line in reader.split(b'\n') {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if let Some(tracker) = tracker.as_deref_mut() {
            tracker.record(&line);
        }
        estimator.observe(line);
        if let Some(tracker) = tracker.as_deref() {
            tracker.report(estimator);
        }
    }
    Ok(())
}

/// Filter directive for `-v` count, `--debug-every` needs at least `info`
fn log_level(verbose: u8, debug_every: bool) -> &'static str {
    match verbose {
        0 if debug_every => "info",
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// Log to stderr, `RUST_LOG` takes precedence over `-v`
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Cursor;
    use test_case::test_case;

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "f0",
            "-e",
            "0.05",
            "-k",
            "3",
            "--coin",
            "uniform-range",
            "--cheat",
            "a.txt",
            "b.txt",
        ]);
        assert_eq!(cli.epsilon, 0.05);
        assert_eq!(cli.delta, DEFAULT_DELTA);
        assert_eq!(cli.top_k, 3);
        assert!(cli.cheat);
        assert_eq!(cli.coin, CoinArg::UniformRange);
        assert_eq!(cli.files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
    }

    #[test_case(0, false => "warn")]
    #[test_case(0, true => "info"; "debug every")]
    #[test_case(1, false => "debug")]
    #[test_case(2, false => "trace")]
    #[test_case(5, true => "trace"; "many")]
    fn test_log_level(verbose: u8, debug_every: bool) -> &'static str {
        log_level(verbose, debug_every)
    }

    #[test]
    fn test_observe_lines_accepts_non_utf8() {
        let config = Config::default().with_top_k(1);
        let mut estimator =
            CardinalityEstimator::with_rng(config, StdRng::seed_from_u64(1)).unwrap();
        let input = b"caf\xe9\r\nplain\n\xff\xfe\ncaf\xe9\nplain".to_vec();

        observe_lines(Cursor::new(input), &mut estimator, None).unwrap();

        assert_eq!(estimator.total_seen(), 5);
        assert_eq!(estimator.estimate(), 3);
        assert_eq!(estimator.top_k(), vec![(&b"caf\xe9".to_vec(), 2)]);
    }

    #[test]
    fn test_observe_lines_tracks_exact_count() {
        let mut estimator = CardinalityEstimator::new(Config::default()).unwrap();
        let mut tracker = AccuracyTracker::new(2);

        observe_lines(Cursor::new("a\nb\na\n"), &mut estimator, Some(&mut tracker)).unwrap();

        assert_eq!(tracker.distinct.len(), 2);
        assert_eq!(estimator.estimate(), 2);
    }
}
