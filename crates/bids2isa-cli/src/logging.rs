//! Log output on stderr, filtered by `BIDS2ISA_LOG`, then `RUST_LOG`, then
//! the `-v` / `-q` flags (default `info`).

use tracing::Level;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "BIDS2ISA_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (true, _) => Self::Verbose,
            (false, true) => Self::Quiet,
            (false, false) => Self::Normal,
        }
    }

    fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
        }
    }
}

pub fn init(verbosity: Verbosity) {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbosity, std::env::var(LOG_ENV).ok()))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .with_target(verbosity == Verbosity::Verbose)
        .without_time()
        .init();
}

/// An unparseable directive string falls through to the next source.
fn filter_for(verbosity: Verbosity, directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(verbosity.level().as_str()))
}
