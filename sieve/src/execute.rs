//! Starts a sieve computation from configuration information.

use std::fmt;
use std::time::{Duration, Instant};

use sieve_communication::allocator::thread::Thread;
use sieve_communication::logging::CommunicationEvent;
use sieve_communication::{initialize, Collectives, Config as CommunicationConfig};
use sieve_logging::Registry;

use crate::error::SieveError;
use crate::logging::{install_stderr, SieveEvent, COMMUNICATION_STREAM, SIEVE_STREAM};
use crate::worker::{sieve_worker, WorkerOutcome, COORDINATOR};

/// Configures the execution of a sieve computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Configuration for the communication infrastructure.
    pub communication: CommunicationConfig,
    /// Stream worker events to standard error.
    pub report: bool,
}

impl Config {
    /// Constructs a `Config` that uses one worker thread.
    pub fn thread() -> Config {
        Config { communication: CommunicationConfig::Thread, report: false }
    }

    /// Constructs a `Config` that uses `n` worker threads.
    pub fn process(n: usize) -> Config {
        Config { communication: CommunicationConfig::Process(n), report: false }
    }

    /// The number of workers the configuration starts.
    pub fn workers(&self) -> usize {
        self.communication.workers()
    }

    /// Installs the options this configuration reads into `opts`.
    #[cfg(feature = "getopts")]
    pub fn install_options(opts: &mut getopts::Options) {
        CommunicationConfig::install_options(opts);
        opts.optflag("r", "report", "stream worker events to stderr");
        opts.optflag("h", "help", "print this help menu");
    }

    /// Instantiates a configuration from options installed by [`Self::install_options`].
    #[cfg(feature = "getopts")]
    pub fn from_matches(matches: &getopts::Matches) -> Result<Config, String> {
        Ok(Config {
            communication: CommunicationConfig::from_matches(matches)?,
            report: matches.opt_present("report"),
        })
    }
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Count the primes up to the bound.
    Run(Config, u64),
    /// Print the usage text.
    Help(String),
}

/// Parses a command line, program name first.
///
/// Most commonly, callers supply `std::env::args()` as the iterator.
#[cfg(feature = "getopts")]
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Invocation, SieveError> {
    let mut args = args.into_iter();
    let program = args.next().unwrap_or_else(|| "sieve".to_owned());
    let usage = |reason: String| SieveError::Usage { program: program.clone(), reason };

    let mut opts = getopts::Options::new();
    Config::install_options(&mut opts);
    let matches = opts.parse(args).map_err(|e| usage(e.to_string()))?;

    if matches.opt_present("help") {
        let brief = format!("Command line: {} [options] <n>", program);
        return Ok(Invocation::Help(opts.usage(&brief)));
    }

    let config = Config::from_matches(&matches).map_err(usage)?;
    let n = match matches.free.as_slice() {
        [bound] => bound
            .parse::<u64>()
            .map_err(|e| usage(format!("invalid bound {:?}: {}", bound, e)))?,
        free => return Err(usage(format!("expected one bound, found {} arguments", free.len()))),
    };
    if n < 2 {
        return Err(usage(format!("the bound must be at least 2, not {}", n)));
    }
    Ok(Invocation::Run(config, n))
}

/// The result of a completed sieve computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Upper bound of the sieve.
    pub n: u64,
    /// Number of workers.
    pub peers: usize,
    /// Number of primes less than or equal to `n`.
    pub count: u64,
    /// Coordinator time from the start barrier to the end of the reduction.
    pub elapsed: Duration,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "There are {} primes less than or equal to {}", self.count, self.n)?;
        write!(f, "SIEVE ({}) {:10.6}", self.peers, self.elapsed.as_secs_f64())
    }
}

/// Counts the primes up to `n` on the calling thread.
///
/// # Examples
/// ```rust
/// let summary = sieve::execute_directly(30).unwrap();
/// assert_eq!(summary.count, 10);
/// ```
pub fn execute_directly(n: u64) -> Result<Summary, SieveError> {
    let collectives = Collectives::new(Thread::default());
    let outcome = sieve_worker(collectives, n, None)?;
    summarize(vec![Ok(Ok(outcome))], n, 1)
}

/// Counts the primes up to `n` using the workers `config` describes.
///
/// Blocks until every worker has finished. If workers fail, the error reported is one a
/// worker observed itself, in preference to a peer's report that it stopped.
///
/// # Examples
/// ```rust
/// let summary = sieve::execute(sieve::Config::process(4), 100).unwrap();
/// assert_eq!(summary.count, 25);
/// assert_eq!(summary.peers, 4);
/// ```
pub fn execute(config: Config, n: u64) -> Result<Summary, SieveError> {
    let peers = config.workers();
    let report = config.report;

    let guards = initialize(config.communication, move |allocator| {
        let mut collectives = Collectives::new(allocator);
        let mut registry = Registry::new(Instant::now(), collectives.index());
        if report {
            install_stderr(&mut registry);
        }
        collectives.set_logging(registry.get::<CommunicationEvent>(COMMUNICATION_STREAM));
        sieve_worker(collectives, n, registry.get::<SieveEvent>(SIEVE_STREAM))
    })
    .map_err(SieveError::Startup)?;

    summarize(guards.join(), n, peers)
}

/// Reduces per-worker results to the coordinator's summary or the most telling error.
fn summarize(
    results: Vec<Result<Result<WorkerOutcome, SieveError>, String>>,
    n: u64,
    peers: usize,
) -> Result<Summary, SieveError> {
    let mut outcomes = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result.map_err(SieveError::Startup) {
            Ok(Ok(outcome)) => outcomes.push(outcome),
            Ok(Err(error)) | Err(error) => errors.push(error),
        }
    }

    if let Some(error) = errors.iter().find(|error| error.is_primary()).or(errors.first()) {
        return Err(error.clone());
    }

    outcomes
        .into_iter()
        .find(|outcome| outcome.index == COORDINATOR)
        .and_then(|outcome| outcome.count.map(|count| Summary { n, peers, count, elapsed: outcome.elapsed }))
        .ok_or_else(|| SieveError::Startup("coordinator reported no count".to_owned()))
}
