//! Failure modes of a sieve run.
//!
//! Every error is fatal. The conditions behind `Usage` and `Configuration` depend only on
//! values all workers share, so every worker reaches the same verdict without talking to
//! the others.

use thiserror::Error;

/// Reasons a sieve run stops without producing a count.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SieveError {
    /// Wrong number of arguments, or an argument that is not a usable bound.
    #[error("{reason}\nCommand line: {program} [options] <n>")]
    Usage {
        /// Name the program was invoked as.
        program: String,
        /// What was wrong with the arguments.
        reason: String,
    },
    /// The coordinator's share of the range does not reach the square root of the bound.
    #[error("Too many processes: {peers} workers cannot sieve up to {n}")]
    Configuration {
        /// Upper bound of the sieve.
        n: u64,
        /// Number of workers requested.
        peers: usize,
    },
    /// A worker could not allocate its share of the sieve.
    #[error("Cannot allocate enough memory: worker {index} needs {size} entries")]
    Resource {
        /// Index of the failing worker.
        index: usize,
        /// Number of entries the worker tried to allocate.
        size: usize,
    },
    /// The worker stopped because a peer failed.
    #[error("worker {index} stopped after a peer failed")]
    Aborted {
        /// Index of the stopped worker.
        index: usize,
    },
    /// Worker threads could not be started or did not finish.
    #[error("error in computation: {0}")]
    Startup(String),
}

impl SieveError {
    /// Process exit status to report for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// True for errors that a worker observed itself, rather than learned about from a peer.
    pub fn is_primary(&self) -> bool {
        !matches!(self, SieveError::Aborted { .. })
    }
}
