//! Counts the primes up to a bound with a Sieve of Eratosthenes spread over cooperating workers.
//!
//! Only odd integers are stored. The odd integers of `[3, n]` are split into contiguous
//! ranges, one per worker, by the [`partition`] module, and each worker keeps one flag per
//! owned integer in a [`store::LocalStore`].
//!
//! **Communication**: The [`sieve_communication`] crate spawns the workers and provides the
//! barrier, broadcast and reduce collectives they coordinate with.
//!
//! **Protocol**: The [`worker`] module runs the rounds. Worker zero owns every prime up to
//! `√n`; it discovers the next sieving prime in its own storage with a [`cursor::PrimeCursor`]
//! and broadcasts it, every worker strikes out that prime's odd multiples in its range, and
//! once the primes are exhausted the unmarked entries are summed at worker zero. The prime 2
//! is added back at the end.
//!
//! **Logging**: The [`logging`] module defines the events a worker records, through the
//! buffered loggers of the [`sieve_logging`] crate.
//!
//! # Examples
//!
//! ```
//! // count the primes up to 100 with four workers.
//! let summary = sieve::execute(sieve::Config::process(4), 100).unwrap();
//! assert_eq!(summary.count, 25);
//! println!("{}", summary);
//! ```

#![forbid(missing_docs)]

pub use execute::{execute, execute_directly, Config, Invocation, Summary};
#[cfg(feature = "getopts")]
pub use execute::parse_args;
pub use error::SieveError;
pub use sieve_communication::Config as CommunicationConfig;

/// Re-export of the `sieve_communication` crate.
pub mod communication {
    pub use sieve_communication::*;
}
/// Re-export of the `sieve_logging` crate.
///
/// Named apart from this crate's own [`logging`] module, which holds the sieve's events.
pub mod logging_core {
    pub use sieve_logging::*;
}

pub mod cursor;
pub mod error;
pub mod execute;
pub mod logging;
pub mod partition;
pub mod store;
pub mod worker;
