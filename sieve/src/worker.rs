//! The per-worker sieve protocol.
//!
//! Every worker runs the same sequence: take a range, allocate storage, then repeat rounds of
//! marking, discovery and broadcast until the sieving prime exceeds `√n`, and finally count
//! and reduce. Worker zero is the coordinator: it owns every sieving prime, discovers them in
//! its own storage, and broadcasts each one to the others.

use std::time::{Duration, Instant};

use sieve_communication::{Allocate, Collectives};

use crate::cursor::PrimeCursor;
use crate::error::SieveError;
use crate::logging::{CountEvent, DiscoveryEvent, PartitionEvent, RoundEvent, SieveLogger};
use crate::partition::{check_feasible, needs_sieving, SieveRange, FIRST_ODD_PRIME};
use crate::store::{first_index, LocalStore};

/// Index of the worker that discovers primes and receives the count.
pub const COORDINATOR: usize = 0;

/// What one worker reports once the protocol completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerOutcome {
    /// Index of the reporting worker.
    pub index: usize,
    /// Number of primes up to `n`, on the coordinator only.
    pub count: Option<u64>,
    /// Number of marking rounds run.
    pub rounds: usize,
    /// Time from the start barrier to the end of the reduction.
    pub elapsed: Duration,
}

/// A worker that has taken its range and allocated its storage.
pub struct SieveWorker<A: Allocate> {
    n: u64,
    collectives: Collectives<A>,
    range: SieveRange,
    store: LocalStore,
    logging: Option<SieveLogger>,
}

impl<A: Allocate> SieveWorker<A> {
    /// Takes this worker's range of `[3, n]` and allocates storage for it.
    ///
    /// An infeasible configuration is detected by every worker independently, before any
    /// communication. Allocation outcomes are then agreed on by all workers, so a failure on
    /// one worker stops all of them: the failing worker reports `Resource` and the others
    /// report `Aborted`.
    pub fn new(collectives: Collectives<A>, n: u64, logging: Option<SieveLogger>) -> Result<Self, SieveError> {
        Self::with_allocation(collectives, n, logging, LocalStore::allocate)
    }

    /// As [`Self::new`], with `allocate(size, index)` producing the store.
    pub(crate) fn with_allocation<F>(
        mut collectives: Collectives<A>,
        n: u64,
        logging: Option<SieveLogger>,
        allocate: F,
    ) -> Result<Self, SieveError>
    where
        F: FnOnce(usize, usize) -> Result<LocalStore, SieveError>,
    {
        let index = collectives.index();
        let peers = collectives.peers();

        check_feasible(n, peers)?;
        let range = SieveRange::for_worker(n, peers, index);
        let store = allocate(range.size(), index);

        let failed = collectives.all_reduce(u64::from(store.is_err()), u64::max);
        let store = store?;
        if failed > 0 {
            return Err(SieveError::Aborted { index });
        }

        if let Some(logger) = &logging {
            logger.log(PartitionEvent { low_value: range.low_value, high_value: range.high_value, size: store.len() });
        }

        Ok(SieveWorker { n, collectives, range, store, logging })
    }

    /// The range this worker owns.
    pub fn range(&self) -> &SieveRange { &self.range }

    /// Runs the sieve to completion.
    pub fn run(mut self) -> WorkerOutcome {
        let index = self.collectives.index();
        let peers = self.collectives.peers();

        self.collectives.barrier();
        let timer = Instant::now();

        let mut cursor = (index == COORDINATOR).then(PrimeCursor::new);
        let mut prime = FIRST_ODD_PRIME;
        let mut rounds = 0;

        while needs_sieving(prime, self.n) {
            let first = match &cursor {
                Some(cursor) => cursor.first_index(),
                None => first_index(&self.range, prime),
            };
            let marked = self.store.mark_multiples(first, prime);
            if let Some(logger) = &self.logging {
                logger.log(RoundEvent { round: rounds, prime, first, marked });
            }

            if let Some(cursor) = cursor.as_mut() {
                prime = cursor.advance(&self.store);
                if let Some(logger) = &self.logging {
                    logger.log(DiscoveryEvent { index: cursor.index(), prime });
                }
            }
            if peers > 1 {
                prime = self.collectives.broadcast(COORDINATOR, prime);
            }
            rounds += 1;
        }

        let local = self.store.count_unmarked();
        let total = if peers > 1 {
            self.collectives.reduce(COORDINATOR, local, |x, y| x + y)
        } else {
            Some(local)
        };
        let elapsed = timer.elapsed();

        if let Some(logger) = &self.logging {
            logger.log(CountEvent { local, total });
        }

        // 2 is never stored.
        let count = total.map(|total| total + 1);
        WorkerOutcome { index, count, rounds, elapsed }
    }
}

/// Runs the whole protocol on one worker.
pub fn sieve_worker<A: Allocate>(collectives: Collectives<A>, n: u64, logging: Option<SieveLogger>) -> Result<WorkerOutcome, SieveError> {
    SieveWorker::new(collectives, n, logging).map(SieveWorker::run)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Instant;

    use sieve_communication::allocator::Thread;
    use sieve_communication::{initialize, Collectives, Config};

    use super::*;
    use crate::logging::SieveEvent;

    fn run(n: u64, workers: usize) -> Vec<Result<WorkerOutcome, SieveError>> {
        initialize(Config::Process(workers), move |allocator| sieve_worker(Collectives::new(allocator), n, None))
            .expect("workers started")
            .join()
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .expect("no worker panicked")
    }

    #[test]
    fn only_the_coordinator_learns_the_count() {
        let results = run(100, 4);
        let counts = results.iter().map(|result| result.as_ref().map(|outcome| outcome.count).ok()).collect::<Vec<_>>();
        assert_eq!(counts, vec![Some(Some(25)), Some(None), Some(None), Some(None)]);
    }

    #[test]
    fn every_worker_runs_the_same_rounds() {
        // primes 3, 5 and 7 have squares up to 100.
        for result in run(100, 3) {
            assert_eq!(result.expect("sieve ran").rounds, 3);
        }
    }

    #[test]
    fn too_many_workers_fail_everywhere() {
        for (index, result) in run(100, 20).into_iter().enumerate() {
            assert_eq!(result, Err(SieveError::Configuration { n: 100, peers: 20 }), "worker {}", index);
        }
    }

    #[test]
    fn one_failed_allocation_stops_every_worker() {
        let results = initialize(Config::Process(3), |allocator| {
            let collectives = Collectives::new(allocator);
            SieveWorker::with_allocation(collectives, 100, None, |size, index| {
                if index == 1 { LocalStore::allocate(usize::MAX, index) } else { LocalStore::allocate(size, index) }
            })
            .map(SieveWorker::run)
        })
        .expect("workers started")
        .join()
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .expect("no worker panicked");

        assert_eq!(results, vec![
            Err(SieveError::Aborted { index: 0 }),
            Err(SieveError::Resource { index: 1, size: usize::MAX }),
            Err(SieveError::Aborted { index: 2 }),
        ]);
    }

    #[test]
    fn single_worker_needs_no_peers() {
        let outcome = sieve_worker(Collectives::new(Thread::default()), 30, None).expect("sieve ran");
        assert_eq!(outcome.count, Some(10));
        assert_eq!(outcome.rounds, 2);
    }

    #[test]
    fn square_of_the_last_prime_is_struck_out() {
        let outcome = sieve_worker(Collectives::new(Thread::default()), 25, None).expect("sieve ran");
        assert_eq!(outcome.count, Some(9));
        let outcome = sieve_worker(Collectives::new(Thread::default()), 49, None).expect("sieve ran");
        assert_eq!(outcome.count, Some(15));
    }

    #[test]
    fn events_describe_the_run() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let logger = SieveLogger::new(Instant::now(), 0, move |_time, data| {
            sink.borrow_mut().extend(data.drain(..).map(|(_, _, event)| event));
        });
        sieve_worker(Collectives::new(Thread::default()), 30, Some(logger.clone())).expect("sieve ran");
        logger.flush();

        let events = events.borrow();
        assert_eq!(events[0], SieveEvent::Partition(PartitionEvent { low_value: 3, high_value: 29, size: 14 }));
        assert_eq!(events[1], SieveEvent::Round(RoundEvent { round: 0, prime: 3, first: 3, marked: 4 }));
        assert_eq!(events[2], SieveEvent::Discovery(DiscoveryEvent { index: 1, prime: 5 }));
        assert_eq!(events.last(), Some(&SieveEvent::Count(CountEvent { local: 9, total: Some(9) })));
    }
}
