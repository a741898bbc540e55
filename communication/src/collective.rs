//! Collective operations built from typed point-to-point channels.
//!
//! Every worker must invoke the same collectives, with the same roots, in the same order.
//! Each collective call is numbered, and envelopes that arrive for a later call than the one
//! being awaited are stashed until that call is made. Waiting parks the worker thread until a
//! peer delivers a message.

use crate::allocator::Allocate;
use crate::logging::{Collective, CommunicationEvent, CommunicationLogger};
use crate::{Pull, Push};

/// Channel identifier for broadcast traffic.
const BROADCAST_CHANNEL: usize = 0;
/// Channel identifier for reduce traffic.
const REDUCE_CHANNEL: usize = 1;

/// A value in transit between two workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    /// Index of the sending worker.
    pub source: usize,
    /// Sequence number of the collective call the value belongs to.
    pub seqno: usize,
    /// The transmitted value.
    pub value: u64,
}

/// The endpoints and bookkeeping for one kind of collective.
struct Channel<A: Allocate> {
    kind: Collective,
    pushers: Vec<A::Pusher<Envelope>>,
    puller: A::Puller<Envelope>,
    /// Envelopes received ahead of the call they belong to.
    stash: Vec<Envelope>,
    /// Number of calls made so far.
    calls: usize,
}

impl<A: Allocate> Channel<A> {
    fn new(allocator: &mut A, identifier: usize, kind: Collective) -> Self {
        let (pushers, puller) = allocator.allocate(identifier);
        Channel { kind, pushers, puller, stash: Vec::new(), calls: 0 }
    }

    /// Claims the sequence number of the next call.
    fn next_seqno(&mut self) -> usize {
        self.calls += 1;
        self.calls
    }
}

/// Barrier, broadcast and reduce among the workers of one allocator.
pub struct Collectives<A: Allocate> {
    allocator: A,
    broadcast: Channel<A>,
    reduce: Channel<A>,
    logging: Option<CommunicationLogger>,
}

impl<A: Allocate> Collectives<A> {
    /// Allocates the channels that back the collectives.
    ///
    /// All workers must construct their `Collectives` at the same point in their allocation
    /// sequence, as channels are matched up by identifier.
    pub fn new(mut allocator: A) -> Self {
        let broadcast = Channel::new(&mut allocator, BROADCAST_CHANNEL, Collective::Broadcast);
        let reduce = Channel::new(&mut allocator, REDUCE_CHANNEL, Collective::Reduce);
        Collectives { allocator, broadcast, reduce, logging: None }
    }

    /// Installs a logger for the messages sent and received by this worker.
    pub fn set_logging(&mut self, logging: Option<CommunicationLogger>) {
        self.logging = logging;
    }

    /// The index of this worker.
    pub fn index(&self) -> usize { self.allocator.index() }
    /// The number of participating workers.
    pub fn peers(&self) -> usize { self.allocator.peers() }

    /// Sends `value` from `root` to every worker and returns it.
    ///
    /// Non-root workers ignore their own `value` argument and block until the root's value
    /// arrives.
    pub fn broadcast(&mut self, root: usize, value: u64) -> u64 {
        let seqno = self.broadcast.next_seqno();
        let index = self.index();
        if self.peers() == 1 {
            value
        }
        else if index == root {
            for (target, pusher) in self.broadcast.pushers.iter_mut().enumerate() {
                if target != root {
                    pusher.send(Envelope { source: index, seqno, value });
                    log_event(&self.logging, true, Collective::Broadcast, index, target, seqno, value);
                }
            }
            value
        }
        else {
            let received = await_envelopes(&self.allocator, &mut self.broadcast, &self.logging, seqno, 1);
            received[0].value
        }
    }

    /// Combines one value per worker at `root`.
    ///
    /// Returns the combined value at `root` and `None` elsewhere. Values are combined in
    /// worker order, starting from the root's own value.
    pub fn reduce<F: Fn(u64, u64) -> u64>(&mut self, root: usize, value: u64, combine: F) -> Option<u64> {
        let seqno = self.reduce.next_seqno();
        let index = self.index();
        let peers = self.peers();
        if index == root {
            let mut received = await_envelopes(&self.allocator, &mut self.reduce, &self.logging, seqno, peers - 1);
            received.sort_by_key(|envelope| envelope.source);
            Some(received.into_iter().fold(value, |total, envelope| combine(total, envelope.value)))
        }
        else {
            self.reduce.pushers[root].send(Envelope { source: index, seqno, value });
            log_event(&self.logging, true, Collective::Reduce, index, root, seqno, value);
            None
        }
    }

    /// Combines one value per worker and returns the result to every worker.
    pub fn all_reduce<F: Fn(u64, u64) -> u64>(&mut self, value: u64, combine: F) -> u64 {
        let reduced = self.reduce(0, value, combine);
        self.broadcast(0, reduced.unwrap_or(value))
    }

    /// Blocks until every worker has reached the barrier.
    pub fn barrier(&mut self) {
        self.all_reduce(1, |x, y| x + y);
    }
}

/// Collects `count` envelopes belonging to call `seqno`, parking while none are available.
fn await_envelopes<A: Allocate>(
    allocator: &A,
    channel: &mut Channel<A>,
    logging: &Option<CommunicationLogger>,
    seqno: usize,
    count: usize,
) -> Vec<Envelope> {
    let mut found = Vec::with_capacity(count);
    channel.stash.retain(|envelope| {
        if envelope.seqno == seqno { found.push(*envelope); false } else { true }
    });
    while found.len() < count {
        match channel.puller.recv() {
            Some(envelope) => {
                log_event(logging, false, channel.kind, envelope.source, allocator.index(), envelope.seqno, envelope.value);
                if envelope.seqno == seqno { found.push(envelope); }
                else { channel.stash.push(envelope); }
            }
            None => allocator.await_events(None),
        }
    }
    found
}

fn log_event(
    logging: &Option<CommunicationLogger>,
    is_send: bool,
    collective: Collective,
    source: usize,
    target: usize,
    seqno: usize,
    value: u64,
) {
    if let Some(logger) = logging {
        logger.log(CommunicationEvent { is_send, collective, source, target, seqno, value });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Instant;

    use super::*;
    use crate::{initialize, Config};

    /// Runs `logic` on `workers` workers and returns their results in index order.
    fn run<T, F>(workers: usize, logic: F) -> Vec<T>
    where
        T: Send + 'static,
        F: Fn(Collectives<crate::Allocator>) -> T + Send + Sync + 'static,
    {
        let config = if workers == 1 { Config::Thread } else { Config::Process(workers) };
        initialize(config, move |allocator| logic(Collectives::new(allocator)))
            .expect("workers started")
            .join()
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .expect("no worker panicked")
    }

    #[test]
    fn broadcast_reaches_every_worker() {
        let results = run(4, |mut collectives| {
            let mine = 100 + collectives.index() as u64;
            (collectives.broadcast(0, mine), collectives.broadcast(2, mine))
        });
        assert_eq!(results, vec![(100, 102); 4]);
    }

    #[test]
    fn reduce_sums_at_the_root_only() {
        let results = run(5, |mut collectives| {
            let mine = collectives.index() as u64 + 1;
            collectives.reduce(0, mine, |x, y| x + y)
        });
        assert_eq!(results, vec![Some(15), None, None, None, None]);
    }

    #[test]
    fn reduce_to_another_root() {
        let results = run(3, |mut collectives| {
            let mine = collectives.index() as u64 * 10;
            collectives.reduce(1, mine, u64::max)
        });
        assert_eq!(results, vec![None, Some(20), None]);
    }

    #[test]
    fn successive_rounds_do_not_mix() {
        let results = run(4, |mut collectives| {
            let mut seen = Vec::new();
            let mut value = 3;
            for round in 0 .. 200u64 {
                if collectives.index() == 0 { value += 2; }
                value = collectives.broadcast(0, value);
                seen.push(value);
                // back-to-back reduces, so fast workers run ahead of the root.
                let first = collectives.reduce(0, round, |x, y| x + y);
                let second = collectives.reduce(0, 1, |x, y| x + y);
                if let (Some(first), Some(second)) = (first, second) {
                    assert_eq!(first, 4 * round);
                    assert_eq!(second, 4);
                }
            }
            seen
        });
        let expected = (0 .. 200u64).map(|round| 5 + 2 * round).collect::<Vec<_>>();
        for seen in results {
            assert_eq!(seen, expected);
        }
    }

    #[test]
    fn all_reduce_and_barrier() {
        let results = run(3, |mut collectives| {
            collectives.barrier();
            let total = collectives.all_reduce(collectives.index() as u64, |x, y| x + y);
            collectives.barrier();
            total
        });
        assert_eq!(results, vec![3, 3, 3]);
    }

    #[test]
    fn single_worker_collectives_are_local() {
        let results = run(1, |mut collectives| {
            collectives.barrier();
            (collectives.broadcast(0, 7), collectives.reduce(0, 9, |x, y| x + y))
        });
        assert_eq!(results, vec![(7, Some(9))]);
    }

    #[test]
    fn messages_are_logged() {
        let results = run(2, |mut collectives| {
            let events = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&events);
            let logger = CommunicationLogger::new(Instant::now(), collectives.index(), move |_time, data| {
                sink.borrow_mut().extend(data.drain(..).map(|(_, _, event)| event));
            });
            collectives.set_logging(Some(logger.clone()));
            collectives.broadcast(0, 11);
            logger.flush();
            let seen = events.borrow().clone();
            seen
        });
        assert_eq!(results[0].len(), 1);
        assert!(results[0][0].is_send);
        assert_eq!((results[0][0].target, results[0][0].value), (1, 11));
        assert_eq!(results[1].len(), 1);
        assert!(!results[1][0].is_send);
        assert_eq!((results[1][0].source, results[1][0].collective), (0, Collective::Broadcast));
    }
}
