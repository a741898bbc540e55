//! Traits, implementations, and macros related to logging sieve events.

/// Type alias for logging sieve events.
pub type WorkerIdentifier = usize;
/// Logger type for worker-local logging.
pub type Logger<Event> = sieve_logging::Logger<Event, WorkerIdentifier>;
/// Logger for sieve events.
pub type SieveLogger = Logger<SieveEvent>;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sieve_communication::logging::CommunicationEvent;
use sieve_logging::Registry;

/// Name of the stream carrying [`SieveEvent`]s.
pub const SIEVE_STREAM: &str = "sieve";
/// Name of the stream carrying communication events.
pub const COMMUNICATION_STREAM: &str = "communication";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
/// The range a worker took on.
pub struct PartitionEvent {
    /// Smallest owned odd integer.
    pub low_value: u64,
    /// Largest owned odd integer.
    pub high_value: u64,
    /// Number of storage entries.
    pub size: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
/// One round of marking.
pub struct RoundEvent {
    /// Round number, starting from zero.
    pub round: usize,
    /// The prime whose multiples were marked.
    pub prime: u64,
    /// Storage index of the first marked entry.
    pub first: usize,
    /// Number of entries visited.
    pub marked: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
/// The coordinator found the next sieving prime.
pub struct DiscoveryEvent {
    /// Storage index of the prime in the coordinator's store.
    pub index: usize,
    /// The prime.
    pub prime: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
/// A worker's contribution to the final count.
pub struct CountEvent {
    /// Unmarked entries in this worker's store.
    pub local: u64,
    /// The global count, on the reduction root only.
    pub total: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
/// An event in a sieve computation.
pub enum SieveEvent {
    /// Partition event.
    Partition(PartitionEvent),
    /// Round event.
    Round(RoundEvent),
    /// Discovery event.
    Discovery(DiscoveryEvent),
    /// Count event.
    Count(CountEvent),
}

impl From<PartitionEvent> for SieveEvent { fn from(v: PartitionEvent) -> SieveEvent { SieveEvent::Partition(v) } }
impl From<RoundEvent> for SieveEvent { fn from(v: RoundEvent) -> SieveEvent { SieveEvent::Round(v) } }
impl From<DiscoveryEvent> for SieveEvent { fn from(v: DiscoveryEvent) -> SieveEvent { SieveEvent::Discovery(v) } }
impl From<CountEvent> for SieveEvent { fn from(v: CountEvent) -> SieveEvent { SieveEvent::Count(v) } }

/// Registers both event streams with `registry`, writing each event to standard error.
pub fn install_stderr(registry: &mut Registry<WorkerIdentifier>) {
    registry.insert::<SieveEvent, _>(SIEVE_STREAM, print_events::<SieveEvent>);
    registry.insert::<CommunicationEvent, _>(COMMUNICATION_STREAM, print_events::<CommunicationEvent>);
}

fn print_events<E: std::fmt::Debug>(_time: &Duration, data: &mut Vec<(Duration, WorkerIdentifier, E)>) {
    for (time, worker, event) in data.drain(..) {
        eprintln!("{:?}\tworker {}\t{:?}", time, worker, event);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn installed_streams_are_typed() {
        let mut registry = Registry::new(Instant::now(), 0);
        install_stderr(&mut registry);
        assert!(registry.get::<SieveEvent>(SIEVE_STREAM).is_some());
        assert!(registry.get::<CommunicationEvent>(COMMUNICATION_STREAM).is_some());
        assert!(registry.get::<SieveEvent>(COMMUNICATION_STREAM).is_none());
    }

    #[test]
    fn events_convert_into_sieve_events() {
        let event: SieveEvent = DiscoveryEvent { index: 1, prime: 5 }.into();
        assert_eq!(event, SieveEvent::Discovery(DiscoveryEvent { index: 1, prime: 5 }));
    }
}
