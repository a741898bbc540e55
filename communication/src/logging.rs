//! Events for communication logging.

use serde::{Deserialize, Serialize};

/// Logger for communication events, stamped with the worker index.
pub type CommunicationLogger = sieve_logging::Logger<CommunicationEvent, usize>;

/// The collective operation a message belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collective {
    /// One-to-all dissemination from a root.
    Broadcast,
    /// All-to-one combination at a root.
    Reduce,
}

/// A communication event, observing a message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommunicationEvent {
    /// true for send event, false for receive event
    pub is_send: bool,
    /// collective the message travels on
    pub collective: Collective,
    /// source worker id
    pub source: usize,
    /// target worker id
    pub target: usize,
    /// sequence number of the collective call
    pub seqno: usize,
    /// transmitted value
    pub value: u64,
}
