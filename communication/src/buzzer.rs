//! Wake-up handles for workers blocked in a collective.

use std::fmt;
use std::thread::Thread;

/// Unparks one particular worker thread.
///
/// A worker hands its buzzer to every peer when its allocator is built. Peers buzz it
/// after pushing a message its way, which ends any `park` the worker is sitting in.
#[derive(Clone)]
pub struct Buzzer {
    thread: Thread,
}

impl Buzzer {
    /// A buzzer for the calling thread.
    pub fn for_current_thread() -> Self {
        Buzzer { thread: std::thread::current() }
    }
    /// Unparks the target thread.
    ///
    /// A buzz that arrives before the target parks is not lost: its next park returns at once.
    pub fn buzz(&self) {
        self.thread.unpark()
    }
}

impl fmt::Debug for Buzzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buzzer")
            .field("thread", &self.thread.name().unwrap_or("<unnamed>"))
            .finish()
    }
}
