//! Worker allocation and collective communication for the distributed sieve.
//!
//! Workers are spawned by [`initialize`] with an [`allocator::Generic`](allocator::generic::Generic),
//! whose [`allocate`](Allocate::allocate) method returns a vector of send endpoints, one per
//! worker, and a single receive endpoint. Messages pushed into a send endpoint are eventually
//! received by the corresponding worker. Point-to-point channels are FIFO, with no fairness
//! guarantees across senders.
//!
//! Workers share no mutable state. All coordination happens through [`Collectives`], which
//! builds barrier, broadcast and reduce operations out of the typed channels.
//!
//! # Examples
//! ```
//! use sieve_communication::{Collectives, Config};
//!
//! // configure for three workers in this process.
//! let config = Config::Process(3);
//!
//! let guards = sieve_communication::initialize(config, |allocator| {
//!
//!     let mut collectives = Collectives::new(allocator);
//!
//!     // worker zero picks a value and everyone learns it.
//!     let value = collectives.broadcast(0, 40 + collectives.index() as u64);
//!     assert_eq!(value, 40);
//!
//!     // each worker contributes one; worker zero learns the total.
//!     collectives.reduce(0, 1, |x, y| x + y)
//! });
//!
//! // computation runs until guards are joined or dropped.
//! if let Ok(guards) = guards {
//!     let results = guards.join();
//!     assert_eq!(results[0], Ok(Some(3)));
//!     assert_eq!(results[1], Ok(None));
//! }
//! else { println!("error in computation"); }
//! ```

#![forbid(missing_docs)]

pub mod allocator;
pub mod buzzer;
pub mod collective;
pub mod initialize;
pub mod logging;

pub use allocator::Generic as Allocator;
pub use allocator::Allocate;
pub use collective::{Collectives, Envelope};
pub use initialize::{initialize, initialize_from, Config, WorkerGuards};

/// A composite trait for types that may be moved between workers.
pub trait Data: Send + 'static { }
impl<T: Send + 'static> Data for T { }

/// Pushing elements of type `T`.
///
/// This trait moves data around using references rather than ownership. In the call to
/// `push(element)` the implementor takes the element, leaving `None` behind. A call of
/// `push(&mut None)` or `done()` conventionally signals that the pushed elements should be
/// made visible to the receiver.
pub trait Push<T> {
    /// Pushes `element` with the opportunity to take ownership.
    fn push(&mut self, element: &mut Option<T>);
    /// Pushes `element` and drops any resulting resources.
    #[inline]
    fn send(&mut self, element: T) { self.push(&mut Some(element)); }
    /// Pushes `None`, conventionally signalling a flush.
    #[inline]
    fn done(&mut self) { self.push(&mut None); }
}

impl<T, P: ?Sized + Push<T>> Push<T> for Box<P> {
    #[inline]
    fn push(&mut self, element: &mut Option<T>) { (**self).push(element) }
}

/// Pulling elements of type `T`.
pub trait Pull<T> {
    /// Pulls an element and provides the opportunity to take ownership.
    ///
    /// If `pull` returns `None` this conventionally signals that no more data is available
    /// at the moment, and the puller should find something better to do.
    fn pull(&mut self) -> &mut Option<T>;
    /// Takes an `Option<T>` and leaves `None` behind.
    #[inline]
    fn recv(&mut self) -> Option<T> { self.pull().take() }
}

impl<T, P: ?Sized + Pull<T>> Pull<T> for Box<P> {
    #[inline]
    fn pull(&mut self) -> &mut Option<T> { (**self).pull() }
}

use crossbeam_channel::{Sender, Receiver};

/// Allocate a matrix of send and receive channels to exchange items.
///
/// This method constructs channels for `sends` threads to create and send
/// items of type `T` to `recvs` receiver threads.
fn promise_futures<T>(sends: usize, recvs: usize) -> (Vec<Vec<Sender<T>>>, Vec<Vec<Receiver<T>>>) {

    // each pair of workers has a sender and a receiver.
    let mut senders: Vec<_> = (0 .. sends).map(|_| Vec::with_capacity(recvs)).collect();
    let mut recvers: Vec<_> = (0 .. recvs).map(|_| Vec::with_capacity(sends)).collect();

    for sender in senders.iter_mut() {
        for recver in recvers.iter_mut() {
            let (send, recv) = crossbeam_channel::unbounded();
            sender.push(send);
            recver.push(recv);
        }
    }

    (senders, recvers)
}
