//! A generic allocator, wrapping known implementors of `Allocate`.
//!
//! This type is useful in settings where it is difficult to write code generic in `A: Allocate`,
//! for example closures whose type arguments must be specified.

use std::time::Duration;

use crate::allocator::thread::ThreadBuilder;
use crate::allocator::process::ProcessBuilder;
use crate::allocator::{Allocate, AllocateBuilder, Thread, Process};

use crate::{Push, Pull, Data};

/// Enumerates known implementors of `Allocate`.
/// Passes trait method calls on to members.
pub enum Generic {
    /// Intra-thread allocator.
    Thread(Thread),
    /// Inter-thread, intra-process allocator.
    Process(Process),
}

/// Enumerates known implementors of `Allocate::Pusher`.
/// Passes trait method calls on to members.
pub enum GenericPusher<T: Data> {
    /// Intra-thread pusher
    Thread(<Thread as Allocate>::Pusher<T>),
    /// Inter-thread, intra-process pusher
    Process(<Process as Allocate>::Pusher<T>),
}

impl<T: Data> Push<T> for GenericPusher<T> {
    fn push(&mut self, element: &mut Option<T>) {
        match self {
            Self::Thread(t) => t.push(element),
            Self::Process(p) => p.push(element),
        }
    }
}

/// Enumerates known implementors of `Allocate::Puller`.
/// Passes trait method calls on to members.
pub enum GenericPuller<T: Data> {
    /// Intra-thread puller
    Thread(<Thread as Allocate>::Puller<T>),
    /// Inter-thread, intra-process puller
    Process(<Process as Allocate>::Puller<T>),
}

impl<T: Data> Pull<T> for GenericPuller<T> {
    fn pull(&mut self) -> &mut Option<T> {
        match self {
            Self::Thread(t) => t.pull(),
            Self::Process(p) => p.pull(),
        }
    }
}

impl Generic {
    /// The index of the worker out of `(0..self.peers())`.
    pub fn index(&self) -> usize {
        match self {
            Generic::Thread(t) => t.index(),
            Generic::Process(p) => p.index(),
        }
    }
    /// The number of workers.
    pub fn peers(&self) -> usize {
        match self {
            Generic::Thread(t) => t.peers(),
            Generic::Process(p) => p.peers(),
        }
    }
    /// Constructs several send endpoints and one receive endpoint.
    pub fn allocate<T: Data>(&mut self, identifier: usize) -> (Vec<GenericPusher<T>>, GenericPuller<T>) {
        match self {
            Generic::Thread(t) => {
                let (pushers, puller) = t.allocate(identifier);
                (pushers.into_iter().map(GenericPusher::Thread).collect(), GenericPuller::Thread(puller))
            }
            Generic::Process(p) => {
                let (pushers, puller) = p.allocate(identifier);
                (pushers.into_iter().map(GenericPusher::Process).collect(), GenericPuller::Process(puller))
            }
        }
    }
}

impl Allocate for Generic {
    type Pusher<T: Data> = GenericPusher<T>;
    type Puller<T: Data> = GenericPuller<T>;

    fn index(&self) -> usize { self.index() }
    fn peers(&self) -> usize { self.peers() }
    fn allocate<T: Data>(&mut self, identifier: usize) -> (Vec<Self::Pusher<T>>, Self::Puller<T>) {
        self.allocate(identifier)
    }
    fn await_events(&self, duration: Option<Duration>) {
        match self {
            Generic::Thread(t) => t.await_events(duration),
            Generic::Process(p) => p.await_events(duration),
        }
    }
}


/// Enumerations of constructable implementors of `Allocate`.
///
/// The builder variants are meant to be `Send`, so that they can be moved across threads,
/// whereas the allocator they construct may not. As an example, the `Thread` allocator
/// hands out `Rc` wrapped queues, which cannot themselves be moved across threads.
pub enum GenericBuilder {
    /// Builder for `Thread` allocator.
    Thread(ThreadBuilder),
    /// Builder for `Process` allocator.
    Process(ProcessBuilder),
}

impl AllocateBuilder for GenericBuilder {
    type Allocator = Generic;
    fn build(self) -> Generic {
        match self {
            GenericBuilder::Thread(t) => Generic::Thread(t.build()),
            GenericBuilder::Process(p) => Generic::Process(p.build()),
        }
    }
}
