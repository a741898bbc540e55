//! Intra-thread communication.

use std::rc::Rc;
use std::cell::RefCell;
use std::collections::VecDeque;

use crate::allocator::{Allocate, AllocateBuilder};
use crate::{Data, Push, Pull};

/// Builder for the single-worker allocator.
pub struct ThreadBuilder;

impl AllocateBuilder for ThreadBuilder {
    type Allocator = Thread;
    fn build(self) -> Self::Allocator { Thread::default() }
}

/// An allocator for a group of one worker, which just queues sent messages.
#[derive(Default)]
pub struct Thread;

impl Allocate for Thread {
    type Pusher<T: Data> = ThreadPusher<T>;
    type Puller<T: Data> = ThreadPuller<T>;
    fn index(&self) -> usize { 0 }
    fn peers(&self) -> usize { 1 }
    fn allocate<T: Data>(&mut self, _identifier: usize) -> (Vec<Self::Pusher<T>>, Self::Puller<T>) {
        let (pusher, puller) = Thread::new_from();
        (vec![pusher], puller)
    }
}

/// Thread-local counting channel push endpoint.
pub type ThreadPusher<T> = Pusher<T>;
/// Thread-local counting channel pull endpoint.
pub type ThreadPuller<T> = Puller<T>;

impl Thread {
    /// Allocates a new pusher and puller pair.
    pub fn new_from<T: 'static>() -> (Pusher<T>, Puller<T>) {
        let shared = Rc::new(RefCell::new(VecDeque::<T>::new()));
        (Pusher { target: Rc::clone(&shared) }, Puller { source: shared, current: None })
    }
}

/// The push half of an intra-thread channel.
pub struct Pusher<T> {
    target: Rc<RefCell<VecDeque<T>>>,
}

impl<T> Push<T> for Pusher<T> {
    #[inline]
    fn push(&mut self, element: &mut Option<T>) {
        if let Some(element) = element.take() {
            self.target.borrow_mut().push_back(element);
        }
    }
}

/// The pull half of an intra-thread channel.
pub struct Puller<T> {
    current: Option<T>,
    source: Rc<RefCell<VecDeque<T>>>,
}

impl<T> Pull<T> for Puller<T> {
    #[inline]
    fn pull(&mut self) -> &mut Option<T> {
        self.current = self.source.borrow_mut().pop_front();
        &mut self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_come_back_in_order() {
        let mut thread = ThreadBuilder.build();
        assert_eq!((thread.index(), thread.peers()), (0, 1));
        let (mut pushers, mut puller) = thread.allocate::<u64>(0);
        assert_eq!(pushers.len(), 1);
        pushers[0].send(1);
        pushers[0].send(2);
        pushers[0].done();
        assert_eq!(puller.recv(), Some(1));
        assert_eq!(puller.recv(), Some(2));
        assert_eq!(puller.recv(), None);
    }
}
