//! Typed inter-thread, intra-process channels.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{Sender, Receiver};

use crate::allocator::{Allocate, AllocateBuilder};
use crate::buzzer::Buzzer;
use crate::{Data, Push, Pull};

/// A builder for one worker's `Process` allocator.
pub struct ProcessBuilder {
    index:  usize,                          // number out of peers
    peers:  usize,                          // number of peer allocators.
    // below: `Box<Any+Send>` is a `Box<Vec<Option<(Vec<Sender<T>>, Receiver<T>)>>>`
    channels: Arc<Mutex<HashMap<usize, Box<dyn Any+Send>>>>,

    // Buzzers for waking other local workers.
    buzzers_send: Vec<Sender<Buzzer>>,
    buzzers_recv: Vec<Receiver<Buzzer>>,
}

impl AllocateBuilder for ProcessBuilder {
    type Allocator = Process;
    fn build(self) -> Self::Allocator {

        // Initialize buzzers; send first, then recv.
        for worker in self.buzzers_send.iter() {
            let buzzer = Buzzer::for_current_thread();
            // a peer can only have hung up if its thread died during startup.
            let _ = worker.send(buzzer);
        }
        let buzzers = self.buzzers_recv
            .iter()
            .filter_map(|r| r.recv().ok())
            .collect::<Vec<_>>();

        Process {
            index: self.index,
            peers: self.peers,
            channels: self.channels,
            buzzers,
        }
    }
}

/// An allocator for inter-thread, intra-process communication
pub struct Process {
    index:      usize,                              // number out of peers
    peers:      usize,                              // number of peer allocators (for typed channel allocation).
    channels:   Arc<Mutex<HashMap</* channel id */ usize, Box<dyn Any+Send>>>>,
    buzzers:    Vec<Buzzer>,
}

impl Process {
    /// Allocate a list of connected intra-process allocators.
    pub fn new_vector(peers: usize) -> Vec<ProcessBuilder> {

        let channels = Arc::new(Mutex::new(HashMap::with_capacity(peers)));

        let (buzzers_send, buzzers_recv) = crate::promise_futures(peers, peers);

        buzzers_send
            .into_iter()
            .zip(buzzers_recv)
            .enumerate()
            .map(|(index, (buzzers_send, buzzers_recv))|
                ProcessBuilder {
                    index,
                    peers,
                    buzzers_send,
                    buzzers_recv,
                    channels: Arc::clone(&channels),
                }
            )
            .collect()
    }
}

impl Allocate for Process {
    type Pusher<T: Data> = Pusher<T>;
    type Puller<T: Data> = Puller<T>;
    fn index(&self) -> usize { self.index }
    fn peers(&self) -> usize { self.peers }
    fn allocate<T: Data>(&mut self, identifier: usize) -> (Vec<Self::Pusher<T>>, Self::Puller<T>) {

        // this is race-y global initialisation.
        let mut channels = self.channels.lock().expect("mutex error?");

        let entry = channels.entry(identifier).or_insert_with(|| {

            let mut pushers = Vec::with_capacity(self.peers);
            let mut pullers = Vec::with_capacity(self.peers);
            for buzzer in self.buzzers.iter() {
                let (s, r): (Sender<T>, Receiver<T>) = crossbeam_channel::unbounded();
                pushers.push(Pusher { target: s, buzzer: buzzer.clone() });
                pullers.push(Puller { source: r, current: None });
            }

            let mut to_box = Vec::with_capacity(pullers.len());
            for recv in pullers.into_iter() {
                to_box.push(Some((pushers.clone(), recv)));
            }

            Box::new(to_box)
        });

        let vector =
        entry
            .downcast_mut::<Vec<Option<(Vec<Pusher<T>>, Puller<T>)>>>()
            .expect("failed to correctly cast channel");

        let (sends, recv) =
        vector[self.index]
            .take()
            .expect("channel already consumed");

        let empty = vector.iter().all(|x| x.is_none());
        if empty { channels.remove(&identifier); }

        (sends, recv)
    }

    fn await_events(&self, duration: Option<Duration>) {
        match duration {
            Some(duration) => std::thread::park_timeout(duration),
            None => std::thread::park(),
        }
    }
}

/// The push half of an intra-process channel.
pub struct Pusher<T> {
    target: Sender<T>,
    buzzer: Buzzer,
}

impl<T> Clone for Pusher<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            buzzer: self.buzzer.clone(),
        }
    }
}

impl<T> Push<T> for Pusher<T> {
    #[inline] fn push(&mut self, element: &mut Option<T>) {
        if let Some(element) = element.take() {
            // The remote endpoint could be shut down, and so
            // it is not fundamentally an error to fail to send.
            let _ = self.target.send(element);
            self.buzzer.buzz();
        }
    }
}

/// The pull half of an intra-process channel.
pub struct Puller<T> {
    current: Option<T>,
    source: Receiver<T>,
}

impl<T> Pull<T> for Puller<T> {
    #[inline]
    fn pull(&mut self) -> &mut Option<T> {
        self.current = self.source.try_recv().ok();
        &mut self.current
    }
}
