//! Buffered, typed event logging for sieve workers.
//!
//! Each worker owns a [`Registry`] that maps stream names to loggers. A [`Logger`] records
//! events stamped with the elapsed time since the registry was created and the identity of
//! the worker, buffers them, and hands complete batches to a user supplied action.
//!
//! Loggers are cheap to clone and all clones share one buffer. The buffer is flushed when it
//! reaches capacity, when [`Logger::flush`] is called, and when a clone is dropped.

#![forbid(missing_docs)]

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Number of events buffered before the action is invoked.
const BUFFERING_LOGGER_CAPACITY: usize = 1024;

/// A map from stream names to typed loggers.
pub struct Registry<E> {
    /// A worker-specific identifier attached to every event.
    id: E,
    /// Named loggers, with a type-erased flush handle next to each.
    map: HashMap<String, (Box<dyn Any>, Box<dyn Flush>)>,
    /// The instant all event timestamps are relative to.
    time: Instant,
}

impl<E: Clone + 'static> Registry<E> {
    /// Creates a new logger registry.
    pub fn new(time: Instant, id: E) -> Self {
        Registry {
            id,
            map: HashMap::new(),
            time,
        }
    }

    /// Binds a log name to an action on batches of events.
    ///
    /// The action receives the time at which the batch is flushed and the events themselves;
    /// it may drain the vector but should not rely on its contents afterwards. Any previously
    /// bound logger of the same name is returned.
    pub fn insert<T: 'static, F: FnMut(&Duration, &mut Vec<(Duration, E, T)>) + 'static>(
        &mut self,
        name: &str,
        action: F,
    ) -> Option<Box<dyn Any>> {
        let logger = Logger::<T, E>::new(self.time, self.id.clone(), action);
        self.insert_logger(name, logger)
    }

    /// Binds a log name to an existing logger.
    pub fn insert_logger<T: 'static>(&mut self, name: &str, logger: Logger<T, E>) -> Option<Box<dyn Any>> {
        self.map
            .insert(name.to_owned(), (Box::new(logger.clone()), Box::new(logger)))
            .map(|(any, _)| any)
    }

    /// Removes a bound logger.
    ///
    /// Other clones of the logger keep working; the registry simply stops handing it out.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Any>> {
        self.map.remove(name).map(|(any, _)| any)
    }

    /// Retrieves a shared logger, if one has been inserted under `name` with event type `T`.
    pub fn get<T: 'static>(&self, name: &str) -> Option<Logger<T, E>> {
        self.map
            .get(name)
            .and_then(|(any, _)| any.downcast_ref::<Logger<T, E>>())
            .cloned()
    }

    /// Flushes all registered loggers.
    pub fn flush(&mut self) {
        for (_, flush) in self.map.values() {
            flush.flush();
        }
    }
}

impl<E> Drop for Registry<E> {
    fn drop(&mut self) {
        for (_, flush) in self.map.values() {
            flush.flush();
        }
    }
}

/// The shared state behind a `Logger`.
struct LoggerInner<T, E, A: ?Sized + FnMut(&Duration, &mut Vec<(Duration, E, T)>)> {
    id: E,
    /// Base instant for event timestamps.
    time: Instant,
    buffer: Vec<(Duration, E, T)>,
    action: A,
}

impl<T, E, A: ?Sized + FnMut(&Duration, &mut Vec<(Duration, E, T)>)> LoggerInner<T, E, A> {
    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            let now = self.time.elapsed();
            (self.action)(&now, &mut self.buffer);
            self.buffer.clear();
        }
    }
}

/// A buffering logger of events of type `T`, stamped with identifier `E`.
pub struct Logger<T, E> {
    inner: Rc<RefCell<LoggerInner<T, E, dyn FnMut(&Duration, &mut Vec<(Duration, E, T)>)>>>,
}

impl<T, E> Clone for Logger<T, E> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T: 'static, E: Clone + 'static> Logger<T, E> {
    /// Allocates a new shareable logger bound to a batch action.
    pub fn new<F>(time: Instant, id: E, action: F) -> Self
    where
        F: FnMut(&Duration, &mut Vec<(Duration, E, T)>) + 'static,
    {
        let inner = LoggerInner {
            id,
            time,
            buffer: Vec::with_capacity(BUFFERING_LOGGER_CAPACITY),
            action,
        };
        let inner: Rc<RefCell<LoggerInner<T, E, dyn FnMut(&Duration, &mut Vec<(Duration, E, T)>)>>> =
            Rc::new(RefCell::new(inner));
        Logger { inner }
    }

    /// Logs an event.
    ///
    /// The event is stamped with the time elapsed since the logger's base instant and with
    /// the logger's identifier. The buffer is handed to the action once it is full.
    pub fn log<S: Into<T>>(&self, event: S) {
        self.log_many(Some(event));
    }

    /// Logs several events at once.
    pub fn log_many<I>(&self, events: I)
    where
        I: IntoIterator,
        I::Item: Into<T>,
    {
        let mut inner = self.inner.borrow_mut();
        let elapsed = inner.time.elapsed();
        for event in events {
            let id = inner.id.clone();
            inner.buffer.push((elapsed, id, event.into()));
            if inner.buffer.len() >= BUFFERING_LOGGER_CAPACITY {
                inner.flush();
            }
        }
    }

    /// Hands any buffered events to the action.
    pub fn flush(&self) {
        self.inner.borrow_mut().flush();
    }
}

impl<T, E> Drop for Logger<T, E> {
    fn drop(&mut self) {
        // Skipped if the action itself is running, e.g. dropping a clone it captured.
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.flush();
        }
    }
}

/// Types that can be flushed.
trait Flush {
    /// Flushes any buffered data.
    fn flush(&self);
}

impl<T, E> Flush for Logger<T, E> {
    fn flush(&self) {
        self.inner.borrow_mut().flush();
    }
}
