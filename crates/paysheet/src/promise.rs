//! Single-assignment promise
//!
//! A [`Promise`] starts pending and settles exactly once, either resolved with
//! a value or rejected with an [`Error`]. Observers registered while pending are
//! queued and invoked in registration order when the promise settles. Observers
//! registered after settlement are invoked straight away with the settled
//! outcome.
//!
//! # Delivery
//!
//! An observer never runs inside its own `observe` call, whatever state the
//! promise is in, and never while the internal lock is held:
//!
//! - registered while pending, it runs inside the `resolve`/`reject` call that
//!   settles the promise
//! - registered after settlement, it is handed to a new tokio task (or a new
//!   thread outside a runtime)
//!
//! Code following `observe` therefore always runs before the observer on a
//! single-threaded runtime.
//!
//! Retry and cancellation are policies of the users of this type, not of the
//! promise itself.

use std::fmt::Debug;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::Error;

type Observer<T> = Box<dyn FnOnce(Result<T, Error>) + Send>;

enum State<T> {
    Pending(Vec<Observer<T>>),
    Settled(Result<T, Error>),
}

/// Single-assignment asynchronous value
///
/// Cloning a promise yields another handle to the same value.
pub struct Promise<T> {
    state: Arc<Mutex<State<T>>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for Promise<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for Promise<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let settled = matches!(*self.lock(), State::Settled(_));
        f.debug_struct("Promise").field("settled", &settled).finish()
    }
}

impl<T> Promise<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // Observers never run under the lock, so a poisoned lock still holds a
        // consistent state
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Promise<T>
where
    T: Clone + Send + 'static,
{
    /// Create a new pending promise
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::Pending(Vec::new()))),
        }
    }

    /// Create a promise that is already resolved with `value`
    pub fn resolved(value: T) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::Settled(Ok(value)))),
        }
    }

    /// Create a promise that is already rejected with `err`
    pub fn rejected(err: Error) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::Settled(Err(err)))),
        }
    }

    /// Start `future` on the tokio runtime and settle the returned promise with
    /// its output.
    ///
    /// The work begins immediately, whether or not anyone observes the promise.
    /// If the task ends without producing an output (it panicked, or the runtime
    /// shut down) the promise is rejected with [`Error::PromiseAbandoned`].
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let promise = Self::new();
        let guard = SettleGuard(Some(promise.clone()));

        tokio::spawn(async move {
            let result = future.await;
            guard.settle(result);
        });

        promise
    }

    /// Whether the promise has been resolved or rejected
    pub fn is_settled(&self) -> bool {
        matches!(*self.lock(), State::Settled(_))
    }

    /// Resolve the promise with `value`
    ///
    /// Returns [`Error::PromiseAlreadySettled`] if the promise was already settled.
    pub fn resolve(&self, value: T) -> Result<(), Error> {
        self.settle(Ok(value))
    }

    /// Reject the promise with `err`
    ///
    /// Returns [`Error::PromiseAlreadySettled`] if the promise was already settled.
    pub fn reject(&self, err: Error) -> Result<(), Error> {
        self.settle(Err(err))
    }

    /// Settle the promise with `result`, then run every queued observer in
    /// registration order.
    pub fn settle(&self, result: Result<T, Error>) -> Result<(), Error> {
        let observers = {
            let mut state = self.lock();
            match &mut *state {
                State::Settled(_) => {
                    tracing::error!("Attempted to settle a promise that was already settled");
                    return Err(Error::PromiseAlreadySettled);
                }
                State::Pending(observers) => {
                    let observers = std::mem::take(observers);
                    *state = State::Settled(result.clone());
                    observers
                }
            }
        };

        for observer in observers {
            observer(result.clone());
        }

        Ok(())
    }

    /// Register `on_settled` to receive the outcome of this promise
    ///
    /// If the promise is still pending the observer is queued; otherwise its
    /// delivery is deferred to a new task. Either way it runs after this call
    /// returns.
    pub fn observe<F>(&self, on_settled: F)
    where
        F: FnOnce(Result<T, Error>) + Send + 'static,
    {
        let settled = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending(observers) => {
                    observers.push(Box::new(on_settled));
                    return;
                }
                State::Settled(result) => result.clone(),
            }
        };

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { on_settled(settled) });
            }
            Err(_) => {
                std::thread::spawn(move || on_settled(settled));
            }
        }
    }

    /// Wait for the promise to settle and return its outcome
    pub async fn value(&self) -> Result<T, Error> {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.lock();
            match &mut *state {
                State::Settled(result) => return result.clone(),
                State::Pending(observers) => observers.push(Box::new(move |result| {
                    // Receiver is only gone if the waiter was dropped
                    let _ = tx.send(result);
                })),
            }
        }

        rx.await.map_err(|_| Error::PromiseAbandoned)?
    }
}

/// Settles its promise exactly once: with the task output, or with
/// [`Error::PromiseAbandoned`] if dropped first.
struct SettleGuard<T>(Option<Promise<T>>)
where
    T: Clone + Send + 'static;

impl<T> SettleGuard<T>
where
    T: Clone + Send + 'static,
{
    fn settle(mut self, result: Result<T, Error>) {
        if let Some(promise) = self.0.take() {
            if let Err(e) = promise.settle(result) {
                tracing::warn!("Spawned promise settled externally: {}", e);
            }
        }
    }
}

impl<T> Drop for SettleGuard<T>
where
    T: Clone + Send + 'static,
{
    fn drop(&mut self) {
        if let Some(promise) = self.0.take() {
            if !promise.is_settled() {
                tracing::error!("Promise task ended without settling");
                let _ = promise.reject(Error::PromiseAbandoned);
            }
        }
    }
}
