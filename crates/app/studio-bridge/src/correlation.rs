use std::{
    collections::HashMap,
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::sync::oneshot;

use crate::{BridgeError, Result};

/// Completion of a call whose answer arrives later from the host.
///
/// The synchronous half of a correlated call (readiness, validation, the
/// single-call slot) is reported by the `Result` that hands out the
/// `Pending`; awaiting it yields the eventual value.
#[must_use = "a Pending does nothing unless awaited"]
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Pending<T> {
    pub(crate) fn channel() -> (oneshot::Sender<Result<T>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    pub(crate) fn ready(value: T) -> Self {
        let (tx, pending) = Self::channel();
        let _ = tx.send(Ok(value));
        pending
    }
}

impl<T> fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("rx", &"oneshot::Receiver<Result<T>>")
            .finish()
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(BridgeError::Closed)))
    }
}

/// Pairs outbound requests with their replies.
///
/// Keys come from a counter that starts at zero and only moves forward, so
/// every key handed out during a session is distinct. `capacity` bounds how
/// many requests may be outstanding; beyond it `begin` fails instead of
/// queueing.
pub struct Correlator<T> {
    next_id: u64,
    capacity: usize,
    pending: HashMap<String, oneshot::Sender<Result<T>>>,
}

impl<T> fmt::Debug for Correlator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Correlator")
            .field("next_id", &self.next_id)
            .field("capacity", &self.capacity)
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> Correlator<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            next_id: 0,
            capacity,
            pending: HashMap::new(),
        }
    }

    /// Allocates the next key and its completion handle.
    pub fn begin(&mut self) -> Result<(String, Pending<T>)> {
        self.pending.retain(|key, tx| {
            let abandoned = tx.is_closed();
            if abandoned {
                tracing::debug!("Dropping abandoned request {}", key);
            }
            !abandoned
        });

        if self.pending.len() >= self.capacity {
            return Err(BridgeError::CallInProgress);
        }

        let key = self.next_id.to_string();
        self.next_id += 1;

        let (tx, pending) = Pending::channel();
        self.pending.insert(key.clone(), tx);
        Ok((key, pending))
    }

    /// Completes the request registered under `key`. Returns false when no
    /// such request is outstanding.
    pub fn complete(&mut self, key: &str, value: T) -> bool {
        self.settle(key, Ok(value))
    }

    pub fn fail(&mut self, key: &str, error: BridgeError) -> bool {
        self.settle(key, Err(error))
    }

    /// Forgets `key` without completing it; its `Pending` resolves to
    /// [`BridgeError::Closed`].
    pub fn cancel(&mut self, key: &str) -> bool {
        self.pending.remove(key).is_some()
    }

    pub fn is_outstanding(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    pub fn outstanding(&self) -> Vec<&str> {
        self.pending.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn settle(&mut self, key: &str, outcome: Result<T>) -> bool {
        let Some(tx) = self.pending.remove(key) else {
            return false;
        };
        if tx.send(outcome).is_err() {
            tracing::debug!("Caller stopped waiting for request {}", key);
        }
        true
    }
}
