//! Publish-only broadcast channel.
//!
//! Every subscriber owns its own `mpsc` queue, so delivery order per
//! subscriber is publish order. Dropping a [`Subscription`] removes it from the
//! channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

type Subscribers<T> = Mutex<Vec<(u64, Sender<T>)>>;

#[derive(Clone)]
pub struct Channel<T: Clone + Send> {
    subscribers: Arc<Subscribers<T>>,
    next_id: Arc<AtomicU64>,
}

pub struct Subscription<T: Clone + Send> {
    id: u64,
    receiver: Receiver<T>,
    channel: Weak<Subscribers<T>>,
}

impl<T: Clone + Send> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send> Channel<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let (sender, receiver) = mpsc::channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.subscribers).push((id, sender));

        Subscription {
            id,
            receiver,
            channel: Arc::downgrade(&self.subscribers),
        }
    }

    /// Sends `message` to every live subscriber. A no-op without subscribers.
    pub fn publish(&self, message: &T) {
        lock(&self.subscribers).retain(|(_, sender)| sender.send(message.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }
}

impl<T: Clone + Send> Subscription<T> {
    pub fn recv(&self) -> Option<T> {
        self.receiver.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Everything published since the last call, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }
}

impl<T: Clone + Send> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(subscribers) = self.channel.upgrade() {
            lock(&subscribers).retain(|(id, _)| *id != self.id);
        }
    }
}

// A poisoned subscriber list is still a valid list of senders.
fn lock<T>(subscribers: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    subscribers
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
