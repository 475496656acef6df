//! Broadcast channel carrying network observations to their consumers.
//!
//! The wallet's network layer emits events; each consumer subscribes and
//! receives every event emitted after it subscribed.

use tokio::sync::broadcast;

use crate::error::{Error, Result};

pub const DEFAULT_EVENT_LIMIT: usize = 1000;

/// Event bus for broadcasting events to every subscriber.
///
/// Late subscribers do not receive past events.
#[derive(Debug, Clone)]
pub struct EventBus<T: Clone> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone> EventBus<T> {
    /// Create a new event bus with the given capacity.
    ///
    /// Capacity determines how many events can be buffered before
    /// slow receivers start missing events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
        }
    }

    pub fn subscribe(&self) -> EventReceiver<T> {
        EventReceiver::new(self.sender.subscribe())
    }

    /// Emit events to all subscribers. Having no subscribers is not an error.
    pub fn emit(&self, events: &[T]) {
        for event in events {
            let _ = self.sender.send(event.clone());
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LIMIT)
    }
}

#[derive(Debug)]
pub struct EventReceiver<T: Clone> {
    receiver: broadcast::Receiver<T>,
}

impl<T: Clone> EventReceiver<T> {
    pub fn new(receiver: broadcast::Receiver<T>) -> Self {
        Self {
            receiver,
        }
    }

    pub async fn recv(&mut self) -> Result<T> {
        match self.receiver.recv().await {
            Ok(event) => Ok(event),
            Err(broadcast::error::RecvError::Lagged(n)) => Err(Error::EventBusLagged(n)),
            Err(broadcast::error::RecvError::Closed) => Err(Error::EventBusClosed),
        }
    }
}
