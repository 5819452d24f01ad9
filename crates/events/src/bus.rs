//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus distributes [`SessionEvent`](crate::SessionEvent)s from the client
//! core to any number of observers (UI shells, route guards, caches).
//!
//! - **Broadcast**: each subscription receives a copy of every event published
//!   after it subscribed
//! - **Non-blocking publish**: publishing never waits on a subscriber, so it is
//!   safe to call from async code between suspension points
//! - **No persistence**: events published before a subscription exists are not
//!   replayed

use std::sync::Arc;
use std::sync::mpsc::Receiver;

/// A subscription to an event stream.
///
/// ```ignore
/// let subscription = bus.subscribe();
/// while let Ok(event) = subscription.try_recv() {
///     render(event);
/// }
/// ```
///
/// Subscriptions are meant for a single consumer. Dropping one unsubscribes it
/// (the bus prunes dead subscribers on the next publish).
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Everything queued right now, without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Domain-agnostic pub/sub abstraction.
///
/// `publish()` can fail (e.g. internal lock poisoning); callers treat a failed
/// publish as a lost notification, never as a failed operation.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
