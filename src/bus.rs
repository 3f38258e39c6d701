//! One-shot notification bus for decoded scans.
//!
//! Delivery is synchronous and in-process: every subscriber runs before the
//! keystroke handler returns, in registration order. Page-level reactions
//! (navigation, form filling) live entirely behind this interface.

use crate::detector::types::ScanEvent;
use crossbeam_channel::{bounded, Receiver};

/// A registered scan callback.
pub type Subscriber = Box<dyn Fn(&ScanEvent) + Send>;

/// Fan-out bus for scan notifications.
#[derive(Default)]
pub struct ScanBus {
    subscribers: Vec<Subscriber>,
}

impl ScanBus {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register a callback. Subscribers are invoked in registration order.
    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: Fn(&ScanEvent) + Send + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Register a bounded channel subscriber and return its receiver.
    ///
    /// Publishing never blocks the keystroke path: if the channel is full
    /// or the receiver is gone, the event is dropped for that subscriber.
    pub fn subscribe_channel(&mut self, bound: usize) -> Receiver<ScanEvent> {
        let (sender, receiver) = bounded(bound);
        self.subscribe(move |scan: &ScanEvent| {
            let _ = sender.try_send(scan.clone());
        });
        receiver
    }

    /// Deliver one scan to every subscriber.
    pub fn publish(&self, scan: &ScanEvent) {
        for subscriber in &self.subscribers {
            subscriber(scan);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
