//! Fan-out of controller events to interested subscribers.
//!
//! The original firmware's event dispatcher ran as its own task, decoupling
//! producers from consumers through a queue. On a single-core, cooperative
//! run loop there is no concurrent consumer to decouple from, so this
//! collapses the producer and dispatcher into one synchronous call:
//! publishing an event runs every subscriber's handler before returning.

use heapless::Vec as HVec;

use crate::measurement::{Measurement, TimedMeasurement};

/// Something the controller announces as it runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    /// A fresh measurement was read and folded into the window.
    NewMeasurement(Measurement),
    /// The controller accepted a new baseline, either freshly learned from
    /// the sensor or restored from the baseline store.
    NewBaseline(TimedMeasurement),
}

/// A subscriber to the [`EventBus`].
///
/// Implementations are expected to be cheap: `on_event` runs synchronously
/// on the controller's call stack.
pub trait EventSink {
    /// Handle one published event.
    fn on_event(&mut self, event: Event);
}

/// Fixed-capacity multi-subscriber event fan-out.
///
/// `N` bounds the number of subscribers a single bus can hold; publishing
/// is O(N) and allocation-free.
pub struct EventBus<'a, const N: usize> {
    subscribers: HVec<&'a mut dyn EventSink, N>,
}

impl<'a, const N: usize> Default for EventBus<'a, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> EventBus<'a, N> {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            subscribers: HVec::new(),
        }
    }

    /// Register a subscriber.
    ///
    /// Returns the sink back as an error if the bus is already at
    /// capacity.
    pub fn subscribe(&mut self, sink: &'a mut dyn EventSink) -> Result<(), &'a mut dyn EventSink> {
        self.subscribers.push(sink)
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Publish `event` to every registered subscriber, in subscription
    /// order.
    pub fn publish(&mut self, event: Event) {
        for sink in self.subscribers.iter_mut() {
            sink.on_event(event);
        }
    }
}
