use std::sync::{Arc, Mutex};

use super::event::Event;
use super::sink::{EventSink, StdOutSink};

/// Receives events from producers and broadcasts them to all sinks.
///
/// The bus is synchronous and pull-based: producers hold cloned
/// [`flume::Sender`]s and push at any time; [`pump`](EventBus::pump) drains
/// everything queued so far into the sinks. The sequence controller pumps at
/// the end of every tick, so sinks observe events in emission order.
pub struct EventBus {
    sinks: Arc<Mutex<Vec<Box<dyn EventSink>>>>,
    event_channel: (flume::Sender<Event>, flume::Receiver<Event>),
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_sink(StdOutSink::default())
    }
}

impl EventBus {
    /// Create an EventBus with a single sink.
    pub fn with_sink<T>(sink: T) -> Self
    where
        T: EventSink + 'static,
    {
        Self {
            sinks: Arc::new(Mutex::new(vec![Box::new(sink)])),
            event_channel: flume::unbounded(),
        }
    }

    /// Create an EventBus with multiple sinks.
    #[must_use]
    pub fn with_sinks(sinks: Vec<Box<dyn EventSink>>) -> Self {
        Self {
            sinks: Arc::new(Mutex::new(sinks)),
            event_channel: flume::unbounded(),
        }
    }

    /// An EventBus with no sinks; events pumped into it are dropped.
    #[must_use]
    pub fn discard() -> Self {
        Self::with_sinks(Vec::new())
    }

    /// Dynamically add a sink.
    pub fn add_sink<T: EventSink + 'static>(&self, sink: T) {
        if let Ok(mut sinks) = self.sinks.lock() {
            sinks.push(Box::new(sink));
        }
    }

    /// Add an already-boxed sink.
    pub fn add_boxed_sink(&self, sink: Box<dyn EventSink>) {
        if let Ok(mut sinks) = self.sinks.lock() {
            sinks.push(sink);
        }
    }

    /// Get a clone of the sender side so producers can emit events.
    #[must_use]
    pub fn sender(&self) -> flume::Sender<Event> {
        self.event_channel.0.clone()
    }

    /// Drain every queued event into the sinks. Returns how many events were
    /// dispatched. Sink errors are reported to stderr and do not stop the
    /// drain.
    pub fn pump(&self) -> usize {
        let mut dispatched = 0;
        let Ok(mut sinks) = self.sinks.lock() else {
            return 0;
        };
        for event in self.event_channel.1.try_iter() {
            for sink in sinks.iter_mut() {
                if let Err(e) = sink.handle(&event) {
                    eprintln!("EventBus sink error: {e}");
                }
            }
            dispatched += 1;
        }
        dispatched
    }
}
