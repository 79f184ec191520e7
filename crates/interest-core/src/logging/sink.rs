//! Event sinks injected into tests at construction time.

use std::sync::Mutex;

use super::events::{Level, TestEvent};

/// Destination for [`TestEvent`]s.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &TestEvent);
}

/// Forwards events to `tracing` at the event's level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &TestEvent) {
        let name = event.name();
        let message = event.message();
        match event.level() {
            Level::Trace => tracing::trace!(event = name, "{}", message),
            Level::Debug => tracing::debug!(event = name, "{}", message),
            Level::Info => tracing::info!(event = name, "{}", message),
            Level::Warn => tracing::warn!(event = name, "{}", message),
            Level::Error => tracing::error!(event = name, "{}", message),
        }
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &TestEvent) {}
}

/// Records events in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TestEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<TestEvent> {
        self.lock().clone()
    }

    /// Rendered messages of all recorded events.
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(TestEvent::message).collect()
    }

    /// Iteration numbers of all recorded range iterations.
    pub fn range_iterations(&self) -> Vec<u64> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                TestEvent::RangeIteration { number } => Some(*number),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TestEvent>> {
        // Recorded events stay readable after a panic on another thread.
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &TestEvent) {
        self.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.emit(&TestEvent::RangeIteration { number: 1 });
        sink.emit(&TestEvent::Exited {
            elapsed: Duration::from_millis(5),
        });
        sink.emit(&TestEvent::RangeIteration { number: 2 });

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.range_iterations(), vec![1, 2]);
        assert_eq!(sink.messages()[1], "Exited in 0.005 seconds");

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_null_and_tracing_sinks_accept_events() {
        let event = TestEvent::RangeIteration { number: 4 };
        NullSink.emit(&event);
        TracingSink.emit(&event);
    }
}
