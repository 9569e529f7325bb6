use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    MessageCreate,
    MessageEdit,
    MessageDelete,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MessageCreate => "message_create",
            Self::MessageEdit => "message_edit",
            Self::MessageDelete => "message_delete",
        }
    }
}

/// Receives one event per outbound platform request that Beacon accounts for.
pub trait MetricsSink: Send + Sync {
    fn record_event(&self, kind: MetricKind, count: u64);
}

/// Emits every event as a debug log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn record_event(&self, kind: MetricKind, count: u64) {
        tracing::debug!(kind = kind.as_str(), count, "platform request recorded");
    }
}

/// In-process counters, one per [`MetricKind`].
#[derive(Debug, Default)]
pub struct CountingMetrics {
    creates: AtomicU64,
    edits: AtomicU64,
    deletes: AtomicU64,
}

impl CountingMetrics {
    pub fn count(&self, kind: MetricKind) -> u64 {
        self.counter(kind).load(Ordering::Relaxed)
    }

    fn counter(&self, kind: MetricKind) -> &AtomicU64 {
        match kind {
            MetricKind::MessageCreate => &self.creates,
            MetricKind::MessageEdit => &self.edits,
            MetricKind::MessageDelete => &self.deletes,
        }
    }
}

impl MetricsSink for CountingMetrics {
    fn record_event(&self, kind: MetricKind, count: u64) {
        self.counter(kind).fetch_add(count, Ordering::Relaxed);
    }
}
