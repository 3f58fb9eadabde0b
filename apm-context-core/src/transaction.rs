use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use opentelemetry::Context;

use crate::sink::{OtelSegmentSink, SegmentSink};

/// Handle for one logical unit of monitored work.
///
/// The handle is created where the unit of work enters the application and
/// carried through its execution context; instrumentation adapters read it
/// back and open segments against it. Segments become child spans of the
/// context captured at construction. The handle never outlives the call
/// chain it is carried on and holds no state of its own beyond the sink.
#[derive(Clone)]
pub struct Transaction {
    cx: Context,
    sink: Arc<dyn SegmentSink>,
}

impl Transaction {
    /// Creates a transaction reporting through the globally registered
    /// OpenTelemetry tracer provider, with segments parented on `cx`.
    pub fn new(cx: Context) -> Self {
        Transaction::with_sink(cx, Arc::new(OtelSegmentSink::new()))
    }

    /// Creates a transaction reporting through the given sink.
    ///
    /// This is the seam test code uses to substitute a recording sink for
    /// the span-emitting one.
    pub fn with_sink(cx: Context, sink: Arc<dyn SegmentSink>) -> Self {
        Transaction { cx, sink }
    }

    /// Captures the current wall-clock time as the start of a new segment.
    pub fn start_segment_now(&self) -> SegmentStart {
        SegmentStart {
            started_at: SystemTime::now(),
            transaction: self.clone(),
        }
    }

    /// The context segments of this transaction are parented on.
    pub fn context(&self) -> &Context {
        &self.cx
    }

    pub(crate) fn sink(&self) -> &dyn SegmentSink {
        self.sink.as_ref()
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction").finish_non_exhaustive()
    }
}

/// Pending start marker produced by [`Transaction::start_segment_now`].
///
/// Adapters hold one of these between the moment an outbound call begins
/// and the moment its segment is closed.
#[derive(Clone, Debug)]
pub struct SegmentStart {
    pub(crate) started_at: SystemTime,
    pub(crate) transaction: Transaction,
}

impl SegmentStart {
    /// When the segment began.
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }
}
