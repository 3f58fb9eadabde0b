//! In-memory test support for the instrumentation adapters.

use std::sync::{Arc, Mutex};

use opentelemetry::Context;

use crate::segment::{DatastoreReport, ExternalReport};
use crate::sink::SegmentSink;

/// One report received by a [`RecordingSink`].
#[derive(Clone, Debug)]
pub enum Recorded {
    Datastore(DatastoreReport),
    External(ExternalReport),
}

/// Segment sink that appends every report to a shared list.
///
/// Clones share the list, so a test can keep one clone for assertions and
/// hand another to [`Transaction::with_sink`](crate::Transaction::with_sink).
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    reports: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink::default()
    }

    /// All reports received so far, in arrival order.
    pub fn reports(&self) -> Vec<Recorded> {
        self.reports.lock().expect("recording sink poisoned").clone()
    }

    /// The datastore reports only, in arrival order.
    pub fn datastore_reports(&self) -> Vec<DatastoreReport> {
        self.reports()
            .into_iter()
            .filter_map(|recorded| match recorded {
                Recorded::Datastore(report) => Some(report),
                Recorded::External(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().expect("recording sink poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SegmentSink for RecordingSink {
    fn datastore(&self, _parent: &Context, report: DatastoreReport) {
        self.reports
            .lock()
            .expect("recording sink poisoned")
            .push(Recorded::Datastore(report));
    }

    fn external(&self, _parent: &Context, report: ExternalReport) {
        self.reports
            .lock()
            .expect("recording sink poisoned")
            .push(Recorded::External(report));
    }
}
