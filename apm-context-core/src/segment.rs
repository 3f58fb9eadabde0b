use std::time::SystemTime;

use crate::product::DatastoreProduct;
use crate::transaction::SegmentStart;

/// One timed datastore span: a start marker plus descriptive fields.
///
/// The segment is inert until [`end`](DatastoreSegment::end) consumes it;
/// the move makes closing it twice unrepresentable.
#[derive(Debug)]
pub struct DatastoreSegment {
    start: SegmentStart,
    product: DatastoreProduct,
    operation: String,
    query: Option<String>,
    collection: Option<String>,
}

impl DatastoreSegment {
    /// Builds a segment for `operation` (e.g. `SELECT`) against `product`.
    pub fn new(
        start: SegmentStart,
        product: DatastoreProduct,
        operation: impl Into<String>,
    ) -> Self {
        DatastoreSegment {
            start,
            product,
            operation: operation.into(),
            query: None,
            collection: None,
        }
    }

    /// Attaches the issued query text.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Attaches the target collection, e.g. a table name.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Closes the segment: captures the end time and reports the elapsed
    /// window through the transaction's sink.
    pub fn end(self) {
        let DatastoreSegment {
            start,
            product,
            operation,
            query,
            collection,
        } = self;
        let report = DatastoreReport {
            product,
            operation,
            query,
            collection,
            started_at: start.started_at,
            ended_at: SystemTime::now(),
        };
        start
            .transaction
            .sink()
            .datastore(start.transaction.context(), report);
    }
}

/// One timed span for an outbound HTTP call.
#[derive(Debug)]
pub struct ExternalSegment {
    start: SegmentStart,
    method: String,
    url: String,
    status: Option<u16>,
}

impl ExternalSegment {
    /// Builds a segment for an outbound call of `method` to `url`.
    pub fn new(start: SegmentStart, method: impl Into<String>, url: impl Into<String>) -> Self {
        ExternalSegment {
            start,
            method: method.into(),
            url: url.into(),
            status: None,
        }
    }

    /// Attaches the response status code, when the call got that far.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Closes the segment and reports it through the transaction's sink.
    pub fn end(self) {
        let ExternalSegment {
            start,
            method,
            url,
            status,
        } = self;
        let report = ExternalReport {
            method,
            url,
            status,
            started_at: start.started_at,
            ended_at: SystemTime::now(),
        };
        start
            .transaction
            .sink()
            .external(start.transaction.context(), report);
    }
}

/// Finished datastore segment as delivered to a [`SegmentSink`](crate::SegmentSink).
#[derive(Clone, Debug)]
pub struct DatastoreReport {
    pub product: DatastoreProduct,
    pub operation: String,
    pub query: Option<String>,
    pub collection: Option<String>,
    pub started_at: SystemTime,
    pub ended_at: SystemTime,
}

/// Finished outbound-HTTP segment as delivered to a [`SegmentSink`](crate::SegmentSink).
#[derive(Clone, Debug)]
pub struct ExternalReport {
    pub method: String,
    pub url: String,
    pub status: Option<u16>,
    pub started_at: SystemTime,
    pub ended_at: SystemTime,
}
