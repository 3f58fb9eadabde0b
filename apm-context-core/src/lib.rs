//! Agent-facing layer shared by the `apm-context` instrumentation adapters.
//!
//! A [`Transaction`] is a cheaply cloneable handle for one logical unit of
//! monitored work, typically one inbound request. Adapters ask it for a
//! [`SegmentStart`] when an outbound call begins and close a
//! [`DatastoreSegment`] or [`ExternalSegment`] when the call completes; the
//! finished segment is delivered to the transaction's [`SegmentSink`].
//!
//! The production sink, [`OtelSegmentSink`], reports each segment as a
//! client-kind OpenTelemetry span with explicit start and end timestamps,
//! parented on the context the transaction was created from. Tests inject
//! [`testing::RecordingSink`] instead.
//!
//! ```
//! use apm_context_core::{DatastoreProduct, DatastoreSegment, Transaction};
//! use opentelemetry::Context;
//!
//! let txn = Transaction::new(Context::current());
//!
//! let start = txn.start_segment_now();
//! // ... issue the query ...
//! DatastoreSegment::new(start, DatastoreProduct::Postgres, "SELECT")
//!     .with_query("SELECT * FROM users")
//!     .with_collection("users")
//!     .end();
//! ```

mod product;
mod segment;
mod sink;
mod transaction;

pub use product::DatastoreProduct;
pub use segment::{DatastoreReport, DatastoreSegment, ExternalReport, ExternalSegment};
pub use sink::{OtelSegmentSink, SegmentSink};
pub use transaction::{SegmentStart, Transaction};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
