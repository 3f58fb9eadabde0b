use std::fmt;

use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::trace::{Span, SpanKind, Tracer};
use opentelemetry::{Context, KeyValue};
use opentelemetry_semantic_conventions::attribute::{
    DB_COLLECTION_NAME, DB_OPERATION_NAME, DB_QUERY_TEXT, DB_SYSTEM_NAME, HTTP_REQUEST_METHOD,
    HTTP_RESPONSE_STATUS_CODE, URL_FULL,
};

use crate::segment::{DatastoreReport, ExternalReport};

/// Instrumentation scope name for spans produced by this crate.
const SCOPE_NAME: &str = "apm-context";

/// Receiver for finished segments.
///
/// Injected into a [`Transaction`](crate::Transaction) at construction.
/// Production code uses [`OtelSegmentSink`]; tests substitute
/// `testing::RecordingSink`.
pub trait SegmentSink: Send + Sync {
    /// Delivers one finished datastore segment, parented on the
    /// transaction's context.
    fn datastore(&self, parent: &Context, report: DatastoreReport);

    /// Delivers one finished outbound-HTTP segment.
    fn external(&self, parent: &Context, report: ExternalReport);
}

/// Reports segments as client-kind OpenTelemetry spans, preserving the
/// report's start and end timestamps.
pub struct OtelSegmentSink<T = BoxedTracer> {
    tracer: T,
}

impl OtelSegmentSink<BoxedTracer> {
    /// Reports through the globally registered tracer provider.
    pub fn new() -> Self {
        OtelSegmentSink {
            tracer: global::tracer(SCOPE_NAME),
        }
    }
}

impl Default for OtelSegmentSink<BoxedTracer> {
    fn default() -> Self {
        OtelSegmentSink::new()
    }
}

impl<T> OtelSegmentSink<T> {
    /// Reports through the given tracer instead of the global one.
    pub fn with_tracer(tracer: T) -> Self {
        OtelSegmentSink { tracer }
    }
}

impl<T> fmt::Debug for OtelSegmentSink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtelSegmentSink").finish_non_exhaustive()
    }
}

impl<T> SegmentSink for OtelSegmentSink<T>
where
    T: Tracer + Send + Sync,
{
    fn datastore(&self, parent: &Context, report: DatastoreReport) {
        let mut attributes = vec![
            KeyValue::new(DB_SYSTEM_NAME, report.product.as_str()),
            KeyValue::new(DB_OPERATION_NAME, report.operation.clone()),
        ];
        if let Some(query) = report.query {
            attributes.push(KeyValue::new(DB_QUERY_TEXT, query));
        }
        let name = match &report.collection {
            Some(collection) => {
                attributes.push(KeyValue::new(DB_COLLECTION_NAME, collection.clone()));
                format!("{} {}", report.operation, collection)
            }
            None => report.operation.clone(),
        };

        let mut span = self
            .tracer
            .span_builder(name)
            .with_kind(SpanKind::Client)
            .with_start_time(report.started_at)
            .with_attributes(attributes)
            .start_with_context(&self.tracer, parent);
        span.end_with_timestamp(report.ended_at);
    }

    fn external(&self, parent: &Context, report: ExternalReport) {
        let mut attributes = vec![
            KeyValue::new(HTTP_REQUEST_METHOD, report.method.clone()),
            KeyValue::new(URL_FULL, report.url.clone()),
        ];
        if let Some(status) = report.status {
            attributes.push(KeyValue::new(HTTP_RESPONSE_STATUS_CODE, i64::from(status)));
        }

        let mut span = self
            .tracer
            .span_builder(format!("HTTP {}", report.method))
            .with_kind(SpanKind::Client)
            .with_start_time(report.started_at)
            .with_attributes(attributes)
            .start_with_context(&self.tracer, parent);
        span.end_with_timestamp(report.ended_at);
    }
}
