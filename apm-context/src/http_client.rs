use apm_context_core::{ExternalSegment, Transaction};
use async_trait::async_trait;
use opentelemetry::global;
use opentelemetry_http::{Bytes, HeaderInjector, HttpClient, HttpError, Request, Response};

/// HTTP client whose outbound calls are traced against a transaction.
///
/// Each request gets trace headers injected from the transaction's context
/// through the global text-map propagator and is reported as one external
/// segment, whether or not the underlying send succeeds. The response or
/// error passes through unchanged.
#[derive(Clone, Debug)]
pub struct InstrumentedHttpClient<C> {
    inner: C,
    transaction: Transaction,
}

impl<C> InstrumentedHttpClient<C> {
    pub fn new(transaction: Transaction, inner: C) -> Self {
        InstrumentedHttpClient { inner, transaction }
    }

    /// The wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for InstrumentedHttpClient<C> {
    async fn send_bytes(&self, mut request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
        global::get_text_map_propagator(|propagator| {
            propagator.inject_context(
                self.transaction.context(),
                &mut HeaderInjector(request.headers_mut()),
            )
        });

        let method = request.method().to_string();
        let url = request.uri().to_string();
        let start = self.transaction.start_segment_now();
        let result = self.inner.send_bytes(request).await;

        let mut segment = ExternalSegment::new(start, method, url);
        if let Ok(response) = &result {
            segment = segment.with_status(response.status().as_u16());
        }
        segment.end();

        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use apm_context_core::testing::{Recorded, RecordingSink};
    use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};
    use opentelemetry::Context;
    use opentelemetry_sdk::propagation::TraceContextPropagator;

    use super::*;

    /// Captures the headers of every request and answers with a canned
    /// status or error.
    #[derive(Clone, Debug)]
    struct FakeClient {
        status: u16,
        fail: bool,
        seen_headers: Arc<Mutex<Vec<http::HeaderMap>>>,
    }

    impl FakeClient {
        fn new(status: u16, fail: bool) -> Self {
            FakeClient {
                status,
                fail,
                seen_headers: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl HttpClient for FakeClient {
        async fn send_bytes(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            self.seen_headers
                .lock()
                .unwrap()
                .push(request.headers().clone());
            if self.fail {
                return Err("connection refused".into());
            }
            Ok(Response::builder()
                .status(self.status)
                .body(Bytes::new())
                .expect("valid response"))
        }
    }

    fn request() -> Request<Bytes> {
        Request::builder()
            .method("GET")
            .uri("https://example.com/health")
            .body(Bytes::new())
            .expect("valid request")
    }

    fn external_reports(sink: &RecordingSink) -> Vec<apm_context_core::ExternalReport> {
        sink.reports()
            .into_iter()
            .filter_map(|recorded| match recorded {
                Recorded::External(report) => Some(report),
                Recorded::Datastore(_) => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn successful_call_reports_method_url_and_status() {
        let sink = RecordingSink::new();
        let txn = Transaction::with_sink(Context::new(), Arc::new(sink.clone()));
        let client = InstrumentedHttpClient::new(txn, FakeClient::new(204, false));

        let response = client.send_bytes(request()).await.expect("send");
        assert_eq!(response.status().as_u16(), 204);

        let reports = external_reports(&sink);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].method, "GET");
        assert_eq!(reports[0].url, "https://example.com/health");
        assert_eq!(reports[0].status, Some(204));
    }

    #[tokio::test]
    async fn failed_call_still_reports_one_segment_without_status() {
        let sink = RecordingSink::new();
        let txn = Transaction::with_sink(Context::new(), Arc::new(sink.clone()));
        let client = InstrumentedHttpClient::new(txn, FakeClient::new(0, true));

        let result = client.send_bytes(request()).await;
        assert!(result.is_err());

        let reports = external_reports(&sink);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].status, None);
    }

    #[tokio::test]
    async fn trace_headers_are_injected_from_the_transaction_context() {
        global::set_text_map_propagator(TraceContextPropagator::new());

        let span_context = SpanContext::new(
            TraceId::from_hex("58406520a006649127e371903a2de979").unwrap(),
            SpanId::from_hex("4c721bf33e3caf8f").unwrap(),
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );
        let cx = Context::new().with_remote_span_context(span_context);
        let txn = Transaction::with_sink(cx, Arc::new(RecordingSink::new()));

        let inner = FakeClient::new(200, false);
        let client = InstrumentedHttpClient::new(txn, inner.clone());
        client.send_bytes(request()).await.expect("send");

        let seen = inner.seen_headers.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let traceparent = seen[0]
            .get("traceparent")
            .expect("traceparent header injected")
            .to_str()
            .unwrap();
        assert!(traceparent.contains("58406520a006649127e371903a2de979"));
    }
}
