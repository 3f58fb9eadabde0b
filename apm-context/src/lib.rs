//! Carries an APM transaction through a request's execution context and
//! attaches timing instrumentation to outbound database, cache, and HTTP
//! calls.
//!
//! The transaction handle is attached once, where the request enters the
//! application; everything downstream reads it back from the context and
//! opens segments against it:
//!
//! ```
//! use apm_context::{Transaction, TransactionContextExt};
//! use opentelemetry::Context;
//!
//! // where the request comes in
//! let txn = Transaction::new(Context::current());
//! let cx = Context::current().with_transaction(txn);
//!
//! // anywhere downstream of the attachment
//! let txn = cx.transaction();
//! # let _ = txn;
//! ```
//!
//! The wrappers below pull the transaction from the context and delegate to
//! the per-library adapters; see [`orm`] and [`cache`] for the seams an
//! integration implements.

mod context;
mod http_client;

pub use context::TransactionContextExt;
pub use http_client::InstrumentedHttpClient;

pub use apm_context_core::{
    DatastoreProduct, DatastoreReport, DatastoreSegment, ExternalReport, ExternalSegment,
    OtelSegmentSink, SegmentSink, SegmentStart, Transaction,
};

#[doc(inline)]
pub use apm_context_cache as cache;
#[doc(inline)]
pub use apm_context_orm as orm;

use apm_context_cache::{CommandDispatch, InstrumentedClient};
use apm_context_orm::BindTransaction;
use opentelemetry::Context;
use opentelemetry_http::HttpClient;

/// Clones `db` with the context's transaction bound, so ORM calls made
/// through the clone are instrumented.
///
/// # Panics
///
/// Panics when `cx` has no transaction attached.
pub fn bind_transaction_from_context<D: BindTransaction>(cx: &Context, db: &D) -> D {
    db.bind_transaction(cx.transaction().clone())
}

/// Clones `client` with its command dispatch timed against the context's
/// transaction.
///
/// # Panics
///
/// Panics when `cx` has no transaction attached.
pub fn wrap_cache_client<C>(cx: &Context, client: &C) -> InstrumentedClient<C>
where
    C: CommandDispatch + Clone,
{
    apm_context_cache::wrap_client(cx.transaction(), client)
}

/// Wraps an HTTP client so outbound calls are traced against the context's
/// transaction.
///
/// # Panics
///
/// Panics when `cx` has no transaction attached.
pub fn wrap_http_client<C: HttpClient>(cx: &Context, client: C) -> InstrumentedHttpClient<C> {
    InstrumentedHttpClient::new(cx.transaction().clone(), client)
}
