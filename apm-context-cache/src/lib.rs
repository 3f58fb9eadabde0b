//! Timing instrumentation for command-dispatch cache clients.
//!
//! [`wrap_client`] clones a client and intercepts its dispatch path: every
//! command executed through the clone is bracketed by one datastore segment
//! labeled with the command's keyword (`GET`, `SET`, ...), whether the
//! command succeeds or fails. The clone shares the original's underlying
//! connection; the wrapper itself holds no shared mutable state, so each
//! request wraps its own copy.
//!
//! A cache client participates by implementing [`CommandDispatch`]; the
//! command's `Display` form is its textual command line, e.g. `GET key1`.

use std::fmt;
use std::ops::Deref;

use apm_context_core::{DatastoreProduct, DatastoreSegment, Transaction};

/// Dispatch seam of a cache client: one command in, one reply out.
pub trait CommandDispatch {
    /// Command type. Its `Display` form is the textual command line the
    /// operation label is derived from.
    type Command: fmt::Display;
    type Output;
    type Error;

    fn dispatch(&self, cmd: Self::Command) -> Result<Self::Output, Self::Error>;
}

/// Client clone whose dispatch path is bracketed by a segment per command.
#[derive(Clone, Debug)]
pub struct InstrumentedClient<C> {
    inner: C,
    transaction: Transaction,
}

/// Returns a clone of `client` whose commands are timed against `txn`.
pub fn wrap_client<C>(txn: &Transaction, client: &C) -> InstrumentedClient<C>
where
    C: CommandDispatch + Clone,
{
    InstrumentedClient {
        inner: client.clone(),
        transaction: txn.clone(),
    }
}

impl<C> InstrumentedClient<C> {
    /// The wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: CommandDispatch> CommandDispatch for InstrumentedClient<C> {
    type Command = C::Command;
    type Output = C::Output;
    type Error = C::Error;

    fn dispatch(&self, cmd: Self::Command) -> Result<Self::Output, Self::Error> {
        let start = self.transaction.start_segment_now();
        let operation = operation_of(&cmd.to_string());
        let result = self.inner.dispatch(cmd);
        DatastoreSegment::new(start, DatastoreProduct::Redis, operation).end();
        result
    }
}

impl<C> Deref for InstrumentedClient<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.inner
    }
}

/// First space-delimited token of the command line: `GET` for `GET key1`.
fn operation_of(command_line: &str) -> String {
    command_line.split(' ').next().unwrap_or_default().to_owned()
}
