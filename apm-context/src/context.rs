use apm_context_core::Transaction;
use opentelemetry::Context;

/// Attach and read the transaction handle on an execution context.
pub trait TransactionContextExt {
    /// Returns a derived context with `txn` bound. The context this is
    /// called on is left untouched.
    fn with_transaction(&self, txn: Transaction) -> Context;

    /// The transaction bound on this context chain.
    ///
    /// # Panics
    ///
    /// Panics when no transaction was attached upstream. That is a wiring
    /// bug in the caller, not a runtime condition to recover from.
    fn transaction(&self) -> &Transaction;
}

impl TransactionContextExt for Context {
    fn with_transaction(&self, txn: Transaction) -> Context {
        self.with_value(txn)
    }

    fn transaction(&self) -> &Transaction {
        self.get::<Transaction>()
            .expect("no transaction attached to context")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use apm_context_core::testing::RecordingSink;
    use apm_context_core::{DatastoreProduct, DatastoreSegment};

    use super::*;

    #[test]
    fn read_back_transaction_reports_to_the_attached_sink() {
        let sink = RecordingSink::new();
        let txn = Transaction::with_sink(Context::new(), Arc::new(sink.clone()));
        let cx = Context::new().with_transaction(txn);

        let read_back = cx.transaction();
        DatastoreSegment::new(
            read_back.start_segment_now(),
            DatastoreProduct::Postgres,
            "SELECT",
        )
        .end();

        assert_eq!(sink.datastore_reports().len(), 1);
    }

    #[test]
    fn attaching_does_not_mutate_the_parent_context() {
        let parent = Context::new();
        let txn = Transaction::with_sink(Context::new(), Arc::new(RecordingSink::new()));

        let child = parent.with_transaction(txn);

        assert!(parent.get::<Transaction>().is_none());
        assert!(child.get::<Transaction>().is_some());
    }

    #[test]
    fn later_attachment_overrides_earlier_one() {
        let first_sink = RecordingSink::new();
        let second_sink = RecordingSink::new();
        let cx = Context::new()
            .with_transaction(Transaction::with_sink(
                Context::new(),
                Arc::new(first_sink.clone()),
            ))
            .with_transaction(Transaction::with_sink(
                Context::new(),
                Arc::new(second_sink.clone()),
            ));

        DatastoreSegment::new(
            cx.transaction().start_segment_now(),
            DatastoreProduct::Redis,
            "GET",
        )
        .end();

        assert!(first_sink.is_empty());
        assert_eq!(second_sink.len(), 1);
    }

    #[test]
    #[should_panic(expected = "no transaction attached to context")]
    fn reading_before_attachment_panics() {
        let _ = Context::new().transaction();
    }
}
