use apm_context_core::{SegmentStart, Transaction};

/// Per-call state threaded through the before/after/commit hook phases of
/// one ORM operation.
///
/// The ORM integration creates one scope per issued call and discards it
/// when the call completes; concurrent calls never share a scope, so the
/// pending start marker needs no synchronization.
#[derive(Debug)]
pub struct Scope {
    transaction: Option<Transaction>,
    pending: Option<SegmentStart>,
    sql: String,
    table: String,
    started_transaction: bool,
}

impl Scope {
    /// Scope for a call issuing `sql` against `table`. An empty table name
    /// means the call has no single target, e.g. a raw query.
    pub fn new(sql: impl Into<String>, table: impl Into<String>) -> Self {
        Scope {
            transaction: None,
            pending: None,
            sql: sql.into(),
            table: table.into(),
            started_transaction: false,
        }
    }

    /// Binds the transaction the call runs under. Scopes without one are
    /// not instrumented.
    pub fn with_transaction(mut self, txn: Transaction) -> Self {
        self.transaction = Some(txn);
        self
    }

    /// Records that the ORM wrapped this call in an implicit database
    /// transaction, so an internal commit-or-rollback step will follow.
    pub fn mark_started_transaction(&mut self) {
        self.started_transaction = true;
    }

    /// The issued query text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The target table name, possibly empty.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub(crate) fn started_transaction(&self) -> bool {
        self.started_transaction
    }

    /// Starts a pending segment, unless the call opted out by never
    /// binding a transaction.
    pub(crate) fn arm(&mut self) {
        if let Some(txn) = &self.transaction {
            self.pending = Some(txn.start_segment_now());
        }
    }

    /// Takes the pending start, leaving the scope with none; `None` means
    /// no segment is due.
    pub(crate) fn take_pending(&mut self) -> Option<SegmentStart> {
        self.pending.take()
    }
}
