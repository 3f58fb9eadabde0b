//! Timing instrumentation for callback-based ORM connections.
//!
//! ORMs in the mold of ActiveRecord expose named callback chains around each
//! operation kind (create, query, update, delete, raw row query).
//! [`register_callbacks`] hangs a before/after hook pair on each chain, plus
//! a commit-or-rollback hook for the kinds the ORM may silently wrap in an
//! implicit database transaction. Once registered, every operation issued
//! with a bound [`Transaction`] is reported as one datastore segment; an
//! implicit commit or rollback is reported as a second `COMMIT/ROLLBACK`
//! segment. Operations without a bound transaction are left untouched.
//!
//! An integration bridges its ORM by implementing [`CallbackRegistry`] for
//! the connection type and constructing a [`Scope`] per call:
//!
//! ```rust,ignore
//! let mut db = PgConnection::connect(dsn)?;
//! apm_context_orm::register_callbacks(&mut db);
//!
//! // per request:
//! let db = db.bind_transaction(cx.transaction().clone());
//! db.find::<User>(id)?; // reported as one SELECT segment
//! ```
//!
//! Registration inspects the connection's dialect; dialects without a
//! datastore category mapping are skipped and the connection stays
//! uninstrumented.

mod registry;
mod scope;

pub use registry::{CallbackKind, CallbackRegistry, Hook, HookStage};
pub use scope::Scope;

use std::sync::Arc;

use apm_context_core::{DatastoreProduct, DatastoreSegment, Transaction};

/// Binds a transaction to a connection so every subsequent call's scope
/// carries it.
///
/// Implementations clone the connection, leaving the original unbound;
/// concurrent requests each bind their own clone.
pub trait BindTransaction: Sized {
    fn bind_transaction(&self, txn: Transaction) -> Self;
}

/// Installs timing hooks on the connection's callback chains.
///
/// Call once during application setup, after the connection is configured.
/// Connections with an unsupported dialect are left alone and registration
/// is a no-op.
pub fn register_callbacks(db: &mut dyn CallbackRegistry) {
    let Some(product) = product_for_dialect(db.dialect_name()) else {
        tracing::debug!(
            dialect = db.dialect_name(),
            "no datastore category for dialect, skipping instrumentation"
        );
        return;
    };
    let callbacks = Arc::new(Callbacks::new(product));
    register(db, CallbackKind::Create, Some("INSERT"), &callbacks);
    register(db, CallbackKind::Query, Some("SELECT"), &callbacks);
    register(db, CallbackKind::Update, Some("UPDATE"), &callbacks);
    register(db, CallbackKind::Delete, Some("DELETE"), &callbacks);
    register(db, CallbackKind::RowQuery, None, &callbacks);
}

/// Maps an ORM dialect name to the category its segments report under.
fn product_for_dialect(dialect: &str) -> Option<DatastoreProduct> {
    match dialect {
        "postgres" => Some(DatastoreProduct::Postgres),
        "mysql" => Some(DatastoreProduct::MySql),
        "sqlite3" => Some(DatastoreProduct::Sqlite),
        "mssql" => Some(DatastoreProduct::Mssql),
        _ => None,
    }
}

fn register(
    db: &mut dyn CallbackRegistry,
    kind: CallbackKind,
    operation: Option<&'static str>,
    callbacks: &Arc<Callbacks>,
) {
    let before = Arc::clone(callbacks);
    db.register(
        kind,
        HookStage::BeforeOperation,
        &format!("apm:{}_before", kind.as_str()),
        Box::new(move |scope| before.before(scope)),
    );

    let after = Arc::clone(callbacks);
    db.register(
        kind,
        HookStage::AfterOperation,
        &format!("apm:{}_after", kind.as_str()),
        Box::new(move |scope| after.after(scope, operation)),
    );

    // Creates, updates and deletes may be wrapped in an implicit database
    // transaction whose commit-or-rollback step is timed separately.
    if matches!(
        kind,
        CallbackKind::Create | CallbackKind::Update | CallbackKind::Delete
    ) {
        let commit = Arc::clone(callbacks);
        db.register(
            kind,
            HookStage::AfterCommitOrRollback,
            &format!("apm:commit_or_rollback_{}", kind.as_str()),
            Box::new(move |scope| commit.commit_or_rollback(scope)),
        );
    }
}

struct Callbacks {
    product: DatastoreProduct,
}

impl Callbacks {
    fn new(product: DatastoreProduct) -> Self {
        Callbacks { product }
    }

    fn before(&self, scope: &mut Scope) {
        // No transaction bound means the call opted out of instrumentation.
        scope.arm();
    }

    fn after(&self, scope: &mut Scope, operation: Option<&str>) {
        let Some(start) = scope.take_pending() else {
            return;
        };
        let operation = match operation {
            Some(operation) => operation.to_owned(),
            None => derive_operation(scope.sql()),
        };
        let mut segment =
            DatastoreSegment::new(start, self.product, operation).with_query(scope.sql());
        if !scope.table().is_empty() {
            segment = segment.with_collection(scope.table());
        }
        segment.end();

        // Re-arm when the ORM opened an implicit transaction for this call:
        // its commit-or-rollback step fires next and must be timed too.
        if scope.started_transaction() {
            scope.arm();
        }
    }

    fn commit_or_rollback(&self, scope: &mut Scope) {
        let Some(start) = scope.take_pending() else {
            return;
        };
        let mut segment = DatastoreSegment::new(start, self.product, "COMMIT/ROLLBACK");
        if !scope.table().is_empty() {
            segment = segment.with_collection(scope.table());
        }
        segment.end();
    }
}

/// First space-delimited token of the query, upper-cased. Queries with
/// leading whitespace or comments derive an empty or bogus label; kept as
/// is so reported labels stay stable.
fn derive_operation(sql: &str) -> String {
    sql.split(' ').next().unwrap_or_default().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_is_first_token_upper_cased() {
        assert_eq!(derive_operation("select * from users"), "SELECT");
        assert_eq!(derive_operation("INSERT INTO users VALUES (1)"), "INSERT");
        assert_eq!(derive_operation("vacuum"), "VACUUM");
    }

    #[test]
    fn operation_of_leading_whitespace_is_empty() {
        assert_eq!(derive_operation(" select 1"), "");
        assert_eq!(derive_operation(""), "");
    }

    #[test]
    fn known_dialects_map_to_products() {
        assert_eq!(
            product_for_dialect("postgres"),
            Some(DatastoreProduct::Postgres)
        );
        assert_eq!(product_for_dialect("mysql"), Some(DatastoreProduct::MySql));
        assert_eq!(
            product_for_dialect("sqlite3"),
            Some(DatastoreProduct::Sqlite)
        );
        assert_eq!(product_for_dialect("mssql"), Some(DatastoreProduct::Mssql));
        assert_eq!(product_for_dialect("oracle"), None);
        assert_eq!(product_for_dialect(""), None);
    }
}
