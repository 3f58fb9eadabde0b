use crate::Scope;

/// Operation kinds an ORM exposes callback chains for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    Create,
    Query,
    Update,
    Delete,
    RowQuery,
}

impl CallbackKind {
    /// Chain name, as used in hook registration names.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackKind::Create => "create",
            CallbackKind::Query => "query",
            CallbackKind::Update => "update",
            CallbackKind::Delete => "delete",
            CallbackKind::RowQuery => "row_query",
        }
    }
}

/// Where in an operation's callback chain a hook is installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookStage {
    /// Immediately before the ORM's own processing step for the operation.
    BeforeOperation,
    /// Immediately after the ORM's own processing step. The ORM fires this
    /// for failed operations too.
    AfterOperation,
    /// After the ORM's internal commit-or-rollback step.
    AfterCommitOrRollback,
}

/// A hook installed on a callback chain, handed the per-call scope.
pub type Hook = Box<dyn Fn(&mut Scope) + Send + Sync>;

/// Registration surface of a callback-based ORM connection.
///
/// Implemented by an ORM integration; [`register_callbacks`] is the only
/// caller.
///
/// [`register_callbacks`]: crate::register_callbacks
pub trait CallbackRegistry {
    /// Name of the configured backend dialect, e.g. `postgres`.
    fn dialect_name(&self) -> &str;

    /// Installs `hook` under `name` on the chain for `kind` at `stage`.
    fn register(&mut self, kind: CallbackKind, stage: HookStage, name: &str, hook: Hook);
}
