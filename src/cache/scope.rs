//! Scope providers.
//!
//! A scope isolates otherwise identical keys, typically per tenant. It is appended as
//! the last field of a full key so it can be invalidated on its own while every coarser
//! level stays reachable without knowing it.
//!
//! [`TaskScope`] reads the scope from a `tokio::task_local!` set by the surrounding
//! request with [`with_scope`]:
//!
//! ```ignore
//! let key = scope::with_scope("tenant-a", async {
//!     builder.full_key(&call)
//! })
//! .await;
//! ```

use std::future::Future;

tokio::task_local! {
    static SCOPE: String;
}

/// Supplies the scope for the current call, or `None` for no scope.
///
/// The scope must not contain `|`. An empty string is treated like `None`.
pub trait ScopeProvider: Send + Sync {
    fn scope(&self) -> Option<String>;
}

impl<F> ScopeProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn scope(&self) -> Option<String> {
        self()
    }
}

/// Never scopes keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoScope;

impl ScopeProvider for NoScope {
    fn scope(&self) -> Option<String> {
        None
    }
}

/// Same scope for every call.
#[derive(Debug, Clone)]
pub struct FixedScope(String);

impl FixedScope {
    pub fn new(scope: impl Into<String>) -> Self {
        Self(scope.into())
    }
}

impl ScopeProvider for FixedScope {
    fn scope(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Reads the ambient task-local scope, falling back to an optional default.
#[derive(Debug, Clone, Default)]
pub struct TaskScope {
    default: Option<String>,
}

impl TaskScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope used when no task-local scope is active.
    pub fn with_default(default: Option<String>) -> Self {
        Self { default }
    }
}

impl ScopeProvider for TaskScope {
    fn scope(&self) -> Option<String> {
        current().or_else(|| self.default.clone())
    }
}

/// The task-local scope, if one is active.
pub fn current() -> Option<String> {
    SCOPE.try_with(|scope| scope.clone()).ok()
}

/// Run a future with `scope` as the ambient scope for [`TaskScope`].
pub async fn with_scope<F>(scope: impl Into<String>, f: F) -> F::Output
where
    F: Future,
{
    SCOPE.scope(scope.into(), f).await
}

/// Synchronous counterpart of [`with_scope`].
pub fn sync_with_scope<R>(scope: impl Into<String>, f: impl FnOnce() -> R) -> R {
    SCOPE.sync_scope(scope.into(), f)
}
