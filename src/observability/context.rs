//! Per-request logging context.
//!
//! # Responsibilities
//! - Hold the key/value pairs bound while one request is processed
//! - Merge new pairs (last writer wins) and clear the whole mapping
//! - Hand the current mapping to the log formatter at emission time
//!
//! # Design Decisions
//! - Backed by `tokio::task_local!`: every request runs inside its own
//!   [`scope`], so concurrent requests never observe each other's keys
//! - Outside a scope `bind`/`clear` are no-ops and the snapshot is empty;
//!   logging code never has to care whether it runs inside a request
//! - Spawned tasks do not inherit the store; use [`scope_with`] to carry a
//!   snapshot across `tokio::spawn`

use std::cell::RefCell;
use std::future::Future;

use serde_json::{Map, Value};

/// Key/value pairs bound to the current request.
pub type Fields = Map<String, Value>;

tokio::task_local! {
    static LOG_CONTEXT: RefCell<Fields>;
}

/// Run `fut` with a fresh, empty context store.
pub async fn scope<F>(fut: F) -> F::Output
where
    F: Future,
{
    scope_with(Fields::new(), fut).await
}

/// Run `fut` with a context store pre-populated with `fields`.
pub async fn scope_with<F>(fields: Fields, fut: F) -> F::Output
where
    F: Future,
{
    LOG_CONTEXT.scope(RefCell::new(fields), fut).await
}

/// Merge `pairs` into the current store, overwriting existing keys.
pub fn bind<I, K, V>(pairs: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let _ = LOG_CONTEXT.try_with(|store| {
        if let Ok(mut store) = store.try_borrow_mut() {
            for (key, value) in pairs {
                store.insert(key.into(), value.into());
            }
        }
    });
}

/// Remove every key from the current store.
pub fn clear() {
    let _ = LOG_CONTEXT.try_with(|store| {
        if let Ok(mut store) = store.try_borrow_mut() {
            store.clear();
        }
    });
}

/// Copy of the current store; empty outside a scope.
pub fn snapshot() -> Fields {
    with_current(Fields::clone).unwrap_or_default()
}

/// Borrow the current store without copying it.
///
/// Returns `None` outside a scope.
pub fn with_current<R>(f: impl FnOnce(&Fields) -> R) -> Option<R> {
    LOG_CONTEXT
        .try_with(|store| store.try_borrow().ok().map(|store| f(&store)))
        .ok()
        .flatten()
}

/// Whether the caller runs inside a context scope.
pub fn is_scoped() -> bool {
    LOG_CONTEXT.try_with(|_| ()).is_ok()
}
