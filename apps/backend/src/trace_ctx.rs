//! Task-local trace context for web requests.
//!
//! Gives any code on the request path access to the current trace id
//! without threading it through every signature. The scope is established
//! by the request-trace middleware; outside a request there is no trace
//! id and lookups fall back to `"unknown"`.
//!
//! This module belongs to the web boundary; coordination services must
//! not import it.

use std::cell::RefCell;

use tokio::task_local;

task_local! {
    static TRACE_ID: RefCell<Option<String>>;
}

/// The trace id for the current task, or `"unknown"` outside a request.
pub fn trace_id() -> String {
    TRACE_ID
        .try_with(|cell| {
            cell.borrow()
                .as_ref()
                .cloned()
                .unwrap_or_else(|| "unknown".to_string())
        })
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Run a future with the given trace id in scope.
pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    TRACE_ID.scope(RefCell::new(Some(trace_id)), future).await
}
