//! Task-local access to the running process.
//!
//! Every process body spawned by a [`Node`](crate::Node) runs inside a scope
//! that records its [`Context`], so helpers deep in a call stack can find
//! the current process without threading the context through.

use crate::Context;
use starlang_core::Pid;
use std::future::Future;

tokio::task_local! {
    static CONTEXT: Context;
}

/// Runs `future` with `ctx` installed as the current process.
pub(crate) async fn scope<F>(ctx: Context, future: F) -> F::Output
where
    F: Future,
{
    CONTEXT.scope(ctx, future).await
}

/// Gets the current process's context, or `None` outside a process.
pub fn current() -> Option<Context> {
    CONTEXT.try_with(Context::clone).ok()
}

/// Gets the current process's pid.
///
/// # Panics
///
/// Panics if called outside of a process spawned by a node.
pub fn current_pid() -> Pid {
    CONTEXT.with(Context::pid)
}

/// Gets the current process's pid, or `None` outside a process.
pub fn try_current_pid() -> Option<Pid> {
    CONTEXT.try_with(Context::pid).ok()
}
