//! Composition of calls: dependent sequences and concurrent fan-out.
//!
//! Both helpers work on any future yielding a `Result`, so they compose
//! client calls, scenario functions, or each other.

use std::future::Future;

use futures::future::try_join_all;

/// Run `first`, then feed its output to `next` and run the future it
/// returns.
///
/// If `first` fails, `next` is never invoked and the error is returned
/// unchanged. The first output is moved into `next` and not kept.
pub async fn chain<A, U, F, B, T, E>(first: A, next: F) -> Result<T, E>
where
    A: Future<Output = Result<U, E>>,
    F: FnOnce(U) -> B,
    B: Future<Output = Result<T, E>>,
{
    let output = first.await?;
    next(output).await
}

/// Drive every call concurrently and collect the results in issuance order.
///
/// All calls are started on the first poll, before any of them is awaited to
/// completion. The first failure observed ends the fan-out with that error;
/// calls still in flight are dropped.
pub async fn fan_out<I, F, T, E>(calls: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let calls: Vec<F> = calls.into_iter().collect();
    tracing::debug!(count = calls.len(), "fan-out started");
    try_join_all(calls).await
}
