//! Generic bounded fan-out over a sequence of items.
//!
//! Tasks are spawned up front but gated on a semaphore, so at most
//! `max_concurrency` of them execute at any instant. The call returns
//! only after every task has completed, and every item produces exactly
//! one result (completion order inside the pool is unspecified; results
//! are collected in submission order).

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

/// Per-item completion callback, receiving a human-readable label for
/// progress reporting. Must not affect scheduling.
pub type ProgressHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Run `work` over `items` with at most `max_concurrency` tasks in
/// flight.
///
/// A `max_concurrency` of 1 degenerates to strict sequential execution.
/// If a progress hook is given it is invoked exactly once per item, as
/// that item completes.
pub async fn run_bounded<I, T, F, Fut>(
    items: Vec<I>,
    max_concurrency: usize,
    progress: Option<ProgressHook>,
    label: impl Fn(&I) -> String,
    work: F,
) -> Vec<T>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut handles = Vec::with_capacity(items.len());

    for item in items {
        let sem = semaphore.clone();
        let work = work.clone();
        let progress = progress.clone();
        let item_label = label(&item);

        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire().await.expect("semaphore closed");
            let out = work(item).await;
            if let Some(hook) = &progress {
                hook(&item_label);
            }
            out
        }));
    }

    // Join barrier: the pool only returns complete result sets.
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.expect("worker task panicked"));
    }
    results
}
