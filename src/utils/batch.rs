// Bounded-concurrency batch execution
//
// Items are split into fixed-size chunks. Every operation in a chunk runs
// concurrently and the whole chunk settles before the next one starts.

use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::debug;

/// Outcome of a single batched operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<T> {
    Fulfilled(T),
    Rejected(String),
}

impl<T> Settled<T> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settled::Fulfilled(_))
    }
}

/// Run `op` over `items`, at most `batch_size` at a time.
///
/// Returns one outcome per item, in input order. A failing or panicking
/// operation is reported as `Rejected` and never stops the rest of the run.
/// A `batch_size` of zero is treated as one.
pub async fn settle_in_batches<I, T, E, F, Fut>(
    items: Vec<I>,
    batch_size: usize,
    mut op: F,
) -> Vec<Settled<T>>
where
    F: FnMut(I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let batch_size = batch_size.max(1);
    let total = items.len();
    let mut outcomes = Vec::with_capacity(total);
    let mut remaining = items.into_iter().peekable();
    let mut chunk_index = 0usize;

    while remaining.peek().is_some() {
        let chunk: Vec<I> = remaining.by_ref().take(batch_size).collect();
        chunk_index += 1;
        debug!(chunk = chunk_index, size = chunk.len(), total, "Starting batch");

        let pending: Vec<_> = chunk
            .into_iter()
            .map(|item| AssertUnwindSafe(op(item)).catch_unwind())
            .collect();

        for result in join_all(pending).await {
            outcomes.push(match result {
                Ok(Ok(value)) => Settled::Fulfilled(value),
                Ok(Err(error)) => Settled::Rejected(error.to_string()),
                Err(payload) => Settled::Rejected(panic_message(payload.as_ref())),
            });
        }
    }

    outcomes
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_chunks_run_sequentially() {
        let completed = Arc::new(AtomicUsize::new(0));
        let observed = Arc::new(Mutex::new(Vec::new()));

        let items: Vec<usize> = (1..=25).collect();
        let outcomes = settle_in_batches(items, 10, |item| {
            let completed = completed.clone();
            let observed = observed.clone();
            async move {
                observed.lock().unwrap().push(completed.load(Ordering::SeqCst));
                tokio::task::yield_now().await;
                completed.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(item)
            }
        })
        .await;

        assert_eq!(outcomes.len(), 25);
        let observed = observed.lock().unwrap().clone();
        // Every item in a chunk starts after the previous chunk has fully settled.
        assert!(observed[..10].iter().all(|&c| c == 0));
        assert!(observed[10..20].iter().all(|&c| c == 10));
        assert!(observed[20..].iter().all(|&c| c == 20));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_other_items() {
        let executed = Arc::new(AtomicUsize::new(0));

        let items: Vec<usize> = (1..=25).collect();
        let outcomes = settle_in_batches(items, 10, |item| {
            let executed = executed.clone();
            async move {
                executed.fetch_add(1, Ordering::SeqCst);
                if item == 3 {
                    Err(format!("item {} failed", item))
                } else {
                    Ok(item * 2)
                }
            }
        })
        .await;

        assert_eq!(executed.load(Ordering::SeqCst), 25);
        assert_eq!(outcomes[2], Settled::Rejected("item 3 failed".to_string()));
        assert_eq!(outcomes.iter().filter(|o| o.is_fulfilled()).count(), 24);
        assert_eq!(outcomes[24], Settled::Fulfilled(50));
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_batch_size() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let outcomes = settle_in_batches((0..23).collect::<Vec<_>>(), 5, |_| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, String>(())
            }
        })
        .await;

        assert_eq!(outcomes.len(), 23);
        assert_eq!(peak.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_panic_is_reported_as_rejection() {
        let outcomes = settle_in_batches(vec![1, 2, 3], 2, |item| async move {
            if item == 2 {
                panic!("boom");
            }
            Ok::<_, String>(item)
        })
        .await;

        assert_eq!(outcomes[0], Settled::Fulfilled(1));
        assert_eq!(outcomes[1], Settled::Rejected("panicked: boom".to_string()));
        assert_eq!(outcomes[2], Settled::Fulfilled(3));
    }

    #[tokio::test]
    async fn test_zero_batch_size_and_empty_input() {
        let outcomes = settle_in_batches(vec![7], 0, |item| async move { Ok::<_, String>(item) }).await;
        assert_eq!(outcomes, vec![Settled::Fulfilled(7)]);

        let empty: Vec<Settled<u8>> =
            settle_in_batches(Vec::<u8>::new(), 10, |item| async move { Ok::<_, String>(item) }).await;
        assert!(empty.is_empty());
    }
}
