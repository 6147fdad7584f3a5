//! Bounded-parallelism task runner.
//!
//! Runs one task per input item on a fixed pool of workers. Each worker
//! repeatedly claims the next unclaimed index from a shared atomic cursor
//! until the input is exhausted, so at most `concurrency` tasks are in
//! flight at once. Results are written back by index: output slot `i`
//! always belongs to input item `i`, whatever order tasks complete in.
//!
//! A failing (or panicking) task only fills its own slot. Sibling tasks
//! keep running and the run as a whole always completes.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use threadpool::ThreadPool;

const WORKER_THREAD_NAME: &str = "dzmeteo-worker";

/// Why a slot has no value.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskFailure<E> {
    /// The task returned an error.
    Failed(E),
    /// The task panicked; the payload message is kept when it is a string.
    Panicked(String),
}

impl<E: fmt::Display> fmt::Display for TaskFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFailure::Failed(e) => write!(f, "{}", e),
            TaskFailure::Panicked(msg) => write!(f, "task panicked: {}", msg),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for TaskFailure<E> {}

/// Runs `task` over every item with at most `concurrency` concurrent
/// workers (clamped to `1..=items.len()`), preserving input order.
///
/// # Example
/// ```
/// use dzmeteo_service::runner::run_bounded;
///
/// let out = run_bounded(vec![1, 2, 3], 2, |n: &i32| -> Result<i32, String> { Ok(n * 10) });
/// let values: Vec<i32> = out.into_iter().map(|r| r.unwrap()).collect();
/// assert_eq!(values, vec![10, 20, 30]);
/// ```
pub fn run_bounded<T, R, E, F>(
    items: Vec<T>,
    concurrency: usize,
    task: F,
) -> Vec<Result<R, TaskFailure<E>>>
where
    T: Send + Sync + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(&T) -> Result<R, E> + Send + Sync + 'static,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }

    let workers = concurrency.clamp(1, total);
    let items = Arc::new(items);
    let task = Arc::new(task);
    let cursor = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel::<(usize, Result<R, TaskFailure<E>>)>();

    let pool = ThreadPool::with_name(WORKER_THREAD_NAME.to_string(), workers);
    for _ in 0..workers {
        let items = Arc::clone(&items);
        let task = Arc::clone(&task);
        let cursor = Arc::clone(&cursor);
        let tx = tx.clone();

        pool.execute(move || {
            loop {
                // fetch_add hands out each index exactly once
                let index = cursor.fetch_add(1, Ordering::SeqCst);
                if index >= items.len() {
                    break;
                }

                let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(&items[index])));
                let slot = match outcome {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) => Err(TaskFailure::Failed(e)),
                    Err(payload) => Err(TaskFailure::Panicked(panic_message(payload.as_ref()))),
                };

                if tx.send((index, slot)).is_err() {
                    break;
                }
            }
        });
    }
    drop(tx);

    let mut slots: Vec<Option<Result<R, TaskFailure<E>>>> = (0..total).map(|_| None).collect();
    for (index, slot) in rx {
        slots[index] = Some(slot);
    }
    pool.join();

    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| Err(TaskFailure::Panicked("worker exited before reporting".to_string())))
        })
        .collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
