//! Parallel group scheduling.
//!
//! Groups are independent, so a bounded pool of OS threads pulls them off a
//! shared index. Output is buffered per group and flushed to the console as
//! soon as the group finishes, so two groups never interleave.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::ReturnCode;
use crate::logging::{BufferedLog, Log, Logger};
use crate::tasks::{self, Context, Task};

/// Number of workers for `task_count` groups.
fn worker_count(task_count: usize) -> usize {
    std::thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(task_count)
        .max(1)
}

/// Run tasks on a pool of worker threads and return the worst exit code.
///
/// Workers are scoped threads (`std::thread::scope`), so tasks may borrow
/// from the caller. Each task gets a [`BufferedLog`]; the progress line
/// lists the groups currently running.
pub(super) fn run_tasks_parallel(
    tasks: &[Box<dyn Task>],
    ctx: &Context,
    log: &Arc<Logger>,
) -> ReturnCode {
    let next = AtomicUsize::new(0);
    let worst = Mutex::new(ReturnCode::Success);

    std::thread::scope(|s| {
        for _ in 0..worker_count(tasks.len()) {
            s.spawn(|| {
                while let Some(task) = tasks.get(next.fetch_add(1, Ordering::Relaxed)) {
                    log.notify_task_start(task.name());

                    let buf = Arc::new(BufferedLog::new(Arc::clone(log)));
                    let task_ctx = ctx.with_log(Arc::clone(&buf) as Arc<dyn Log>);
                    let code = tasks::execute(task.as_ref(), &task_ctx);
                    buf.flush_and_complete(task.name());

                    let mut guard = worst.lock().unwrap_or_else(PoisonError::into_inner);
                    *guard = guard.worst(code);
                }
            });
        }
    });

    worst.into_inner().unwrap_or_else(PoisonError::into_inner)
}
