//! Job execution facility.
//!
//! Asset initialization runs as a job: work is handed to a [`JobScheduler`], which
//! returns a [`JobHandle`] that callers can block on. Two schedulers are provided:
//! [`TaskPool`], a pool of worker threads driving an `async-executor`, and
//! [`InlineScheduler`], which runs the work on the calling thread.

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use async_executor::{Executor, Task};
use parking_lot::{Condvar, Mutex};

/// A unit of work accepted by a [`JobScheduler`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Latch {
    done: Mutex<bool>,
    cond: Condvar,
}

/// A one-shot completion signal.
///
/// Cloning shares the signal. Everything the job did before [`JobHandle::complete`]
/// is visible to a thread once [`JobHandle::wait`] returns or
/// [`JobHandle::is_complete`] reports `true`.
#[derive(Clone, Default)]
pub struct JobHandle {
    latch: Arc<Latch>,
}

impl JobHandle {
    /// Create a pending handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle that is already complete.
    pub fn completed() -> Self {
        let handle = Self::new();
        handle.complete();
        handle
    }

    /// Mark the job as finished and wake every waiter. Completing twice is a no-op.
    pub fn complete(&self) {
        let mut done = self.latch.done.lock();
        *done = true;
        drop(done);
        self.latch.cond.notify_all();
    }

    /// Completes the handle when the returned guard is dropped, including on unwind.
    pub fn complete_on_drop(&self) -> CompletionGuard<'_> {
        CompletionGuard { handle: self }
    }

    pub fn is_complete(&self) -> bool {
        *self.latch.done.lock()
    }

    /// Block the calling thread until the job completes.
    pub fn wait(&self) {
        let mut done = self.latch.done.lock();
        while !*done {
            self.latch.cond.wait(&mut done);
        }
    }

    /// Whether both handles signal the same job.
    pub fn ptr_eq(&self, other: &JobHandle) -> bool {
        Arc::ptr_eq(&self.latch, &other.latch)
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("complete", &self.is_complete())
            .finish()
    }
}

/// Guard returned by [`JobHandle::complete_on_drop`].
pub struct CompletionGuard<'a> {
    handle: &'a JobHandle,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.handle.complete();
    }
}

/// Something that can run jobs.
pub trait JobScheduler: Send + Sync {
    /// Schedule `work` and return a handle that completes once it has run.
    ///
    /// A panicking job still completes its handle.
    fn schedule(&self, work: Job) -> JobHandle;
}

fn run_job(work: Job) {
    if catch_unwind(AssertUnwindSafe(work)).is_err() {
        tracing::error!("Scheduled job panicked");
    }
}

/// Runs every job immediately on the scheduling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineScheduler;

impl JobScheduler for InlineScheduler {
    fn schedule(&self, work: Job) -> JobHandle {
        let handle = JobHandle::new();
        {
            let _guard = handle.complete_on_drop();
            run_job(work);
        }
        handle
    }
}

/// A thread pool for executing jobs and async tasks.
///
/// # Example
///
/// ```ignore
/// use vellum_core::jobs::{JobScheduler, TaskPool};
///
/// let pool = TaskPool::new(4);
/// let job = pool.schedule(Box::new(|| compile_textures()));
/// job.wait();
/// ```
pub struct TaskPool {
    executor: Arc<Executor<'static>>,
    threads: Vec<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl TaskPool {
    /// Create a new task pool with the specified number of threads.
    ///
    /// # Panics
    ///
    /// Panics if num_threads is 0.
    pub fn new(num_threads: usize) -> Self {
        assert!(num_threads > 0, "TaskPool must have at least one thread");

        let executor = Arc::new(Executor::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut threads = Vec::with_capacity(num_threads);

        for i in 0..num_threads {
            let exec = executor.clone();
            let shutdown_flag = shutdown.clone();

            let handle = thread::Builder::new()
                .name(format!("vellum-job-{}", i))
                .spawn(move || {
                    while !shutdown_flag.load(Ordering::Relaxed) {
                        if !exec.try_tick() {
                            thread::sleep(std::time::Duration::from_millis(1));
                        }
                    }
                })
                .expect("Failed to spawn task pool thread");

            threads.push(handle);
        }

        tracing::debug!("TaskPool created with {} threads", num_threads);

        Self {
            executor,
            threads,
            shutdown,
        }
    }

    /// Create a task pool with a default number of threads.
    ///
    /// Uses max(1, num_cpus - 1) to leave one core free for the calling thread.
    pub fn default_threads() -> Self {
        let num_threads = (num_cpus::get().saturating_sub(1)).max(1);
        Self::new(num_threads)
    }

    /// Spawn an async task on the pool.
    pub fn spawn<T>(&self, future: impl Future<Output = T> + Send + 'static) -> Task<T>
    where
        T: Send + 'static,
    {
        self.executor.spawn(future)
    }

    /// Get the number of threads in this pool.
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Shutdown the task pool and wait for all threads to finish.
    ///
    /// Jobs that have not started yet are dropped; their handles never complete.
    pub fn shutdown(mut self) {
        tracing::debug!("Shutting down TaskPool with {} threads", self.threads.len());

        self.shutdown.store(true, Ordering::Relaxed);

        let threads = std::mem::take(&mut self.threads);
        for handle in threads {
            if let Err(e) = handle.join() {
                tracing::error!("Task pool thread panicked: {:?}", e);
            }
        }

        tracing::debug!("TaskPool shutdown complete");
    }
}

impl JobScheduler for TaskPool {
    fn schedule(&self, work: Job) -> JobHandle {
        let handle = JobHandle::new();
        let completion = handle.clone();
        self.spawn(async move {
            let _guard = completion.complete_on_drop();
            run_job(work);
        })
        .detach();
        handle
    }
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::default_threads()
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_job_handle_wait_after_complete() {
        let handle = JobHandle::new();
        assert!(!handle.is_complete());
        handle.complete();
        handle.wait();
        assert!(handle.is_complete());
        assert!(JobHandle::completed().is_complete());
    }

    #[test]
    fn test_job_handle_wakes_other_thread() {
        let handle = JobHandle::new();
        let waiter = {
            let handle = handle.clone();
            thread::spawn(move || {
                handle.wait();
                true
            })
        };
        thread::sleep(std::time::Duration::from_millis(10));
        handle.complete();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_inline_scheduler_runs_immediately() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let handle = InlineScheduler.schedule(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(handle.is_complete());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_inline_scheduler_completes_on_panic() {
        let handle = InlineScheduler.schedule(Box::new(|| panic!("job failure")));
        assert!(handle.is_complete());
    }

    #[test]
    fn test_task_pool_runs_jobs() {
        let pool = TaskPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let c = counter.clone();
                pool.schedule(Box::new(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                }))
            })
            .collect();

        for handle in &handles {
            handle.wait();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        pool.shutdown();
    }

    #[test]
    fn test_spawn_and_await() {
        let pool = TaskPool::new(1);
        let task = pool.spawn(async { 42 });
        assert_eq!(futures_lite::future::block_on(task), 42);
    }

    #[test]
    #[should_panic(expected = "TaskPool must have at least one thread")]
    fn test_zero_threads_panics() {
        TaskPool::new(0);
    }
}
