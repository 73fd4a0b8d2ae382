//! Bounded parallel execution of per-block units of work.
//!
//! Every blob becomes one unit. Before a unit is handed to the [`Executor`]
//! the submitting thread takes a [`Permit`] from the shared [`Permits`] pool
//! and blocks while the pool is exhausted. The permit travels with the unit
//! and is returned when the unit is done, whether it succeeded, failed or
//! panicked. This keeps the number of undecoded blocks held in memory bounded
//! no matter how fast the input can be read.
//!
//! ```text
//!  reader thread            Permits (n)             worker threads
//!  ─────────────   acquire  ───────────   execute   ──────────────
//!  next blob ──────────────▶ n -= 1 ───────────────▶ decode block
//!      ▲                                                  │
//!      └──────────── blocks while n == 0 ◀── n += 1 ◀─────┘ (Drop)
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::{debug_span, error, warn};

use crate::error::{Error, Result};

struct PermitState {
    available: usize,
    closed: bool,
}

/// Counting admission primitive shared by all units read from one input.
pub struct Permits {
    capacity: usize,
    state: Mutex<PermitState>,
    released: Condvar,
}

impl fmt::Debug for Permits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Permits")
            .field("capacity", &self.capacity)
            .field("available", &state.available)
            .field("closed", &state.closed)
            .finish()
    }
}

impl Permits {
    /// Creates a pool of `capacity` permits. A capacity of `0` is raised to `1`.
    pub fn new(capacity: usize) -> Arc<Self> {
        let capacity = capacity.max(1);
        Arc::new(Self {
            capacity,
            state: Mutex::new(PermitState {
                available: capacity,
                closed: false,
            }),
            released: Condvar::new(),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.state.lock().available
    }

    #[inline]
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }

    /// Takes a permit, blocking while none is available.
    ///
    /// Fails with [`Error::PipelineClosed`] once the pool is closed, including
    /// for callers that are already waiting.
    pub fn acquire(self: &Arc<Self>) -> Result<Permit> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(Error::PipelineClosed);
            }
            if state.available > 0 {
                state.available -= 1;
                return Ok(Permit {
                    permits: Arc::clone(self),
                });
            }
            self.released.wait(&mut state);
        }
    }

    /// Takes a permit if one is available right now.
    pub fn try_acquire(self: &Arc<Self>) -> Result<Option<Permit>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::PipelineClosed);
        }
        if state.available == 0 {
            return Ok(None);
        }
        state.available -= 1;
        Ok(Some(Permit {
            permits: Arc::clone(self),
        }))
    }

    /// Rejects all further acquisitions. Permits already handed out stay
    /// valid and are still returned on drop.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.released.notify_all();
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn release(&self) {
        let mut state = self.state.lock();
        state.available += 1;
        debug_assert!(state.available <= self.capacity);
        drop(state);
        self.released.notify_one();
    }
}

/// One unit of the concurrency budget, returned to its pool on drop.
#[must_use = "the permit is released as soon as it is dropped"]
pub struct Permit {
    permits: Arc<Permits>,
}

impl fmt::Debug for Permit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permit").finish_non_exhaustive()
    }
}

impl Drop for Permit {
    #[inline]
    fn drop(&mut self) {
        self.permits.release();
    }
}

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Somewhere to run units of work.
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);
}

impl Executor for rayon::ThreadPool {
    #[inline]
    fn execute(&self, job: Job) {
        self.spawn(job)
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    #[inline]
    fn execute(&self, job: Job) {
        (**self).execute(job)
    }
}

/// Result of one submitted unit.
#[must_use = "a unit's failure is only observable through its handle"]
pub struct TaskHandle<T> {
    seq: u64,
    rx: mpsc::Receiver<Result<T>>,
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle").field("seq", &self.seq).finish()
    }
}

impl<T> TaskHandle<T> {
    /// Submission sequence number, unique per pipeline.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Blocks until the unit finished.
    pub fn join(self) -> Result<T> {
        self.rx.recv().map_err(|_| Error::TaskLost)?
    }

    /// Returns the result if the unit already finished.
    ///
    /// Yields `Some` at most once per unit; polling again afterwards reports
    /// [`Error::TaskLost`].
    pub fn try_join(&mut self) -> Option<Result<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(Error::TaskLost)),
        }
    }
}

/// Admission controlled dispatch of units to an [`Executor`].
pub struct Pipeline<E = rayon::ThreadPool> {
    executor: E,
    permits: Arc<Permits>,
    next_seq: AtomicU64,
}

impl<E> fmt::Debug for Pipeline<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("permits", &self.permits)
            .field("submitted", &self.next_seq.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Pipeline<rayon::ThreadPool> {
    /// A pipeline backed by its own rayon pool of `threads` workers, admitting
    /// at most `max_in_flight` units at a time.
    pub fn new(threads: usize, max_in_flight: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("osm-pbf-worker-{i}"))
            .build()?;
        Ok(Self::with_executor(pool, Permits::new(max_in_flight)))
    }
}

impl<E: Executor> Pipeline<E> {
    pub fn with_executor(executor: E, permits: Arc<Permits>) -> Self {
        Self {
            executor,
            permits,
            next_seq: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn permits(&self) -> &Arc<Permits> {
        &self.permits
    }

    /// Waits for a permit and hands `work` to the executor.
    ///
    /// This is the only place the submitting thread suspends. Panics inside
    /// `work` are caught and reported as [`Error::WorkerPanicked`].
    pub fn submit<T, F>(&self, work: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self.permits.acquire()?;
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::sync_channel(1);
        self.executor.execute(Box::new(move || {
            let _span = debug_span!("block", seq).entered();
            let result = match panic::catch_unwind(AssertUnwindSafe(work)) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => {
                    warn!(error = %e, "unit of work failed");
                    Err(e)
                }
                Err(payload) => {
                    let msg = panic_message(payload.as_ref());
                    error!(panic = %msg, "unit of work panicked");
                    Err(Error::WorkerPanicked(msg))
                }
            };
            drop(permit);
            // the handle may already be gone
            let _ = tx.send(result);
        }));
        Ok(TaskHandle { seq, rx })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn permits_are_counted() {
        let permits = Permits::new(2);
        let a = permits.acquire().unwrap();
        let _b = permits.try_acquire().unwrap().expect("second permit");
        assert!(permits.try_acquire().unwrap().is_none());
        assert_eq!(permits.in_use(), 2);
        drop(a);
        assert_eq!(permits.available(), 1);
    }

    #[test]
    fn zero_capacity_still_admits_one() {
        let permits = Permits::new(0);
        assert_eq!(permits.capacity(), 1);
        assert!(permits.try_acquire().unwrap().is_some());
    }

    #[test]
    fn close_wakes_blocked_acquirers() {
        let permits = Permits::new(1);
        let held = permits.acquire().unwrap();
        let waiter = {
            let permits = Arc::clone(&permits);
            thread::spawn(move || permits.acquire().map(|_| ()))
        };
        thread::sleep(Duration::from_millis(50));
        permits.close();
        assert!(matches!(waiter.join().unwrap(), Err(Error::PipelineClosed)));
        drop(held);
        assert_eq!(permits.available(), 1);
        assert!(matches!(permits.try_acquire(), Err(Error::PipelineClosed)));
    }

    #[test]
    fn failures_and_panics_release_their_permit() {
        let pipeline = Pipeline::new(2, 1).unwrap();
        let failed = pipeline
            .submit(|| -> Result<()> { Err(Error::MalformedBlock("test")) })
            .unwrap();
        assert!(matches!(failed.join(), Err(Error::MalformedBlock("test"))));

        let panicked = pipeline
            .submit(|| -> Result<()> { panic!("boom") })
            .unwrap();
        match panicked.join() {
            Err(Error::WorkerPanicked(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(pipeline.permits().available(), 1);

        let ok = pipeline.submit(|| Ok(42)).unwrap();
        assert_eq!(ok.join().unwrap(), 42);
    }

    #[test]
    fn sequence_numbers_follow_submission() {
        let pipeline = Pipeline::new(1, 4).unwrap();
        let first = pipeline.submit(|| Ok(())).unwrap();
        let second = pipeline.submit(|| Ok(())).unwrap();
        assert_eq!((first.seq(), second.seq()), (0, 1));
        first.join().unwrap();
        second.join().unwrap();
    }
}
