use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::shared::engine_error::EngineError;

type JobResult<T> = Result<T, EngineError>;

/// Runs CPU-bound engine work (distance matrices, large matches) on a
/// dedicated worker thread so the calling thread stays responsive.
///
/// No cancellation: a spawned job always runs to completion.
pub struct BackgroundRunner {
    thread_name: String,
}

impl BackgroundRunner {
    pub fn new(thread_name: impl Into<String>) -> Self {
        Self {
            thread_name: thread_name.into(),
        }
    }

    pub fn spawn<T, F>(&self, job: F) -> Result<JobHandle<T>, EngineError>
    where
        T: Send + 'static,
        F: FnOnce() -> JobResult<T> + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded::<JobResult<T>>(1);
        let thread = std::thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || {
                // The receiver may already be gone; nothing to report then.
                let _ = tx.send(job());
            })
            .map_err(|e| EngineError::Background(format!("failed to spawn worker: {e}")))?;

        Ok(JobHandle {
            rx,
            thread: Some(thread),
        })
    }
}

impl Default for BackgroundRunner {
    fn default() -> Self {
        Self::new("facematch-worker")
    }
}

/// Result slot of a spawned job.
pub struct JobHandle<T> {
    rx: Receiver<JobResult<T>>,
    thread: Option<JoinHandle<()>>,
}

impl<T> JobHandle<T> {
    /// Blocks until the job finishes.
    pub fn wait(mut self) -> JobResult<T> {
        let result = self.rx.recv().unwrap_or_else(|_| Err(worker_lost()));
        self.join();
        result
    }

    /// Waits up to `timeout`; `None` means the job is still running.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<JobResult<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.join();
                Some(Err(worker_lost()))
            }
        }
    }

    /// Non-blocking poll; `None` means the job is still running.
    pub fn try_result(&mut self) -> Option<JobResult<T>> {
        match self.rx.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.join();
                Some(Err(worker_lost()))
            }
        }
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Background worker panicked");
            }
        }
    }
}

fn worker_lost() -> EngineError {
    EngineError::Background("worker exited without a result".to_string())
}
