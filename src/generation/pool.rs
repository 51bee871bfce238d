use crate::{Error, Result};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use tokio::sync::oneshot;
use tracing::debug;

type Work = Box<dyn FnOnce() -> Result<String> + Send>;

struct Job {
    work: Work,
    reply: oneshot::Sender<Result<String>>,
}

/// A fixed set of worker threads fed from an unbounded queue.
///
/// Capacity bounds how many generations run at once; submissions beyond
/// that queue until a worker frees up and are never rejected or dropped.
pub struct WorkerPool {
    jobs: mpsc::Sender<Job>,
    capacity: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        let capacity = workers.max(1);
        let (tx, rx) = mpsc::channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));

        for _ in 0..capacity {
            let rx = Arc::clone(&rx);
            thread::spawn(move || {
                loop {
                    let job = {
                        let Ok(receiver) = rx.lock() else { return };
                        receiver.recv()
                    };
                    // The channel closes when the pool is dropped.
                    let Ok(job) = job else { return };
                    let result = (job.work)();
                    // A caller that gave up waiting is not an error here.
                    let _ = job.reply.send(result);
                }
            });
        }

        debug!("Started worker pool with {} workers", capacity);

        Self { jobs: tx, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Runs `work` on a pool thread and awaits its result.
    pub async fn run<F>(&self, work: F) -> Result<String>
    where
        F: FnOnce() -> Result<String> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.jobs
            .send(Job {
                work: Box::new(work),
                reply: tx,
            })
            .map_err(|_| Error::inference("worker pool is shut down"))?;

        rx.await
            .map_err(|_| Error::inference("worker exited before replying"))?
    }
}
