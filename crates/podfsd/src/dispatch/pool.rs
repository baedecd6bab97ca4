//! Bounded worker pool feeding dispatch units.
//!
//! Workers are scoped threads that pull requests from a bounded channel. The
//! transport loop blocks in [`WorkerPool::submit`] only when every queue slot
//! is taken; a slow request ties up one worker and never the others.

use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, Scope, ScopedJoinHandle};

use thiserror::Error;
use tracing::debug;

use super::DISPATCH_TARGET;
use super::handler::Dispatcher;
use super::request::Request;

/// Errors raised by the worker pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// A worker thread could not be started.
    #[error("failed to spawn dispatch worker {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: io::Error,
    },
    /// A worker thread terminated by panicking.
    #[error("dispatch worker panicked")]
    WorkerPanicked,
}

/// Handle to the running workers.
pub struct WorkerPool<'scope> {
    sender: SyncSender<Request>,
    workers: Vec<ScopedJoinHandle<'scope, ()>>,
}

impl<'scope> WorkerPool<'scope> {
    /// Starts `workers` threads inside `scope`, with `queue_depth` waiting slots.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Spawn`] if a thread cannot be created. Workers that
    /// did start exit once the partially built pool is dropped.
    pub fn start<'env, W>(
        scope: &'scope Scope<'scope, 'env>,
        dispatcher: &'env Dispatcher<'env, W>,
        workers: usize,
        queue_depth: usize,
    ) -> Result<Self, PoolError>
    where
        W: Write + Send,
    {
        let (sender, receiver) = mpsc::sync_channel::<Request>(queue_depth);
        let receiver = Arc::new(Mutex::new(receiver));
        let mut handles = Vec::with_capacity(workers);

        for index in 0..workers {
            let receiver = Arc::clone(&receiver);
            let handle = thread::Builder::new()
                .name(format!("podfsd-worker-{index}"))
                .spawn_scoped(scope, move || worker_loop(index, &receiver, dispatcher))
                .map_err(|source| PoolError::Spawn { index, source })?;
            handles.push(handle);
        }

        Ok(Self {
            sender,
            workers: handles,
        })
    }

    /// Queues a request, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Hands the request back when no worker remains to receive it.
    pub fn submit(&self, request: Request) -> Result<(), Request> {
        self.sender.send(request).map_err(|error| error.0)
    }

    /// Closes the queue, lets workers drain it, and joins them.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::WorkerPanicked`] if any worker panicked.
    pub fn shutdown(self) -> Result<(), PoolError> {
        let Self { sender, workers } = self;
        drop(sender);
        let mut panicked = false;
        for handle in workers {
            panicked |= handle.join().is_err();
        }
        if panicked {
            Err(PoolError::WorkerPanicked)
        } else {
            Ok(())
        }
    }
}

fn worker_loop<W: Write>(
    index: usize,
    receiver: &Mutex<Receiver<Request>>,
    dispatcher: &Dispatcher<'_, W>,
) {
    loop {
        // The guard must drop before `run`, so take it in its own statement.
        let next = receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();
        match next {
            Ok(request) => dispatcher.run(request),
            Err(_) => break,
        }
    }
    debug!(target: DISPATCH_TARGET, worker = index, "dispatch worker stopped");
}
