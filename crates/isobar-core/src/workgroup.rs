//! Cooperative supervision of long-running tasks.
//!
//! A [`WorkerGroup`] collects tasks that each take a stop-channel receiver.
//! [`WorkerGroup::run`] starts them concurrently; when the first task
//! returns (with or without an error) the stop channel is closed to signal
//! the others, and `run` resolves once every task has returned, yielding
//! the first error observed.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::debug;

use crate::{Error, Result};

type TaskFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type TaskFn = Box<dyn FnOnce(watch::Receiver<bool>) -> TaskFuture + Send>;

/// A group of cooperating long-running tasks sharing one stop signal.
///
/// ```rust
/// # use isobar_core::WorkerGroup;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut group = WorkerGroup::new();
/// group.add(|mut stop| async move {
///     let _ = stop.changed().await;
///     Ok(())
/// });
/// group.add(|_stop| async move { Ok(()) });
/// // the second task returns immediately, which stops the first
/// group.run().await.unwrap();
/// # }
/// ```
#[derive(Default)]
pub struct WorkerGroup {
    tasks: Vec<TaskFn>,
}

impl WorkerGroup {
    /// Create an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task.
    ///
    /// The task receives a watch receiver that yields `true` (or closes)
    /// when the group is stopping; it should unblock and return promptly.
    pub fn add<F, Fut>(&mut self, task: F)
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.tasks.push(Box::new(move |stop| Box::pin(task(stop))));
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the group has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every registered task to completion.
    ///
    /// Returns the first error produced by any task, or `Ok(())` when all
    /// tasks return cleanly.
    pub async fn run(self) -> Result<()> {
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut set = JoinSet::new();
        for task in self.tasks {
            set.spawn(task(stop_rx.clone()));
        }
        drop(stop_rx);

        debug!(tasks = set.len(), "worker group started");

        let mut first_err: Option<Error> = None;
        while let Some(joined) = set.join_next().await {
            // any task returning signals the rest to stop
            let _ = stop_tx.send(true);
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
                Err(join_err) => {
                    if first_err.is_none() {
                        first_err = Some(Error::Task {
                            message: join_err.to_string(),
                        });
                    }
                }
            }
        }

        debug!("worker group stopped");
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
