//! Background jobs.
//!
//! A job runs on a worker (blocking pool or async task) and reports back with
//! exactly one [`JobCompletion`] on the bounded jobs channel. The completion
//! names its callback and carries the captured output; the editor loop runs
//! the callback. Jobs are never cancelled.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{CHANNEL_SEND_FAILURES, JOBS_SPAWNED, ViewId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

/// What the loop should do with a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCallback {
    /// A buffer snapshot at `revision` was written.
    Saved {
        revision: u64,
        mod_time: Option<SystemTime>,
    },
    /// The settings file was written.
    SettingsWritten,
    /// A shell command started by the user finished.
    Shell,
    /// Completion routed to the extension host under this callback name.
    Extension(String),
}

#[derive(Debug, Clone)]
pub struct JobCompletion {
    pub id: JobId,
    /// Pane that started the job; completions for closed panes are dropped.
    pub origin: Option<ViewId>,
    pub callback: JobCallback,
    pub output: String,
    pub args: Vec<String>,
    pub success: bool,
}

/// Result of a blocking job body.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub callback: JobCallback,
    pub output: String,
    pub success: bool,
}

impl JobOutcome {
    pub fn ok(callback: JobCallback, output: impl Into<String>) -> Self {
        Self {
            callback,
            output: output.into(),
            success: true,
        }
    }

    pub fn failed(callback: JobCallback, output: impl Into<String>) -> Self {
        Self {
            callback,
            output: output.into(),
            success: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("no async runtime available to run background jobs")]
    NoRuntime,
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Cloneable handle that starts jobs and wires their completions into the
/// editor loop's bounded jobs channel.
#[derive(Debug, Clone)]
pub struct JobSpawner {
    tx: mpsc::Sender<JobCompletion>,
    next: std::sync::Arc<AtomicU64>,
}

impl JobSpawner {
    pub fn new(tx: mpsc::Sender<JobCompletion>) -> Self {
        Self {
            tx,
            next: std::sync::Arc::new(AtomicU64::new(1)),
        }
    }

    fn next_id(&self) -> JobId {
        JobId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Run `work` on the blocking pool (file I/O and other blocking calls).
    pub fn spawn_blocking<F>(&self, origin: Option<ViewId>, args: Vec<String>, work: F) -> Result<JobId, JobError>
    where
        F: FnOnce() -> JobOutcome + Send + 'static,
    {
        let handle = Handle::try_current().map_err(|_| JobError::NoRuntime)?;
        let id = self.next_id();
        let tx = self.tx.clone();
        JOBS_SPAWNED.fetch_add(1, Ordering::Relaxed);
        debug!(target: "runtime.jobs", job = id.0, ?origin, "spawn_blocking");
        handle.spawn_blocking(move || {
            let outcome = work();
            let completion = JobCompletion {
                id,
                origin,
                callback: outcome.callback,
                output: outcome.output,
                args,
                success: outcome.success,
            };
            if tx.blocking_send(completion).is_err() {
                CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                warn!(target: "runtime.jobs", job = id.0, "completion dropped: loop gone");
            }
        });
        Ok(id)
    }

    /// Run an external program and capture its combined output.
    pub fn spawn_process(
        &self,
        origin: Option<ViewId>,
        callback: JobCallback,
        program: &str,
        args: Vec<String>,
    ) -> Result<JobId, JobError> {
        let handle = Handle::try_current().map_err(|_| JobError::NoRuntime)?;
        let id = self.next_id();
        let tx = self.tx.clone();
        let program = program.to_string();
        JOBS_SPAWNED.fetch_add(1, Ordering::Relaxed);
        debug!(target: "runtime.jobs", job = id.0, program = %program, "spawn_process");
        handle.spawn(async move {
            let result = tokio::process::Command::new(&program)
                .args(&args)
                .stdin(Stdio::null())
                .output()
                .await;
            let (output, success) = match result {
                Ok(out) => {
                    let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
                    text.push_str(&String::from_utf8_lossy(&out.stderr));
                    (text, out.status.success())
                }
                Err(e) => (format!("failed to start {program}: {e}"), false),
            };
            let completion = JobCompletion {
                id,
                origin,
                callback,
                output,
                args,
                success,
            };
            if tx.send(completion).await.is_err() {
                CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                warn!(target: "runtime.jobs", job = id.0, "completion dropped: loop gone");
            }
        });
        Ok(id)
    }
}
