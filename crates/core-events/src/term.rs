//! Embedded terminal processes.
//!
//! A terminal pane runs a child process whose output is streamed back to the
//! editor loop as [`TermUpdate`] messages; when the process exits (or fails
//! to start) and its output is drained, a [`TermExit`] is sent on the close
//! channel. Keys typed in the pane travel the other way through
//! [`TermHandle::send`].
//!
//! The process is started on a runtime task, never on the caller's thread.
//! Bytes sent before the process is up are queued and written once its
//! stdin exists.

use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::ViewId;
use crate::jobs::JobError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermUpdate {
    pub view: ViewId,
    pub bytes: Vec<u8>,
}

/// The process behind pane `view` is gone. `error` is set when it never
/// started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermExit {
    pub view: ViewId,
    pub error: Option<String>,
}

impl TermExit {
    pub fn exited(view: ViewId) -> Self {
        Self { view, error: None }
    }
}

/// Editor-side end of a terminal process. Dropping it kills the process.
#[derive(Debug)]
pub struct TermHandle {
    pub command: String,
    input: mpsc::UnboundedSender<Vec<u8>>,
    _kill: oneshot::Sender<()>,
}

impl TermHandle {
    /// Forward bytes to the process stdin. False once the process is gone.
    pub fn send(&self, bytes: Vec<u8>) -> bool {
        self.input.send(bytes).is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct TermSpawner {
    update_tx: mpsc::UnboundedSender<TermUpdate>,
    close_tx: mpsc::UnboundedSender<TermExit>,
}

impl TermSpawner {
    pub fn new(
        update_tx: mpsc::UnboundedSender<TermUpdate>,
        close_tx: mpsc::UnboundedSender<TermExit>,
    ) -> Self {
        Self {
            update_tx,
            close_tx,
        }
    }

    /// Start `program` for pane `view`. Returns as soon as the start is
    /// scheduled; a failure to start arrives as a [`TermExit`] with an error.
    pub fn spawn(&self, view: ViewId, program: &str, args: &[String]) -> Result<TermHandle, JobError> {
        let handle = Handle::try_current().map_err(|_| JobError::NoRuntime)?;
        let (input_tx, input_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let command = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        handle.spawn(run(
            view,
            program.to_string(),
            args.to_vec(),
            input_rx,
            kill_rx,
            self.update_tx.clone(),
            self.close_tx.clone(),
        ));
        Ok(TermHandle {
            command,
            input: input_tx,
            _kill: kill_tx,
        })
    }
}

async fn run(
    view: ViewId,
    program: String,
    args: Vec<String>,
    mut input_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    kill_rx: oneshot::Receiver<()>,
    update_tx: mpsc::UnboundedSender<TermUpdate>,
    close_tx: mpsc::UnboundedSender<TermExit>,
) {
    let spawned = tokio::process::Command::new(&program)
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            warn!(target: "term", %view, program = %program, error = %err, "terminal_spawn_failed");
            let _ = close_tx.send(TermExit {
                view,
                error: Some(format!("failed to start {program}: {err}")),
            });
            return;
        }
    };
    info!(target: "term", %view, program = %program, "terminal_started");

    if let Some(mut stdin) = child.stdin.take() {
        tokio::spawn(async move {
            while let Some(bytes) = input_rx.recv().await {
                if stdin.write_all(&bytes).await.is_err() || stdin.flush().await.is_err() {
                    break;
                }
            }
        });
    }
    let mut readers = Vec::with_capacity(2);
    if let Some(out) = child.stdout.take() {
        readers.push(tokio::spawn(pump(out, view, update_tx.clone())));
    }
    if let Some(err) = child.stderr.take() {
        readers.push(tokio::spawn(pump(err, view, update_tx)));
    }

    tokio::select! {
        status = child.wait() => {
            debug!(target: "term", %view, ?status, "terminal_exited");
        }
        _ = kill_rx => {
            let _ = child.kill().await;
            debug!(target: "term", %view, "terminal_killed");
        }
    }
    for reader in readers {
        let _ = reader.await;
    }
    let _ = close_tx.send(TermExit::exited(view));
}

async fn pump<R>(mut reader: R, view: ViewId, tx: mpsc::UnboundedSender<TermUpdate>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut buf = vec![0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let update = TermUpdate {
                    view,
                    bytes: buf[..n].to_vec(),
                };
                if tx.send(update).is_err() {
                    break;
                }
            }
        }
    }
}

/// Length of the trailing bytes of `bytes` that begin a UTF-8 sequence
/// without completing it. Those bytes must wait for the next chunk.
pub fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    let start = bytes.len().saturating_sub(3);
    for i in (start..bytes.len()).rev() {
        let b = bytes[i];
        if b & 0xC0 == 0x80 {
            continue;
        }
        let need = match b {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => 1,
        };
        let have = bytes.len() - i;
        return if have < need { have } else { 0 };
    }
    0
}
