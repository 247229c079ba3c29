use crate::{log_paste, map_event};
use core_events::{AsyncEventSource, CHANNEL_SEND_FAILURES, Event, INPUT_EVENTS_TOTAL};
use crossterm::event::{Event as CEvent, EventStream};
use std::io;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::{Notify, mpsc::Sender};
use tokio::task;
use tokio_stream::StreamExt;
use tracing::{info, trace, warn};

#[derive(Clone, Debug)]
pub struct AsyncInputShutdown {
    notify: Arc<Notify>,
}

impl AsyncInputShutdown {
    pub fn signal(&self) {
        self.notify.notify_one();
    }
}

#[derive(Clone, Debug)]
struct ShutdownListener {
    notify: Arc<Notify>,
}

impl ShutdownListener {
    fn new_pair() -> (AsyncInputShutdown, Self) {
        let notify = Arc::new(Notify::new());
        (
            AsyncInputShutdown {
                notify: notify.clone(),
            },
            ShutdownListener { notify },
        )
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// The input task packaged as an event source for the startup registry.
pub struct InputSource {
    sender: Sender<Event>,
    shutdown: AsyncInputShutdown,
    listener: ShutdownListener,
}

impl InputSource {
    pub fn new(sender: Sender<Event>) -> Self {
        let (shutdown, listener) = ShutdownListener::new_pair();
        Self {
            sender,
            shutdown,
            listener,
        }
    }

    /// Handle that stops the task once it is spawned.
    pub fn shutdown_handle(&self) -> AsyncInputShutdown {
        self.shutdown.clone()
    }
}

impl AsyncEventSource for InputSource {
    fn name(&self) -> &'static str {
        "input"
    }

    fn spawn(self: Box<Self>) -> task::JoinHandle<()> {
        let InputSource {
            sender, listener, ..
        } = *self;
        task::spawn(async move {
            AsyncEventStreamTask::new(sender, EventStream::new(), listener)
                .run()
                .await;
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitReason {
    Running,
    ShutdownSignal,
    ChannelClosed,
    StreamEnded,
    StreamError,
}

impl ExitReason {
    fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Running => "running",
            ExitReason::ShutdownSignal => "shutdown_signal",
            ExitReason::ChannelClosed => "channel_closed",
            ExitReason::StreamEnded => "stream_ended",
            ExitReason::StreamError => "stream_error",
        }
    }
}

struct AsyncEventStreamTask<S>
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    sender: Sender<Event>,
    stream: S,
    shutdown: ShutdownListener,
    exit_reason: ExitReason,
    stream_error: Option<io::ErrorKind>,
}

impl<S> AsyncEventStreamTask<S>
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    fn new(sender: Sender<Event>, stream: S, shutdown: ShutdownListener) -> Self {
        Self {
            sender,
            stream,
            shutdown,
            exit_reason: ExitReason::Running,
            stream_error: None,
        }
    }

    pub async fn run(mut self) {
        info!(target: "input.thread", "async_input_task_started");
        self.exit_reason = ExitReason::StreamEnded;
        loop {
            let maybe_result = tokio::select! {
                biased;
                _ = self.shutdown.wait() => {
                    self.exit_reason = ExitReason::ShutdownSignal;
                    break;
                }
                result = self.stream.next() => result,
            };

            let Some(result) = maybe_result else {
                break;
            };

            match result {
                Ok(raw) => {
                    if let CEvent::Paste(text) = &raw {
                        log_paste(text);
                    }
                    let Some(event) = map_event(raw) else {
                        continue;
                    };
                    trace!(target: "input.event", kind = event_kind(&event), "forward");
                    if !self.send_event(event).await {
                        break;
                    }
                }
                Err(err) => {
                    self.exit_reason = ExitReason::StreamError;
                    self.stream_error = Some(err.kind());
                    break;
                }
            }
        }

        if matches!(self.exit_reason, ExitReason::StreamError) {
            warn!(target: "input.thread", error_kind = ?self.stream_error, "async_input_task_stream_error");
        }
        info!(target: "input.thread", reason = self.exit_reason.as_str(), "async_input_task_stopped");
    }

    async fn send_event(&mut self, event: Event) -> bool {
        match self.sender.send(event).await {
            Ok(_) => {
                INPUT_EVENTS_TOTAL.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => {
                CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                if !matches!(self.exit_reason, ExitReason::ShutdownSignal) {
                    self.exit_reason = ExitReason::ChannelClosed;
                }
                false
            }
        }
    }
}

fn event_kind(event: &Event) -> &'static str {
    match event {
        Event::Key(_) => "key",
        Event::Raw(_) => "raw",
        Event::Mouse(_) => "mouse",
        Event::Paste(_) => "paste",
        Event::Resize(..) => "resize",
    }
}
