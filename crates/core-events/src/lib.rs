//! Core event types, channel policy and background producers.
//!
//! Everything that reaches the editor loop is a plain message defined here:
//! terminal input ([`Event`]), job completions ([`jobs::JobCompletion`]),
//! autosave ticks and embedded terminal signals ([`term`]). Producers never
//! touch editor state; they only send.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

pub mod jobs;
pub mod term;

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Input and job completions use bounded channels: a burst of keystrokes or a
// flood of finished jobs parks the producer instead of growing memory. The
// autosave ticker and the embedded terminal signals are unbounded because the
// loop must never block those producers.
// -------------------------------------------------------------------------------------------------
pub const INPUT_CHANNEL_CAP: usize = 100;
pub const JOB_CHANNEL_CAP: usize = 100;

/// Period of the autosave ticker.
pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(8);

pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static INPUT_EVENTS_TOTAL: AtomicU64 = AtomicU64::new(0);
pub static JOBS_SPAWNED: AtomicU64 = AtomicU64::new(0);
pub static JOBS_COMPLETED: AtomicU64 = AtomicU64::new(0);

/// Point-in-time copy of the process-wide counters, logged at shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    pub input_events: u64,
    pub jobs_spawned: u64,
    pub jobs_completed: u64,
    pub send_failures: u64,
}

pub fn counters() -> CounterSnapshot {
    CounterSnapshot {
        input_events: INPUT_EVENTS_TOTAL.load(Ordering::Relaxed),
        jobs_spawned: JOBS_SPAWNED.load(Ordering::Relaxed),
        jobs_completed: JOBS_COMPLETED.load(Ordering::Relaxed),
        send_failures: CHANNEL_SEND_FAILURES.load(Ordering::Relaxed),
    }
}

/// Identity of a pane. Carried by job and terminal messages so completions
/// can be routed back, or dropped when the pane is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Terminal input event consumed by the editor loop. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    /// Escape sequence the terminal layer could not decode.
    Raw(String),
    Mouse(MouseEvent),
    Paste(String),
    /// New terminal size (columns, rows).
    Resize(u16, u16),
}

impl Event {
    /// Human readable description, inserted verbatim by raw views.
    pub fn describe(&self) -> String {
        match self {
            Event::Key(k) => format!("EventKey: {k}"),
            Event::Raw(esc) => format!("EventRaw: {}", esc.escape_debug()),
            Event::Mouse(m) => format!(
                "EventMouse: {:?} {:?} at ({}, {})",
                m.buttons, m.mods, m.x, m.y
            ),
            // Paste payloads are never echoed; length only.
            Event::Paste(text) => format!("EventPaste: {} bytes", text.len()),
            Event::Resize(w, h) => format!("EventResize: {w}x{h}"),
        }
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ModMask: u8 {
        const CTRL  = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const SHIFT = 0b0000_0100;
        const META  = 0b0000_1000;
    }
}

bitflags::bitflags! {
    /// Buttons held during a mouse event. Empty means release or plain motion.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MouseButtons: u8 {
        const LEFT        = 0b0000_0001;
        const MIDDLE      = 0b0000_0010;
        const RIGHT       = 0b0000_0100;
        const WHEEL_UP    = 0b0000_1000;
        const WHEEL_DOWN  = 0b0001_0000;
        const WHEEL_LEFT  = 0b0010_0000;
        const WHEEL_RIGHT = 0b0100_0000;
    }
}

impl MouseButtons {
    pub fn is_wheel(self) -> bool {
        self.intersects(
            MouseButtons::WHEEL_UP
                | MouseButtons::WHEEL_DOWN
                | MouseButtons::WHEEL_LEFT
                | MouseButtons::WHEEL_RIGHT,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub buttons: MouseButtons,
    pub mods: ModMask,
    pub x: u16,
    pub y: u16,
}

/// Normalized logical key identities consumed by higher layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    F(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: ModMask,
}

impl KeyEvent {
    pub const fn new(code: KeyCode, mods: ModMask) -> Self {
        Self { code, mods }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            mods: ModMask::empty(),
        }
    }

    /// The character this key inserts when no binding claims it.
    pub fn inserted_rune(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if !self.mods.intersects(ModMask::CTRL | ModMask::ALT | ModMask::META) => {
                Some(c)
            }
            _ => None,
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{:?}", self.code, self.mods)
    }
}

// -------------------------------------------------------------------------------------------------
// Event Sources
// -------------------------------------------------------------------------------------------------
// Each background producer owns its sender and spawns one task. A source must
// stop when its send fails (the loop dropped the receiver) or on its own stop
// condition, and must await timers or I/O instead of busy looping.
// -------------------------------------------------------------------------------------------------

/// Trait implemented by any background producer feeding the editor loop.
pub trait AsyncEventSource: Send + 'static {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task.
    fn spawn(self: Box<Self>) -> JoinHandle<()>;
}

/// Registry of event sources spawned together at startup.
#[derive(Default)]
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    /// Register sources handed out already boxed (extension hosts).
    pub fn extend(&mut self, sources: Vec<Box<dyn AsyncEventSource>>) {
        self.sources.extend(sources);
    }

    /// Spawn all registered sources, returning their handles. Sources are
    /// drained so a second call spawns nothing.
    pub fn spawn_all(&mut self) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn());
        }
        out
    }
}

/// Emits a unit tick on an unbounded channel every `interval`, starting one
/// interval after spawn. The loop decides whether autosave is enabled.
pub struct AutosaveTicker {
    interval: Duration,
    tx: UnboundedSender<()>,
}

impl AutosaveTicker {
    pub fn new(interval: Duration, tx: UnboundedSender<()>) -> Self {
        Self { interval, tx }
    }
}

impl AsyncEventSource for AutosaveTicker {
    fn name(&self) -> &'static str {
        "autosave"
    }

    fn spawn(self: Box<Self>) -> JoinHandle<()> {
        let dur = self.interval;
        let tx = self.tx;
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + dur;
            let mut interval = tokio::time::interval_at(start, dur);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if tx.send(()).is_err() {
                            break;
                        }
                    }
                    _ = tx.closed() => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc;

    #[test]
    fn key_event_display() {
        let k = KeyEvent::new(KeyCode::Char('x'), ModMask::CTRL);
        let s = format!("{}", k);
        assert!(s.contains("Char"));
    }

    #[test]
    fn inserted_rune_ignores_control_chords() {
        assert_eq!(KeyEvent::plain(KeyCode::Char('a')).inserted_rune(), Some('a'));
        assert_eq!(
            KeyEvent::new(KeyCode::Char('A'), ModMask::SHIFT).inserted_rune(),
            Some('A')
        );
        assert_eq!(
            KeyEvent::new(KeyCode::Char('s'), ModMask::CTRL).inserted_rune(),
            None
        );
        assert_eq!(KeyEvent::plain(KeyCode::Enter).inserted_rune(), None);
    }

    #[test]
    fn paste_description_hides_payload() {
        let d = Event::Paste("secret".into()).describe();
        assert!(!d.contains("secret"));
        assert!(d.contains("6 bytes"));
    }

    #[test]
    fn wheel_buttons_classified() {
        assert!(MouseButtons::WHEEL_UP.is_wheel());
        assert!(!MouseButtons::LEFT.is_wheel());
        assert!(!MouseButtons::empty().is_wheel());
    }

    struct MockOnceSource {
        tx: mpsc::UnboundedSender<()>,
    }

    impl AsyncEventSource for MockOnceSource {
        fn name(&self) -> &'static str {
            "mock_once"
        }
        fn spawn(self: Box<Self>) -> JoinHandle<()> {
            tokio::spawn(async move {
                let _ = self.tx.send(());
            })
        }
    }

    #[tokio::test]
    async fn registry_spawns_and_emits() {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let mut reg = EventSourceRegistry::new();
        reg.register(MockOnceSource { tx: tx.clone() });
        reg.register(AutosaveTicker::new(Duration::from_millis(10), tx));
        let handles = reg.spawn_all();
        assert!(reg.spawn_all().is_empty());
        let mut got = 0;
        let start = std::time::Instant::now();
        while start.elapsed() < Duration::from_millis(500) && got < 3 {
            if let Ok(Some(())) = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await {
                got += 1;
            }
        }
        assert!(got >= 3, "expected one mock event and repeated ticks");
        drop(rx);
        for handle in handles {
            let _ = tokio::time::timeout(Duration::from_millis(100), handle).await;
        }
    }

    struct MockCloseSource {
        tx: mpsc::UnboundedSender<()>,
        flag: Arc<AtomicBool>,
    }

    impl AsyncEventSource for MockCloseSource {
        fn name(&self) -> &'static str {
            "mock_close"
        }

        fn spawn(self: Box<Self>) -> JoinHandle<()> {
            tokio::spawn(async move {
                self.tx.closed().await;
                self.flag.store(true, Ordering::SeqCst);
            })
        }
    }

    #[tokio::test]
    async fn sources_exit_on_receiver_drop() {
        let (tx, rx) = mpsc::unbounded_channel::<()>();
        let flag = Arc::new(AtomicBool::new(false));
        let mut reg = EventSourceRegistry::new();
        reg.register(MockCloseSource {
            tx: tx.clone(),
            flag: flag.clone(),
        });
        reg.register(AutosaveTicker::new(Duration::from_secs(3600), tx));
        let handles = reg.spawn_all();
        drop(rx);
        for handle in handles {
            match tokio::time::timeout(Duration::from_millis(200), handle).await {
                Ok(join_res) => join_res.expect("source task should exit cleanly"),
                Err(_) => panic!("source task did not observe channel closure"),
            }
        }
        assert!(flag.load(Ordering::SeqCst));
    }
}
