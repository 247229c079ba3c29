//! mica entrypoint: CLI, logging, terminal setup and the event loop.

mod cli;
mod runtime;

use anyhow::{Result, bail};
use clap::Parser;
use core_config::{BINDINGS_FILE, ConfigStore};
use core_events::jobs::JobSpawner;
use core_events::term::TermSpawner;
use core_events::{
    AUTOSAVE_INTERVAL, AutosaveTicker, EventSourceRegistry, INPUT_CHANNEL_CAP, JOB_CHANNEL_CAP,
};
use core_input::{AsyncInputShutdown, InputSource};
use core_keymap::Bindings;
use core_model::{EditorSession, SessionContext, ViewKind};
use core_plugin::{ExtensionHost, NativeHost};
use core_render::{DefaultStyles, TerminalDisplay};
use core_terminal::{CrosstermBackend, TerminalBackend};
use core_text::{Buffer, Loc};
use std::io::{BufWriter, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

use cli::{Args, Inputs};
use runtime::{Channels, Scheduler, ShutdownReason};

const LOG_FILE: &str = "mica.log";

/// Everything resolved before the terminal is touched.
struct Startup {
    config_dir: PathBuf,
    inputs: Inputs,
    stdin_text: Option<String>,
    /// Problems found while loading; shown on the info bar once running.
    notes: Vec<String>,
    _log_guard: Option<WorkerGuard>,
}

impl Startup {
    fn prepare(args: &Args) -> Result<Self> {
        let config_dir = core_config::config_dir(args.config_dir.as_deref());
        if let Err(err) = std::fs::create_dir_all(&config_dir) {
            eprintln!("cannot create {}: {err}", config_dir.display());
        }
        let log_guard = configure_logging(&config_dir);
        install_panic_hook();

        let inputs = args.inputs()?;
        let stdin_text = if inputs.paths.is_empty() && !std::io::stdin().is_terminal() {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Some(text)
        } else {
            None
        };
        info!(
            target: "runtime.startup",
            config_dir = %config_dir.display(),
            files = inputs.paths.len(),
            stdin = stdin_text.is_some(),
            "startup"
        );
        Ok(Self {
            config_dir,
            inputs,
            stdin_text,
            notes: Vec::new(),
            _log_guard: log_guard,
        })
    }

    fn load_config(&mut self, args: &Args) -> Result<ConfigStore> {
        let mut config =
            ConfigStore::load_from(Some(core_config::discover(args.config_dir.as_deref())));
        if let Some(err) = config.take_load_error() {
            self.notes.push(err);
        }
        if config.path().is_some_and(|p| !p.exists())
            && let Err(err) = config.write_settings()
        {
            warn!(target: "config", %err, "settings_write_failed");
        }
        for (name, value) in args.overrides()? {
            if let Err(err) = config.set_global_option(name, value) {
                self.notes.push(err.to_string());
            }
        }
        Ok(config)
    }

    fn load_bindings(&mut self) -> Bindings {
        let (bindings, errors) = Bindings::load(&self.config_dir.join(BINDINGS_FILE));
        for err in errors {
            warn!(target: "config", %err, "binding_rejected");
            self.notes.push(err.to_string());
        }
        bindings
    }
}

fn configure_logging(dir: &Path) -> Option<WorkerGuard> {
    let log_path = dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }
    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .with_ansi(false)
        .try_init()
        .ok()
        .map(|_| guard)
}

/// Restore the terminal before anything is printed, then exit with status 1
/// so a panic on a worker task also ends the editor.
fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            core_terminal::restore();
            error!(target: "runtime.panic", %info, "panic");
            eprintln!("mica encountered an error: {info}");
            eprintln!("{}", std::backtrace::Backtrace::force_capture());
            std::process::exit(1);
        }));
    });
}

/// Open one tab per file (or one for stdin / an empty buffer).
fn open_buffers(session: &mut EditorSession, inputs: &Inputs, stdin_text: Option<String>) {
    if inputs.paths.is_empty() {
        let text = stdin_text.unwrap_or_default();
        let mut buffer = Buffer::from_str("", &text);
        buffer.set_modified(false);
        let view = session.create_view(buffer, ViewKind::Default);
        session.add_tab(view);
    }
    for path in &inputs.paths {
        if let Some(buffer) = session.load_buffer(Some(path)) {
            let view = session.create_view(buffer, ViewKind::Default);
            session.add_tab(view);
        }
    }
    if session.tabs.len() > 1 {
        session.cur_tab = 0;
    }
    let start = inputs.start.unwrap_or(Loc::new(0, 0));
    for view in session.views_mut() {
        view.state.goto(start);
        view.center();
    }
}

async fn stop_sources(
    reason: ShutdownReason,
    input: AsyncInputShutdown,
    mut handles: Vec<JoinHandle<()>>,
) {
    info!(target: "runtime.shutdown", reason = reason.as_str(), stage = "begin", "shutdown_stage");
    input.signal();
    while let Some(handle) = handles.pop() {
        handle.abort();
        match tokio::time::timeout(Duration::from_millis(200), handle).await {
            Ok(Ok(())) => trace!(target: "runtime.shutdown", "event_source_task_stopped"),
            Ok(Err(err)) if err.is_cancelled() => {
                trace!(target: "runtime.shutdown", "event_source_task_cancelled")
            }
            Ok(Err(err)) => error!(target: "runtime.shutdown", ?err, "event_source_task_error"),
            Err(_) => warn!(target: "runtime.shutdown", "event_source_task_timeout"),
        }
    }
    let totals = core_events::counters();
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = "complete",
        input_events = totals.input_events,
        jobs_spawned = totals.jobs_spawned,
        jobs_completed = totals.jobs_completed,
        send_failures = totals.send_failures,
        "shutdown_stage"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.options {
        print!("{}", cli::options_listing());
        return Ok(());
    }
    let mut startup = Startup::prepare(&args)?;
    let config = startup.load_config(&args)?;
    let bindings = startup.load_bindings();

    let mut host = NativeHost::new();
    if let Err(err) = host.load_all() {
        startup.notes.push(format!("{err:#}"));
    }
    let mut registry = EventSourceRegistry::new();
    registry.extend(host.event_sources());

    let (input_tx, input) = mpsc::channel(INPUT_CHANNEL_CAP);
    let (job_tx, jobs) = mpsc::channel(JOB_CHANNEL_CAP);
    let (autosave_tx, autosave) = mpsc::unbounded_channel();
    let (update_tx, term_update) = mpsc::unbounded_channel();
    let (close_tx, term_close) = mpsc::unbounded_channel();
    let ctx = SessionContext::new(
        config,
        bindings,
        Box::new(host),
        JobSpawner::new(job_tx),
        TermSpawner::new(update_tx, close_tx),
    );

    let mut backend = CrosstermBackend::new();
    let (width, height) = backend.size()?;
    let mut session = EditorSession::new(ctx, width, height);
    open_buffers(&mut session, &startup.inputs, startup.stdin_text.take());
    if session.tabs.is_empty() {
        bail!("no buffer could be opened");
    }
    for note in startup.notes.drain(..) {
        session.ctx.messenger.error(note);
    }

    let global = session.ctx.config.global();
    let (mouse, termtitle) = (global.get_bool("mouse"), global.get_bool("termtitle"));
    backend.enter()?;
    backend.set_mouse_capture(mouse)?;
    if termtitle && let Some(view) = session.cur_view() {
        backend.set_title(&format!("mica {}", core_model::display_name(&view.state.text)))?;
    }

    let input_source = InputSource::new(input_tx);
    let input_shutdown = input_source.shutdown_handle();
    registry.register(input_source);
    registry.register(AutosaveTicker::new(AUTOSAVE_INTERVAL, autosave_tx));
    let handles = registry.spawn_all();

    let display = TerminalDisplay::new(BufWriter::new(std::io::stdout()), DefaultStyles::new());
    let channels = Channels {
        input,
        jobs,
        autosave,
        term_update,
        term_close,
    };
    let mut scheduler = Scheduler::new(session, display, backend, channels);
    let outcome = scheduler.run().await;
    let reason = outcome.as_ref().copied().unwrap_or(ShutdownReason::Quit);
    stop_sources(reason, input_shutdown, handles).await;
    // Dropping the scheduler drops the backend, which leaves the terminal.
    drop(scheduler);
    outcome.map(|_| ())
}
