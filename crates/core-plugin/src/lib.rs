//! Extension host seam.
//!
//! The editor calls out to extensions at fixed points: a view or buffer
//! opening, a rune being inserted, before and after every bound action, and
//! when a background job finishes. Hooks carry lightweight descriptions
//! (ids, names, text) rather than editor state, so hosts never hold borrows
//! into the session.
//!
//! Error policy lives with the caller: a host that has nothing registered
//! for a hook answers `HookError::NotRegistered`, which callers swallow via
//! [`settle`]; any other error is reported on the messenger and the action
//! proceeds.
//!
//! No scripting language is embedded. `NativeHost` runs closures registered
//! from Rust, which is enough for built-in extensions and for tests.

use core_events::{AsyncEventSource, ViewId};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, trace};

/// Call site description passed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook<'a> {
    ViewOpen { view: ViewId, buffer: &'a str },
    BufferOpen { name: &'a str, path: Option<&'a Path> },
    Rune { view: ViewId, rune: char },
    PreAction { view: ViewId, action: &'a str },
    PostAction { view: ViewId, action: &'a str },
    JobFinished { view: Option<ViewId>, output: &'a str },
}

impl Hook<'_> {
    /// Registration key for this call site.
    pub fn name(&self) -> &'static str {
        match self {
            Hook::ViewOpen { .. } => "onViewOpen",
            Hook::BufferOpen { .. } => "onBufferOpen",
            Hook::Rune { .. } => "onRune",
            Hook::PreAction { .. } => "preAction",
            Hook::PostAction { .. } => "postAction",
            Hook::JobFinished { .. } => "onJobFinished",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    #[error("no handler registered for {0}")]
    NotRegistered(&'static str),
    #[error("{hook} failed: {message}")]
    Failed { hook: &'static str, message: String },
}

/// Swallow `NotRegistered`; a missing handler never cancels anything.
pub fn settle(result: Result<bool, HookError>) -> Result<bool, HookError> {
    match result {
        Err(HookError::NotRegistered(_)) => Ok(true),
        other => other,
    }
}

/// Host for editor extensions. `call` returns whether the editor should go
/// ahead; only `PreAction` answers are consulted.
pub trait ExtensionHost: Send {
    /// Stable human-readable host identifier (for logs / diagnostics).
    fn name(&self) -> &'static str;
    fn load_all(&mut self) -> anyhow::Result<()>;
    /// Async event sources contributed by loaded extensions. Ownership moves
    /// to the caller; later calls return an empty Vec.
    fn event_sources(&mut self) -> Vec<Box<dyn AsyncEventSource>>;
    fn call(&mut self, hook: &Hook<'_>) -> Result<bool, HookError>;

    fn on_view_open(&mut self, view: ViewId, buffer: &str) -> Result<bool, HookError> {
        self.call(&Hook::ViewOpen { view, buffer })
    }
    fn on_buffer_open(&mut self, name: &str, path: Option<&Path>) -> Result<bool, HookError> {
        self.call(&Hook::BufferOpen { name, path })
    }
    fn on_rune(&mut self, view: ViewId, rune: char) -> Result<bool, HookError> {
        self.call(&Hook::Rune { view, rune })
    }
    fn pre_action(&mut self, view: ViewId, action: &str) -> Result<bool, HookError> {
        self.call(&Hook::PreAction { view, action })
    }
    fn post_action(&mut self, view: ViewId, action: &str) -> Result<bool, HookError> {
        self.call(&Hook::PostAction { view, action })
    }
    fn on_job_finished(&mut self, view: Option<ViewId>, output: &str) -> Result<bool, HookError> {
        self.call(&Hook::JobFinished { view, output })
    }
}

/// Host with no extensions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExtensionHost;

impl NoopExtensionHost {
    pub fn new() -> Self {
        Self
    }
}

impl ExtensionHost for NoopExtensionHost {
    fn name(&self) -> &'static str {
        "noop-extension-host"
    }
    fn load_all(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
    fn event_sources(&mut self) -> Vec<Box<dyn AsyncEventSource>> {
        Vec::new()
    }
    fn call(&mut self, hook: &Hook<'_>) -> Result<bool, HookError> {
        Err(HookError::NotRegistered(hook.name()))
    }
}

type Handler = Box<dyn FnMut(&Hook<'_>) -> Result<bool, String> + Send>;

/// Host running Rust closures registered per hook name.
#[derive(Default)]
pub struct NativeHost {
    handlers: HashMap<&'static str, Vec<Handler>>,
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl NativeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` for hooks named `hook` (see [`Hook::name`]). Handlers run
    /// in registration order.
    pub fn register<F>(&mut self, hook: &'static str, f: F)
    where
        F: FnMut(&Hook<'_>) -> Result<bool, String> + Send + 'static,
    {
        debug!(target: "plugin", hook, "handler_registered");
        self.handlers.entry(hook).or_default().push(Box::new(f));
    }

    pub fn add_event_source<S: AsyncEventSource>(&mut self, source: S) {
        self.sources.push(Box::new(source));
    }
}

impl ExtensionHost for NativeHost {
    fn name(&self) -> &'static str {
        "native-extension-host"
    }

    fn load_all(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn event_sources(&mut self) -> Vec<Box<dyn AsyncEventSource>> {
        std::mem::take(&mut self.sources)
    }

    fn call(&mut self, hook: &Hook<'_>) -> Result<bool, HookError> {
        let name = hook.name();
        let Some(handlers) = self.handlers.get_mut(name) else {
            return Err(HookError::NotRegistered(name));
        };
        trace!(target: "plugin", hook = name, handlers = handlers.len(), "call");
        let mut proceed = true;
        for handler in handlers.iter_mut() {
            proceed &= handler(hook).map_err(|message| HookError::Failed {
                hook: name,
                message,
            })?;
        }
        Ok(proceed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn noop_host_answers_not_registered() {
        let mut host = NoopExtensionHost::new();
        host.load_all().expect("noop load should succeed");
        assert!(host.event_sources().is_empty());
        let res = host.on_rune(ViewId(1), 'a');
        assert_eq!(res, Err(HookError::NotRegistered("onRune")));
        assert_eq!(settle(res), Ok(true));
    }

    #[test]
    fn native_host_runs_handlers_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut host = NativeHost::new();
        let log = seen.clone();
        host.register("preAction", move |hook| {
            if let Hook::PreAction { action, .. } = hook {
                log.lock().unwrap().push(format!("a:{action}"));
            }
            Ok(true)
        });
        let log = seen.clone();
        host.register("preAction", move |hook| {
            if let Hook::PreAction { action, .. } = hook {
                log.lock().unwrap().push(format!("b:{action}"));
                return Ok(*action != "Quit");
            }
            Ok(true)
        });

        assert_eq!(host.pre_action(ViewId(1), "Save"), Ok(true));
        assert_eq!(host.pre_action(ViewId(1), "Quit"), Ok(false));
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["a:Save", "b:Save", "a:Quit", "b:Quit"]
        );
        assert_eq!(
            host.post_action(ViewId(1), "Save"),
            Err(HookError::NotRegistered("postAction"))
        );
    }

    #[test]
    fn handler_error_is_reported_with_hook_name() {
        let mut host = NativeHost::new();
        host.register("onJobFinished", |_| Err("boom".to_string()));
        let err = settle(host.on_job_finished(None, "done")).unwrap_err();
        assert_eq!(err.to_string(), "onJobFinished failed: boom");
    }
}
