//! Editor session: every piece of mutable editor state, owned by the loop.
//!
//! [`SessionContext`] is what actions get next to their view: the messenger,
//! clipboard, macro recorder, configuration, bindings, extension host and the
//! job and terminal spawners. Actions never reshape the tab/pane tree
//! directly; they queue a [`SessionRequest`] which the loop applies through
//! [`EditorSession::apply_requests`] after the event.

use core_config::ConfigStore;
use core_events::jobs::{JobCallback, JobOutcome, JobSpawner};
use core_events::term::TermSpawner;
use core_events::{JOB_CHANNEL_CAP, ViewId};
use core_keymap::Bindings;
use core_plugin::{ExtensionHost, HookError, NoopExtensionHost, settle};
use core_state::BufferState;
use core_text::width::string_width;
use core_text::{Buffer, write_snapshot};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::layout::{LayoutRegion, SplitDir};
use crate::macros::MacroRecorder;
use crate::messenger::{Messenger, YesNoTopic};
use crate::tab::Tab;
use crate::view::{View, ViewKind};

/// Structural changes queued by actions and commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRequest {
    /// Close a pane, asking to save a modified buffer first.
    CloseView(ViewId),
    QuitAll,
    NewTab(Option<PathBuf>),
    Split { dir: SplitDir, path: Option<PathBuf> },
    /// Replace the current pane's buffer with a file.
    Open(PathBuf),
    /// Run a program in a new tab whose pane shows its output.
    StartTerm { program: String, args: Vec<String> },
    NextTab,
    PreviousTab,
    NextSplit,
    PreviousSplit,
    OpenHelp,
    OpenRaw,
    /// Re-lay out every tab (the info bar was toggled).
    Relayout,
}

pub struct SessionContext {
    pub messenger: Messenger,
    pub clipboard: String,
    pub macros: MacroRecorder,
    pub config: ConfigStore,
    pub bindings: Bindings,
    pub host: Box<dyn ExtensionHost>,
    pub jobs: JobSpawner,
    pub terms: TermSpawner,
    /// Mouse capture change for the terminal layer, taken by the loop.
    pub mouse_capture: Option<bool>,
    requests: Vec<SessionRequest>,
    /// Panes waiting for their save to finish before they close.
    close_after_save: BTreeSet<ViewId>,
}

impl SessionContext {
    pub fn new(
        config: ConfigStore,
        bindings: Bindings,
        host: Box<dyn ExtensionHost>,
        jobs: JobSpawner,
        terms: TermSpawner,
    ) -> Self {
        Self {
            messenger: Messenger::new(),
            clipboard: String::new(),
            macros: MacroRecorder::default(),
            config,
            bindings,
            host,
            jobs,
            terms,
            mouse_capture: None,
            requests: Vec::new(),
            close_after_save: BTreeSet::new(),
        }
    }

    /// Context whose job and terminal channels lead nowhere. Used where no
    /// loop is running (listing options, tests).
    pub fn detached(config: ConfigStore) -> Self {
        let (job_tx, _) = mpsc::channel(JOB_CHANNEL_CAP);
        let (update_tx, _) = mpsc::unbounded_channel();
        let (close_tx, _) = mpsc::unbounded_channel();
        Self::new(
            config,
            Bindings::defaults(),
            Box::new(NoopExtensionHost::new()),
            JobSpawner::new(job_tx),
            TermSpawner::new(update_tx, close_tx),
        )
    }

    pub fn request(&mut self, request: SessionRequest) {
        self.requests.push(request);
    }

    pub fn take_requests(&mut self) -> Vec<SessionRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn has_requests(&self) -> bool {
        !self.requests.is_empty()
    }

    /// Whether pane `id` was waiting on its save to close, clearing the mark.
    pub fn take_close_after_save(&mut self, id: ViewId) -> bool {
        self.close_after_save.remove(&id)
    }

    pub fn closes_after_save(&self, id: ViewId) -> bool {
        self.close_after_save.contains(&id)
    }

    /// Call the extension host. A missing handler counts as "go ahead";
    /// any other error lands on the messenger and also goes ahead.
    pub fn call_hook<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut dyn ExtensionHost) -> Result<bool, HookError>,
    {
        match settle(f(self.host.as_mut())) {
            Ok(proceed) => proceed,
            Err(err) => {
                self.messenger.error(err.to_string());
                true
            }
        }
    }

    /// Start a save job for `view`. A buffer without a path opens the
    /// command prompt with `save ` typed so the user can name it.
    pub fn save(&mut self, view: &View) -> bool {
        if view.kind.is_scratch() {
            self.messenger
                .error(format!("cannot save a {} buffer", view.kind.name()));
            return false;
        }
        let Some(snapshot) = view.state.text.snapshot() else {
            self.messenger.open_command("save ");
            return false;
        };
        let target = snapshot.path.display().to_string();
        let revision = snapshot.revision;
        let spawned = self.jobs.spawn_blocking(Some(view.id), vec![target.clone()], move || {
            match write_snapshot(&snapshot) {
                Ok(mod_time) => JobOutcome::ok(
                    JobCallback::Saved {
                        revision,
                        mod_time: Some(mod_time),
                    },
                    target,
                ),
                Err(err) => JobOutcome::failed(
                    JobCallback::Saved {
                        revision,
                        mod_time: None,
                    },
                    format!("{err:#}"),
                ),
            }
        });
        match spawned {
            Ok(job) => {
                debug!(target: "runtime.jobs", job = job.0, view = %view.id, revision, "save_started");
                true
            }
            Err(err) => {
                self.messenger.error(err.to_string());
                false
            }
        }
    }
}

pub struct EditorSession {
    pub tabs: Vec<Tab>,
    pub cur_tab: usize,
    pub ctx: SessionContext,
    width: u16,
    height: u16,
    next_view: u64,
    quit: bool,
}

impl EditorSession {
    pub fn new(ctx: SessionContext, width: u16, height: u16) -> Self {
        Self {
            tabs: Vec::new(),
            cur_tab: 0,
            ctx,
            width,
            height,
            next_view: 1,
            quit: false,
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn quit(&mut self) {
        info!(target: "runtime", "quit_requested");
        self.quit = true;
    }

    pub fn has_infobar(&self) -> bool {
        self.ctx.config.global().get_bool("infobar")
    }

    /// Screen area shared by the panes of a tab.
    pub fn text_area(&self) -> LayoutRegion {
        let bar = u16::from(self.has_infobar());
        LayoutRegion::new(0, 0, self.width, self.height.saturating_sub(bar))
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.relayout();
    }

    pub fn relayout(&mut self) {
        let area = self.text_area();
        let tabbar = self.tabs.len() > 1;
        for tab in &mut self.tabs {
            tab.resize(area, tabbar);
        }
    }

    pub fn cur_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.cur_tab)
    }

    pub fn cur_tab_mut(&mut self) -> Option<&mut Tab> {
        self.tabs.get_mut(self.cur_tab)
    }

    pub fn cur_view(&self) -> Option<&View> {
        self.cur_tab().map(Tab::cur)
    }

    pub fn cur_view_mut(&mut self) -> Option<&mut View> {
        self.cur_tab_mut().map(Tab::cur_mut)
    }

    /// The current pane and the context, borrowed together for dispatch.
    pub fn parts(&mut self) -> Option<(&mut View, &mut SessionContext)> {
        let tab = self.tabs.get_mut(self.cur_tab)?;
        Some((tab.cur_mut(), &mut self.ctx))
    }

    pub fn find_view(&self, id: ViewId) -> Option<&View> {
        self.tabs.iter().flat_map(|t| t.views()).find(|v| v.id == id)
    }

    pub fn find_view_mut(&mut self, id: ViewId) -> Option<&mut View> {
        self.tabs.iter_mut().find_map(|t| t.get_mut(id))
    }

    /// A view lookup paired with the context, for routing job completions.
    pub fn view_and_ctx(&mut self, id: ViewId) -> Option<(&mut View, &mut SessionContext)> {
        let view = self.tabs.iter_mut().find_map(|t| t.get_mut(id))?;
        Some((view, &mut self.ctx))
    }

    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.tabs.iter().flat_map(|t| t.views())
    }

    pub fn views_mut(&mut self) -> impl Iterator<Item = &mut View> {
        self.tabs.iter_mut().flat_map(|t| t.views_mut())
    }

    fn next_view_id(&mut self) -> ViewId {
        let id = ViewId(self.next_view);
        self.next_view += 1;
        id
    }

    /// Attach local settings to a freshly opened buffer.
    pub fn buffer_state(&mut self, buffer: Buffer) -> BufferState {
        let filetype = buffer.detect_filetype();
        let (settings, errors) = self.ctx.config.local_settings_for(buffer.path(), filetype);
        for err in errors {
            self.ctx.messenger.error(err.to_string());
        }
        let name = buffer.name.clone();
        let path = buffer.path().map(Path::to_path_buf);
        self.ctx
            .call_hook(|host| host.on_buffer_open(&name, path.as_deref()));
        BufferState::new(buffer, settings)
    }

    /// Build a pane for `buffer` sized to the text area.
    pub fn create_view(&mut self, buffer: Buffer, kind: ViewKind) -> View {
        let state = self.buffer_state(buffer);
        let id = self.next_view_id();
        let area = self.text_area();
        let view = View::new(id, state, area.width, area.height).with_kind(kind);
        let name = view.state.text.name.clone();
        self.ctx.call_hook(|host| host.on_view_open(id, &name));
        debug!(target: "runtime", view = %id, kind = kind.name(), buffer = %name, "view_opened");
        view
    }

    /// Open `path` (or an empty buffer); failures go to the messenger.
    pub fn load_buffer(&mut self, path: Option<&Path>) -> Option<Buffer> {
        match path {
            None => Some(Buffer::from_str("", "")),
            Some(path) => match Buffer::open(path) {
                Ok(buf) => Some(buf),
                Err(err) => {
                    self.ctx.messenger.error(format!("{err:#}"));
                    None
                }
            },
        }
    }

    pub fn add_tab(&mut self, view: View) {
        self.tabs.push(Tab::new(view));
        self.cur_tab = self.tabs.len() - 1;
        self.relayout();
    }

    /// Remove a pane without any prompt. Closing the last pane quits.
    pub fn close_view(&mut self, id: ViewId) {
        let Some(t) = self.tabs.iter().position(|t| t.position(id).is_some()) else {
            return;
        };
        self.tabs[t].remove(id);
        debug!(target: "runtime", view = %id, "view_closed");
        if self.tabs[t].is_empty() {
            self.tabs.remove(t);
            if self.cur_tab >= t && self.cur_tab > 0 {
                self.cur_tab -= 1;
            }
        }
        if self.tabs.is_empty() {
            self.quit();
        } else {
            self.relayout();
        }
    }

    /// Close gate: a modified default buffer is saved first when autosave
    /// is on, otherwise the user is asked. A pane being saved closes when
    /// its save completes; a failed save leaves it open.
    pub fn request_close(&mut self, id: ViewId) {
        let Some((view, ctx)) = self.view_and_ctx(id) else {
            return;
        };
        if view.kind == ViewKind::Default && view.state.modified() {
            if view.state.settings.get_bool("autosave") && view.state.text.path().is_some() {
                self.save_then_close(id);
            } else {
                let name = display_name(&view.state.text);
                ctx.messenger.ask_yes_no(
                    format!("Save changes to {name} before closing? (y,n,esc)"),
                    YesNoTopic::SaveBeforeClose(id),
                );
            }
            return;
        }
        self.close_view(id);
    }

    fn save_then_close(&mut self, id: ViewId) {
        if let Some((view, ctx)) = self.view_and_ctx(id)
            && ctx.save(view)
        {
            ctx.close_after_save.insert(id);
            debug!(target: "runtime", view = %id, "close_after_save");
        }
    }

    /// Act on a yes/no answer.
    pub fn answer(&mut self, topic: YesNoTopic, yes: bool) {
        match topic {
            YesNoTopic::SaveBeforeClose(id) if yes => self.save_then_close(id),
            YesNoTopic::SaveBeforeClose(id) => self.close_view(id),
            YesNoTopic::QuitAll if yes => self.quit(),
            YesNoTopic::QuitAll => {}
        }
    }

    fn request_quit_all(&mut self) {
        let unsaved = self
            .views()
            .any(|v| v.kind == ViewKind::Default && v.state.modified());
        if unsaved {
            self.ctx
                .messenger
                .ask_yes_no("Quit without saving? (y,n,esc)", YesNoTopic::QuitAll);
        } else {
            self.quit();
        }
    }

    fn open_pane(&mut self, path: Option<&Path>) -> Option<View> {
        let buffer = self.load_buffer(path)?;
        Some(self.create_view(buffer, ViewKind::Default))
    }

    fn split(&mut self, dir: SplitDir, view: View) {
        let after = match dir {
            SplitDir::Vertical => self.ctx.config.global().get_bool("splitright"),
            SplitDir::Horizontal => self.ctx.config.global().get_bool("splitbottom"),
        };
        let Some(tab) = self.tabs.get_mut(self.cur_tab) else {
            self.add_tab(view);
            return;
        };
        if let Err(err) = tab.add_split(view, dir, after) {
            self.ctx.messenger.error(err.to_string());
        }
    }

    fn scratch_view(&mut self, name: &str, text: &str, kind: ViewKind) -> View {
        let mut view = self.create_view(Buffer::from_str(name, text), kind);
        view.state.text.set_modified(false);
        view
    }

    /// Apply every queued request, including ones queued while applying.
    pub fn apply_requests(&mut self) {
        loop {
            let requests = self.ctx.take_requests();
            if requests.is_empty() {
                break;
            }
            for request in requests {
                debug!(target: "runtime", ?request, "apply_request");
                self.apply(request);
            }
        }
    }

    fn apply(&mut self, request: SessionRequest) {
        match request {
            SessionRequest::CloseView(id) => self.request_close(id),
            SessionRequest::QuitAll => self.request_quit_all(),
            SessionRequest::NewTab(path) => {
                if let Some(view) = self.open_pane(path.as_deref()) {
                    self.add_tab(view);
                }
            }
            SessionRequest::Split { dir, path } => {
                if let Some(view) = self.open_pane(path.as_deref()) {
                    self.split(dir, view);
                }
            }
            SessionRequest::Open(path) => {
                let blocked = self
                    .cur_view()
                    .is_some_and(|v| v.kind == ViewKind::Default && v.state.modified());
                if blocked {
                    self.ctx
                        .messenger
                        .error("buffer has unsaved changes; save or close it first");
                    return;
                }
                let Some(buffer) = self.load_buffer(Some(&path)) else {
                    return;
                };
                let state = self.buffer_state(buffer);
                if let Some(view) = self.cur_view_mut() {
                    view.state = state;
                    view.kind = ViewKind::Default;
                    view.viewport.topline = 0;
                    view.viewport.left_col = 0;
                    view.gutter.clear_all();
                    view.relocate();
                }
            }
            SessionRequest::StartTerm { program, args } => {
                let mut view = self.scratch_view(&program, "", ViewKind::Term);
                match self.ctx.terms.spawn(view.id, &program, &args) {
                    Ok(handle) => {
                        view.term = Some(handle);
                        self.add_tab(view);
                    }
                    Err(err) => self.ctx.messenger.error(err.to_string()),
                }
            }
            SessionRequest::NextTab if !self.tabs.is_empty() => {
                self.cur_tab = (self.cur_tab + 1) % self.tabs.len();
            }
            SessionRequest::PreviousTab if !self.tabs.is_empty() => {
                self.cur_tab = (self.cur_tab + self.tabs.len() - 1) % self.tabs.len();
            }
            SessionRequest::NextTab | SessionRequest::PreviousTab => {}
            SessionRequest::NextSplit => {
                if let Some(tab) = self.cur_tab_mut() {
                    tab.next_split();
                }
            }
            SessionRequest::PreviousSplit => {
                if let Some(tab) = self.cur_tab_mut() {
                    tab.previous_split();
                }
            }
            SessionRequest::OpenHelp => {
                let text = help_text(&self.ctx.bindings);
                let view = self.scratch_view("help", &text, ViewKind::Help);
                self.split(SplitDir::Horizontal, view);
            }
            SessionRequest::OpenRaw => {
                let view = self.scratch_view(
                    "raw",
                    "Warning: showing raw event escape codes\nUse CtrlQ to exit\n\n",
                    ViewKind::Raw,
                );
                self.add_tab(view);
                if let Some(v) = self.cur_view_mut() {
                    let end = v.state.text.end();
                    v.state.goto(end);
                }
            }
            SessionRequest::Relayout => self.relayout(),
        }
    }

    /// Tab bar labels, the current tab bracketed.
    pub fn tab_labels(&self) -> Vec<String> {
        self.tabs
            .iter()
            .enumerate()
            .map(|(i, tab)| {
                let name = display_name(&tab.cur().state.text);
                if i == self.cur_tab {
                    format!("[{name}]")
                } else {
                    format!(" {name} ")
                }
            })
            .collect()
    }

    /// Tab whose label covers screen column `x`.
    pub fn tab_at_column(&self, x: u16) -> Option<usize> {
        let mut start = 0usize;
        for (i, label) in self.tab_labels().iter().enumerate() {
            let end = start + string_width(label, 1) + 1;
            if (x as usize) < end {
                return Some(i);
            }
            start = end;
        }
        None
    }
}

/// Short name for bars and prompts: the file name, or "No name".
pub fn display_name(buffer: &Buffer) -> String {
    let name = buffer
        .path()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| buffer.name.clone());
    if name.is_empty() {
        "No name".to_string()
    } else {
        name
    }
}

fn help_text(bindings: &Bindings) -> String {
    let mut out = String::from(
        "mica help\n\nCommands (Ctrl-e):\n  set OPTION VALUE    setlocal OPTION VALUE    show OPTION\n  bind KEY ACTIONS    run CMD ARGS    term [CMD ARGS]\n  save [PATH]    quit    open PATH    tab [PATH]\n  vsplit [PATH]    hsplit [PATH]    raw    help\n\nKey bindings:\n",
    );
    for (chord, actions) in bindings.iter_sorted() {
        let names: Vec<&str> = actions.iter().map(|a| a.name()).collect();
        out.push_str(&format!("  {chord:<20} {}\n", names.join(",")));
    }
    out
}
