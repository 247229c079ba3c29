//! Event scheduler.
//!
//! One task owns the [`EditorSession`]. Every iteration redraws, then waits
//! on whichever producer is ready first: job completions, autosave ticks,
//! embedded terminal output or exit, or terminal input. An input event is
//! followed by a drain of every input event already queued, so a burst of
//! keys costs one redraw.

use anyhow::Result;
use core_actions::{handle_event, handle_job_completion, handle_prompt_event};
use core_events::jobs::JobCompletion;
use core_events::term::{TermExit, TermUpdate};
use core_events::{Event, MouseButtons, MouseEvent};
use core_model::EditorSession;
use core_render::Display;
use core_terminal::TerminalBackend;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Receiving ends of every producer feeding the loop.
pub struct Channels {
    pub input: mpsc::Receiver<Event>,
    pub jobs: mpsc::Receiver<JobCompletion>,
    pub autosave: mpsc::UnboundedReceiver<()>,
    pub term_update: mpsc::UnboundedReceiver<TermUpdate>,
    pub term_close: mpsc::UnboundedReceiver<TermExit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Quit,
    InputClosed,
}

impl ShutdownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::Quit => "quit",
            ShutdownReason::InputClosed => "input_closed",
        }
    }
}

/// Counters kept for logs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopStats {
    pub redraws: u64,
    pub events: u64,
    pub jobs: u64,
}

pub struct Scheduler<D: Display, T: TerminalBackend> {
    session: EditorSession,
    display: D,
    terminal: T,
    channels: Channels,
    stats: LoopStats,
}

impl<D: Display, T: TerminalBackend> Scheduler<D, T> {
    pub fn new(session: EditorSession, display: D, terminal: T, channels: Channels) -> Self {
        Self {
            session,
            display,
            terminal,
            channels,
            stats: LoopStats::default(),
        }
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditorSession {
        &mut self.session
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub async fn run(&mut self) -> Result<ShutdownReason> {
        let span = tracing::debug_span!(target: "runtime", "event_loop");
        let _enter = span.enter();
        loop {
            if let Some(reason) = self.step().await? {
                debug!(
                    target: "runtime",
                    reason = reason.as_str(),
                    redraws = self.stats.redraws,
                    events = self.stats.events,
                    jobs = self.stats.jobs,
                    "loop_exit"
                );
                return Ok(reason);
            }
        }
    }

    /// One iteration: redraw, then handle whatever arrives first. Returns
    /// the shutdown reason once the loop should stop.
    pub async fn step(&mut self) -> Result<Option<ShutdownReason>> {
        if self.session.should_quit() {
            return Ok(Some(ShutdownReason::Quit));
        }
        self.display.redraw(&self.session)?;
        self.stats.redraws += 1;

        tokio::select! {
            biased;
            Some(done) = self.channels.jobs.recv() => self.on_job(done),
            Some(()) = self.channels.autosave.recv() => self.on_autosave(),
            Some(update) = self.channels.term_update.recv() => self.on_term_update(update),
            Some(exit) = self.channels.term_close.recv() => self.on_term_close(exit),
            event = self.channels.input.recv() => match event {
                Some(event) => self.drain(event),
                None => return Ok(Some(ShutdownReason::InputClosed)),
            },
        }
        self.settle();

        Ok(self.session.should_quit().then_some(ShutdownReason::Quit))
    }

    fn drain(&mut self, first: Event) {
        let mut next = Some(first);
        let mut count = 0u64;
        while let Some(event) = next {
            self.route(&event);
            self.settle();
            count += 1;
            if self.session.should_quit() {
                break;
            }
            next = self.channels.input.try_recv().ok();
        }
        self.stats.events += count;
        trace!(target: "runtime", events = count, "drained");
    }

    /// Apply queued session requests and forward a mouse capture change.
    fn settle(&mut self) {
        self.session.apply_requests();
        if let Some(on) = self.session.ctx.mouse_capture.take()
            && let Err(err) = self.terminal.set_mouse_capture(on)
        {
            warn!(target: "runtime", %err, on, "mouse_capture_failed");
        }
    }

    fn route(&mut self, event: &Event) {
        match event {
            Event::Resize(w, h) => {
                debug!(target: "runtime", width = w, height = h, "resize");
                self.session.resize(*w, *h);
                self.display.invalidate();
            }
            Event::Mouse(mouse) if self.route_mouse(mouse) => return,
            _ => {}
        }
        if handle_prompt_event(&mut self.session, event) {
            return;
        }
        if let Some((view, ctx)) = self.session.parts() {
            handle_event(view, event, ctx);
        }
    }

    /// Screen-level mouse handling. Returns true when the event was used up
    /// here and must not reach the current pane.
    fn route_mouse(&mut self, mouse: &MouseEvent) -> bool {
        let session = &mut self.session;
        let (_, height) = session.size();
        if mouse.buttons == MouseButtons::LEFT {
            if session.has_infobar()
                && mouse.y + 1 == height
                && let Some(text) = session.ctx.messenger.message().map(|m| m.text.clone())
            {
                debug!(target: "runtime", len = text.len(), "message_copied");
                session.ctx.clipboard = text;
                return true;
            }
            if session.tabs.len() > 1 && mouse.y == 0 {
                if let Some(i) = session.tab_at_column(mouse.x) {
                    session.cur_tab = i;
                }
                return true;
            }
            if session.cur_view().is_some_and(|v| v.mouse_released)
                && let Some(tab) = session.cur_tab_mut()
                && let Some(i) = tab.view_at(mouse.x, mouse.y)
            {
                tab.set_cur(i);
            }
        } else if mouse
            .buttons
            .intersects(MouseButtons::WHEEL_UP | MouseButtons::WHEEL_DOWN)
        {
            let cur = session.cur_tab;
            if let Some(tab) = session.tabs.get_mut(cur)
                && let Some(i) = tab.view_at(mouse.x, mouse.y)
            {
                let view = &mut tab.views_mut()[i];
                handle_event(view, &Event::Mouse(*mouse), &mut session.ctx);
                return true;
            }
        }
        false
    }

    fn on_job(&mut self, done: JobCompletion) {
        self.stats.jobs += 1;
        handle_job_completion(&mut self.session, done);
    }

    fn on_autosave(&mut self) {
        if !self.session.ctx.config.global().get_bool("autosave") {
            return;
        }
        if let Some((view, ctx)) = self.session.parts()
            && view.state.text.path().is_some()
        {
            trace!(target: "runtime", view = %view.id, "autosave");
            ctx.save(view);
        }
    }

    fn on_term_update(&mut self, update: TermUpdate) {
        match self.session.find_view_mut(update.view) {
            Some(view) => {
                view.apply_term_output(&update.bytes);
                view.relocate_twice();
            }
            None => debug!(target: "term", view = %update.view, "update_dropped"),
        }
    }

    fn on_term_close(&mut self, exit: TermExit) {
        if let Some(view) = self.session.find_view_mut(exit.view) {
            view.close_terminal();
        }
        if let Some(error) = exit.error {
            self.session.ctx.messenger.error(error);
        }
    }
}
