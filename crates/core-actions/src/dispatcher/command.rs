//! Command prompt execution.
//!
//! Runs a submitted prompt line against the session. Bad input (unknown
//! command, option or value) is reported on the info bar and changes
//! nothing.

use core_config::{ConfigError, OptionValue};
use core_events::jobs::{JobCallback, JobOutcome};
use core_model::{EditorSession, SessionRequest, SplitDir, View};
use tracing::{debug, warn};

use super::command_parser::{CommandParser, ParsedCommand};

pub fn run_command(session: &mut EditorSession, line: &str) {
    let parsed = CommandParser::parse(line);
    debug!(target: "actions.dispatch", command = ?parsed, "command");
    match parsed {
        ParsedCommand::Set { option, value } => set_global(session, &option, &value),
        ParsedCommand::SetLocal { option, value } => set_local(session, &option, &value),
        ParsedCommand::Show(option) => {
            let local = session.cur_view().map(|v| &v.state.settings);
            let shown = session
                .ctx
                .config
                .get_option(&option, local)
                .map(ToString::to_string);
            match shown {
                Some(value) => session.ctx.messenger.info(value),
                None => session
                    .ctx
                    .messenger
                    .error(ConfigError::UnknownOption(option).to_string()),
            }
        }
        ParsedCommand::Bind { chord, actions } => {
            if let Err(err) = session.ctx.bindings.bind_str(&chord, &actions) {
                session.ctx.messenger.error(err.to_string());
            }
        }
        ParsedCommand::Run(args) => {
            let origin = session.cur_view().map(|v| v.id);
            let (program, args) = match args.split_first() {
                Some((program, rest)) => (program.clone(), rest.to_vec()),
                None => return,
            };
            if let Err(err) = session
                .ctx
                .jobs
                .spawn_process(origin, JobCallback::Shell, &program, args)
            {
                session.ctx.messenger.error(err.to_string());
            }
        }
        ParsedCommand::Term(args) => {
            let (program, args) = match args.split_first() {
                Some((program, rest)) => (program.clone(), rest.to_vec()),
                None => (default_shell(), Vec::new()),
            };
            session.ctx.request(SessionRequest::StartTerm { program, args });
        }
        ParsedCommand::Save(path) => {
            let Some((view, ctx)) = session.parts() else {
                return;
            };
            if let Some(path) = path {
                view.state.text.set_path(path);
            }
            ctx.save(view);
        }
        ParsedCommand::Quit => {
            if let Some(id) = session.cur_view().map(|v| v.id) {
                session.ctx.request(SessionRequest::CloseView(id));
            }
        }
        ParsedCommand::Open(path) => session.ctx.request(SessionRequest::Open(path)),
        ParsedCommand::Tab(path) => session.ctx.request(SessionRequest::NewTab(path)),
        ParsedCommand::VSplit(path) => session.ctx.request(SessionRequest::Split {
            dir: SplitDir::Vertical,
            path,
        }),
        ParsedCommand::HSplit(path) => session.ctx.request(SessionRequest::Split {
            dir: SplitDir::Horizontal,
            path,
        }),
        ParsedCommand::Raw => session.ctx.request(SessionRequest::OpenRaw),
        ParsedCommand::Help => session.ctx.request(SessionRequest::OpenHelp),
        ParsedCommand::Usage(usage) => session.ctx.messenger.error(format!("usage: {usage}")),
        ParsedCommand::Unknown(name) if name.is_empty() => {}
        ParsedCommand::Unknown(name) => session.ctx.messenger.error(format!("Unknown command: {name}")),
    }
}

fn default_shell() -> String {
    std::env::var("SHELL").unwrap_or_else(|_| "sh".to_string())
}

/// Set a global option, copy it into every buffer that carries the key
/// locally and write the settings file.
fn set_global(session: &mut EditorSession, option: &str, raw: &str) {
    let value = match session.ctx.config.set_global_option(option, raw) {
        Ok(value) => value,
        Err(err) => {
            session.ctx.messenger.error(err.to_string());
            return;
        }
    };
    for view in session.views_mut() {
        if view.state.settings.contains(option) {
            view.state.settings.insert(option, value.clone());
            apply_local_effect(view, option, &value);
        }
    }
    match (option, &value) {
        ("infobar", _) => session.ctx.request(SessionRequest::Relayout),
        ("mouse", OptionValue::Bool(on)) => session.ctx.mouse_capture = Some(*on),
        _ => {}
    }
    write_settings(session);
}

/// Render the settings on the loop and write them from the blocking pool.
fn write_settings(session: &mut EditorSession) {
    let file = match session.ctx.config.settings_file() {
        Ok(Some(file)) => file,
        Ok(None) => return,
        Err(err) => {
            warn!(target: "config", error = %err, "settings_render_failed");
            session.ctx.messenger.error(err.to_string());
            return;
        }
    };
    let target = file.path.display().to_string();
    let spawned = session.ctx.jobs.spawn_blocking(None, vec![target], move || match file.write() {
        Ok(()) => JobOutcome::ok(JobCallback::SettingsWritten, ""),
        Err(err) => JobOutcome::failed(JobCallback::SettingsWritten, err.to_string()),
    });
    if let Err(err) = spawned {
        session.ctx.messenger.error(err.to_string());
    }
}

fn set_local(session: &mut EditorSession, option: &str, raw: &str) {
    let Some((view, ctx)) = session.parts() else {
        return;
    };
    match ctx.config.set_local_option(&mut view.state.settings, option, raw) {
        Ok(value) => apply_local_effect(view, option, &value),
        Err(err) => ctx.messenger.error(err.to_string()),
    }
}

/// Options whose change reshapes the pane.
fn apply_local_effect(view: &mut View, option: &str, value: &OptionValue) {
    match (option, value) {
        ("statusline", OptionValue::Bool(on)) => view.toggle_statusline(*on),
        ("ruler" | "softwrap" | "tabsize", _) => {
            view.update_gutter_width();
            view.relocate();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::ConfigStore;
    use core_events::jobs::{JobCompletion, JobSpawner};
    use core_events::term::TermSpawner;
    use core_keymap::Bindings;
    use core_model::{SessionContext, ViewKind};
    use core_plugin::NoopExtensionHost;
    use core_text::Buffer;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn session(text: &str) -> EditorSession {
        let mut s = EditorSession::new(SessionContext::detached(ConfigStore::with_defaults()), 80, 24);
        let view = s.create_view(Buffer::from_str("t", text), ViewKind::Default);
        s.add_tab(view);
        s
    }

    #[test]
    fn set_statusline_toggles_every_pane() {
        let mut s = session("x");
        let before = s.cur_view().map(|v| v.viewport.height);
        run_command(&mut s, "set statusline off");
        assert_eq!(s.cur_view().map(|v| v.viewport.height), before.map(|h| h + 1));
        assert!(!s.cur_view().is_some_and(|v| v.has_statusline()));
    }

    #[test]
    fn set_reports_bad_input() {
        let mut s = session("x");
        run_command(&mut s, "set tabsize zero");
        assert!(s.ctx.messenger.message().is_some_and(|m| m.text.contains("tabsize")));
        run_command(&mut s, "set nosuchoption 1");
        assert!(s.ctx.messenger.message().is_some_and(|m| m.text.contains("nosuchoption")));
        assert_eq!(s.ctx.config.global().tabsize(), 4);
    }

    #[test]
    fn set_side_effects_reach_the_loop() {
        let mut s = session("x");
        run_command(&mut s, "set mouse off");
        assert_eq!(s.ctx.mouse_capture, Some(false));
        run_command(&mut s, "set infobar false");
        assert_eq!(s.ctx.take_requests(), vec![SessionRequest::Relayout]);
    }

    fn session_with_settings(path: std::path::PathBuf) -> (EditorSession, mpsc::Receiver<JobCompletion>) {
        let (job_tx, jobs) = mpsc::channel(4);
        let (update_tx, _) = mpsc::unbounded_channel();
        let (close_tx, _) = mpsc::unbounded_channel();
        let ctx = SessionContext::new(
            ConfigStore::load_from(Some(path)),
            Bindings::defaults(),
            Box::new(NoopExtensionHost::new()),
            JobSpawner::new(job_tx),
            TermSpawner::new(update_tx, close_tx),
        );
        (EditorSession::new(ctx, 80, 24), jobs)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn set_writes_settings_from_the_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let (mut s, mut jobs) = session_with_settings(path.clone());
        run_command(&mut s, "set tabsize 6");
        let done = tokio::time::timeout(Duration::from_secs(5), jobs.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.callback, JobCallback::SettingsWritten);
        assert!(done.success);
        assert!(std::fs::read_to_string(&path).unwrap().contains("tabsize = 6"));
        crate::handle_job_completion(&mut s, done);
        assert!(!s.ctx.messenger.has_message());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_settings_write_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let (mut s, mut jobs) = session_with_settings(blocker.join("settings.toml"));
        run_command(&mut s, "set tabsize 6");
        let done = tokio::time::timeout(Duration::from_secs(5), jobs.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(!done.success);
        crate::handle_job_completion(&mut s, done);
        assert!(s.ctx.messenger.has_message());
    }

    #[test]
    fn setlocal_only_touches_current_buffer() {
        let mut s = session("x");
        run_command(&mut s, "setlocal tabsize 8");
        assert_eq!(s.cur_view().map(|v| v.state.tabsize()), Some(8));
        assert_eq!(s.ctx.config.global().tabsize(), 4);
        run_command(&mut s, "show tabsize");
        assert_eq!(s.ctx.messenger.message().map(|m| m.text.as_str()), Some("8"));
    }

    #[test]
    fn structural_commands_queue_requests() {
        let mut s = session("x");
        run_command(&mut s, "hsplit other.txt");
        run_command(&mut s, "term ls -l");
        run_command(&mut s, "quit");
        assert_eq!(
            s.ctx.take_requests(),
            vec![
                SessionRequest::Split {
                    dir: SplitDir::Horizontal,
                    path: Some("other.txt".into())
                },
                SessionRequest::StartTerm {
                    program: "ls".into(),
                    args: vec!["-l".into()]
                },
                SessionRequest::CloseView(core_events::ViewId(1)),
            ]
        );
    }

    #[test]
    fn bind_and_unknown_commands() {
        let mut s = session("x");
        run_command(&mut s, "bind Alt-d DuplicateLine");
        assert!(!s.ctx.messenger.has_message());
        run_command(&mut s, "bind Alt-d Frobnicate");
        assert!(s.ctx.messenger.has_message());
        run_command(&mut s, "frob");
        assert_eq!(
            s.ctx.messenger.message().map(|m| m.text.as_str()),
            Some("Unknown command: frob")
        );
    }
}
