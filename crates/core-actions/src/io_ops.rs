//! Background job completions.
//!
//! Jobs (saves, settings writes, `run` commands, extension work) finish on
//! worker threads and report back through the jobs channel. The loop hands each completion to
//! `handle_job_completion`, which runs the callback against the session.

use core_events::JOBS_COMPLETED;
use core_events::jobs::{JobCallback, JobCompletion};
use core_model::{EditorSession, display_name};
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};

/// Run the callback named by `completion`. Completions whose originating
/// pane has been closed are dropped, except failed saves, which are always
/// reported.
pub fn handle_job_completion(session: &mut EditorSession, completion: JobCompletion) {
    let JobCompletion {
        id,
        origin,
        callback,
        output,
        success,
        ..
    } = completion;
    JOBS_COMPLETED.fetch_add(1, Ordering::Relaxed);
    if let Some(view) = origin
        && session.find_view(view).is_none()
    {
        if !success && matches!(callback, JobCallback::Saved { .. }) {
            warn!(target: "runtime.jobs", job = id.0, %view, error = %output, "save_failed");
            session.ctx.messenger.error(output);
        } else {
            debug!(target: "runtime.jobs", job = id.0, %view, "completion_dropped");
        }
        return;
    }
    match callback {
        JobCallback::Saved { revision, mod_time } => {
            let Some(view_id) = origin else {
                return;
            };
            let close_after = session.ctx.take_close_after_save(view_id);
            let Some(view) = session.find_view_mut(view_id) else {
                return;
            };
            if success {
                view.state.text.mark_saved(revision, mod_time);
                let name = display_name(&view.state.text);
                let clean = !view.state.modified();
                info!(target: "runtime.jobs", job = id.0, view = %view_id, revision, "saved");
                session.ctx.messenger.info(format!("Saved {name}"));
                if close_after && clean {
                    session.close_view(view_id);
                }
            } else {
                // The pane stays open so the changes are not lost.
                warn!(target: "runtime.jobs", job = id.0, view = %view_id, error = %output, "save_failed");
                session.ctx.messenger.error(output);
            }
        }
        JobCallback::SettingsWritten if success => {
            debug!(target: "config", job = id.0, "settings_written");
        }
        JobCallback::SettingsWritten => {
            warn!(target: "config", job = id.0, error = %output, "settings_write_failed");
            session.ctx.messenger.error(output);
        }
        JobCallback::Shell => {
            let text = output.trim_end().to_string();
            if success {
                session.ctx.messenger.info(text);
            } else {
                session.ctx.messenger.error(text);
            }
        }
        JobCallback::Extension(name) => {
            debug!(target: "runtime.jobs", job = id.0, callback = %name, "extension_callback");
            session
                .ctx
                .call_hook(|host| host.on_job_finished(origin, &output));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::ConfigStore;
    use core_events::ViewId;
    use core_events::jobs::JobId;
    use core_model::{SessionContext, ViewKind};
    use core_text::Buffer;

    fn session() -> EditorSession {
        let mut s = EditorSession::new(SessionContext::detached(ConfigStore::with_defaults()), 80, 24);
        let view = s.create_view(Buffer::from_str("notes.txt", "x"), ViewKind::Default);
        s.add_tab(view);
        s
    }

    fn completion(origin: Option<ViewId>, callback: JobCallback, output: &str, success: bool) -> JobCompletion {
        JobCompletion {
            id: JobId(1),
            origin,
            callback,
            output: output.to_string(),
            args: Vec::new(),
            success,
        }
    }

    #[test]
    fn shell_output_lands_on_the_info_bar() {
        let mut s = session();
        handle_job_completion(&mut s, completion(Some(ViewId(1)), JobCallback::Shell, "hi\n", true));
        assert_eq!(s.ctx.messenger.message().map(|m| m.text.as_str()), Some("hi"));
    }

    #[test]
    fn every_completion_is_counted() {
        let mut s = session();
        let before = core_events::counters().jobs_completed;
        handle_job_completion(&mut s, completion(Some(ViewId(42)), JobCallback::Shell, "late", true));
        handle_job_completion(&mut s, completion(None, JobCallback::Shell, "", true));
        assert!(core_events::counters().jobs_completed >= before + 2);
    }

    #[test]
    fn completions_for_closed_panes_are_dropped() {
        let mut s = session();
        handle_job_completion(&mut s, completion(Some(ViewId(42)), JobCallback::Shell, "late", true));
        assert!(!s.ctx.messenger.has_message());
    }

    #[test]
    fn stale_save_keeps_buffer_modified() {
        let mut s = session();
        let view = s.cur_view_mut().expect("view");
        view.state.insert(core_text::Loc::origin(), "a");
        let rev = view.state.text.revision();
        let saved = JobCallback::Saved {
            revision: rev - 1,
            mod_time: None,
        };
        handle_job_completion(&mut s, completion(Some(ViewId(1)), saved, "notes.txt", true));
        assert!(s.cur_view().is_some_and(|v| v.state.modified()));

        let saved = JobCallback::Saved {
            revision: rev,
            mod_time: None,
        };
        handle_job_completion(&mut s, completion(Some(ViewId(1)), saved, "notes.txt", true));
        assert!(s.cur_view().is_some_and(|v| !v.state.modified()));
        assert_eq!(
            s.ctx.messenger.message().map(|m| m.text.as_str()),
            Some("Saved notes.txt")
        );
    }

    #[test]
    fn failed_save_for_a_closed_pane_is_still_reported() {
        let mut s = session();
        let saved = JobCallback::Saved {
            revision: 1,
            mod_time: None,
        };
        handle_job_completion(&mut s, completion(Some(ViewId(42)), saved, "permission denied", false));
        assert_eq!(
            s.ctx.messenger.message().map(|m| m.text.as_str()),
            Some("permission denied")
        );
    }
}
