mod common;

use common::*;
use core_model::ViewKind;
use core_text::Buffer;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn save_runs_in_the_background_and_clears_modified() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("note.txt");
    std::fs::write(&path, "hello")?;

    let (ctx, mut jobs) = live_context();
    let mut s = core_model::EditorSession::new(ctx, 80, 24);
    let view = s.create_view(Buffer::open(&path)?, ViewKind::Default);
    s.add_tab(view);

    type_str(&mut s, "x");
    feed(&mut s, ctrl('s'));
    assert!(s.cur_view().is_some_and(|v| v.state.modified()));

    let done = jobs.recv().await.expect("save completion");
    assert!(done.success);
    core_actions::handle_job_completion(&mut s, done);

    assert_eq!(std::fs::read_to_string(&path)?, "xhello");
    assert!(s.cur_view().is_some_and(|v| !v.state.modified()));
    assert_eq!(
        s.ctx.messenger.message().map(|m| m.text.as_str()),
        Some("Saved note.txt")
    );
    Ok(())
}

#[tokio::test]
async fn edits_during_a_save_keep_the_buffer_modified() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("race.txt");

    let (ctx, mut jobs) = live_context();
    let mut s = core_model::EditorSession::new(ctx, 80, 24);
    let view = s.create_view(Buffer::open(&path)?, ViewKind::Default);
    s.add_tab(view);

    type_str(&mut s, "a");
    feed(&mut s, ctrl('s'));
    type_str(&mut s, "b");

    let done = jobs.recv().await.expect("save completion");
    core_actions::handle_job_completion(&mut s, done);
    assert_eq!(std::fs::read_to_string(&path)?, "a");
    assert!(s.cur_view().is_some_and(|v| v.state.modified()));
    Ok(())
}

#[test]
fn unnamed_buffer_save_opens_the_prompt() {
    let mut s = session("text");
    feed(&mut s, ctrl('s'));
    let (line, _) = s.ctx.messenger.line();
    assert_eq!(line, "> save ");
}
