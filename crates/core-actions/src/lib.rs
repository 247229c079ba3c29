//! Action layer: turns events into buffer edits, cursor motion and session
//! requests.
//!
//! * `dispatcher` - the multi-cursor executor and every action body
//! * `event_handler` - per-pane event handling and prompt routing
//! * `io_ops` - background job completion callbacks

pub mod dispatcher;
mod event_handler;
mod io_ops;

pub use dispatcher::{
    ActionFn, CommandParser, ParsedCommand, action_fn, dispatch_binding, execute_actions, insert_rune,
    paste_text, run_command,
};
pub use event_handler::{handle_event, handle_prompt_event};
pub use io_ops::handle_job_completion;
