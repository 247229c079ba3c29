//! Editor model: panes, their viewports, tabs and the session that owns
//! them.

pub mod click;
pub mod gutter;
pub mod layout;
pub mod macros;
pub mod messenger;
pub mod session;
pub mod tab;
pub mod view;
pub mod viewport;

pub use click::{ClickKind, ClickState, DOUBLE_CLICK_THRESHOLD};
pub use gutter::{GutterKind, GutterMessage, GutterMessages};
pub use layout::{Layout, LayoutRegion, SplitDir};
pub use macros::{MacroRecorder, MacroStep};
pub use messenger::{Message, MessageKind, Messenger, Prompt, PromptOutcome, YesNoTopic};
pub use session::{EditorSession, SessionContext, SessionRequest, display_name};
pub use tab::{SplitConflict, Tab};
pub use view::{View, ViewKind};
pub use viewport::Viewport;
