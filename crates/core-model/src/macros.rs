//! Macro recording.

use core_keymap::ActionId;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroStep {
    Action(ActionId),
    InsertedRune(char),
}

#[derive(Debug, Clone, Default)]
pub struct MacroRecorder {
    steps: Vec<MacroStep>,
    recording: bool,
    playing: bool,
}

impl MacroRecorder {
    /// Start or stop recording. Starting discards the previous macro.
    /// Returns the new recording state.
    pub fn toggle(&mut self) -> bool {
        self.recording = !self.recording;
        if self.recording {
            self.steps.clear();
        }
        debug!(target: "actions.macro", recording = self.recording, steps = self.steps.len(), "toggle");
        self.recording
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    fn capturing(&self) -> bool {
        self.recording && !self.playing
    }

    pub fn record_action(&mut self, action: ActionId) {
        if self.capturing() && !action.is_macro_control() {
            self.steps.push(MacroStep::Action(action));
        }
    }

    pub fn record_rune(&mut self, rune: char) {
        if self.capturing() {
            self.steps.push(MacroStep::InsertedRune(rune));
        }
    }

    pub fn steps(&self) -> &[MacroStep] {
        &self.steps
    }

    /// Take a copy of the steps for playback and suppress recording until
    /// [`MacroRecorder::end_playback`].
    pub fn begin_playback(&mut self) -> Vec<MacroStep> {
        self.playing = true;
        self.steps.clone()
    }

    pub fn end_playback(&mut self) {
        self.playing = false;
    }
}
