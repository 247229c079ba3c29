//! Info bar messages and prompts.
//!
//! The messenger owns the bottom line: the last info or error message, or an
//! active prompt. While a prompt is open every key goes to it; the caller
//! acts on the returned [`PromptOutcome`].

use core_events::{KeyCode, KeyEvent, ModMask, ViewId};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub kind: MessageKind,
}

/// What a yes/no prompt decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNoTopic {
    /// Save the pane's buffer before closing it.
    SaveBeforeClose(ViewId),
    /// Quit with unsaved buffers.
    QuitAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    YesNo { question: String, topic: YesNoTopic },
    Command { input: String, cursor: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// Key consumed; prompt still open.
    Pending,
    Answer { topic: YesNoTopic, yes: bool },
    Command(String),
    Canceled,
}

#[derive(Debug, Clone, Default)]
pub struct Messenger {
    message: Option<Message>,
    prompt: Option<Prompt>,
    history: Vec<String>,
    history_pos: Option<usize>,
}

impl Messenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!(target: "messenger", %text, "info");
        self.message = Some(Message {
            text,
            kind: MessageKind::Info,
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        warn!(target: "messenger", %text, "error");
        self.message = Some(Message {
            text,
            kind: MessageKind::Error,
        });
    }

    pub fn clear(&mut self) {
        self.message = None;
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn has_message(&self) -> bool {
        self.message.is_some()
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    pub fn is_prompting(&self) -> bool {
        self.prompt.is_some()
    }

    pub fn ask_yes_no(&mut self, question: impl Into<String>, topic: YesNoTopic) {
        self.prompt = Some(Prompt::YesNo {
            question: question.into(),
            topic,
        });
    }

    /// Open the command prompt with `prefill` typed in.
    pub fn open_command(&mut self, prefill: &str) {
        self.history_pos = None;
        self.prompt = Some(Prompt::Command {
            input: prefill.to_string(),
            cursor: prefill.chars().count(),
        });
    }

    /// Text the bottom line should show and, for the command prompt, the
    /// cursor column within it.
    pub fn line(&self) -> (String, Option<usize>) {
        match &self.prompt {
            Some(Prompt::YesNo { question, .. }) => (question.clone(), None),
            Some(Prompt::Command { input, cursor }) => (format!("> {input}"), Some(cursor + 2)),
            None => (
                self.message.as_ref().map(|m| m.text.clone()).unwrap_or_default(),
                None,
            ),
        }
    }

    /// Paste into the command prompt. No-op for other prompts.
    pub fn paste(&mut self, text: &str) {
        if let Some(Prompt::Command { input, cursor }) = &mut self.prompt {
            let clean: String = text.chars().filter(|c| !c.is_control()).collect();
            let at = byte_index(input, *cursor);
            input.insert_str(at, &clean);
            *cursor += clean.chars().count();
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> PromptOutcome {
        let Some(prompt) = self.prompt.as_mut() else {
            return PromptOutcome::Canceled;
        };
        let cancel = key.code == KeyCode::Esc
            || (key.mods.contains(ModMask::CTRL)
                && matches!(key.code, KeyCode::Char('c' | 'q')));
        if cancel {
            self.prompt = None;
            return PromptOutcome::Canceled;
        }
        match prompt {
            Prompt::YesNo { topic, .. } => {
                let topic = *topic;
                match key.inserted_rune() {
                    Some('y' | 'Y') => {
                        self.prompt = None;
                        PromptOutcome::Answer { topic, yes: true }
                    }
                    Some('n' | 'N') => {
                        self.prompt = None;
                        PromptOutcome::Answer { topic, yes: false }
                    }
                    _ => PromptOutcome::Pending,
                }
            }
            Prompt::Command { input, cursor } => {
                match key.code {
                    KeyCode::Enter => {
                        let line = std::mem::take(input);
                        self.prompt = None;
                        self.history_pos = None;
                        if !line.trim().is_empty() {
                            self.history.push(line.clone());
                        }
                        return PromptOutcome::Command(line);
                    }
                    KeyCode::Backspace if *cursor > 0 => {
                        *cursor -= 1;
                        let at = byte_index(input, *cursor);
                        input.remove(at);
                    }
                    KeyCode::Delete if *cursor < input.chars().count() => {
                        let at = byte_index(input, *cursor);
                        input.remove(at);
                    }
                    KeyCode::Left => *cursor = cursor.saturating_sub(1),
                    KeyCode::Right => *cursor = (*cursor + 1).min(input.chars().count()),
                    KeyCode::Home => *cursor = 0,
                    KeyCode::End => *cursor = input.chars().count(),
                    KeyCode::Up | KeyCode::Down if !self.history.is_empty() => {
                        let last = self.history.len() - 1;
                        let pos = match (self.history_pos, key.code) {
                            (None, KeyCode::Up) => Some(last),
                            (None, _) => None,
                            (Some(p), KeyCode::Up) => Some(p.saturating_sub(1)),
                            (Some(p), _) if p < last => Some(p + 1),
                            (Some(_), _) => None,
                        };
                        self.history_pos = pos;
                        *input = pos.map(|p| self.history[p].clone()).unwrap_or_default();
                        *cursor = input.chars().count();
                    }
                    _ => {
                        if let Some(c) = key.inserted_rune() {
                            let at = byte_index(input, *cursor);
                            input.insert(at, c);
                            *cursor += 1;
                        }
                    }
                }
                PromptOutcome::Pending
            }
        }
    }
}

fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}
