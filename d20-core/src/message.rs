//! The scrolling message log.

use serde::{Deserialize, Serialize};

/// How a message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    Info,
    PlayerAttack,
    EnemyAttack,
    Alert,
    Impossible,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub tone: Tone,
    pub count: u32,
}

impl Message {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
            count: 1,
        }
    }

    /// Text with a repeat counter, e.g. "You wait. (x3)".
    pub fn full_text(&self) -> String {
        if self.count > 1 {
            format!("{} (x{})", self.text, self.count)
        } else {
            self.text.clone()
        }
    }
}

/// Ordered game messages. A repeat of the last message bumps its counter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, text: impl Into<String>, tone: Tone) {
        let text = text.into();
        if let Some(last) = self.messages.last_mut() {
            if last.text == text {
                last.count += 1;
                return;
            }
        }
        self.messages.push(Message::new(text, tone));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.text.contains(needle))
    }
}
