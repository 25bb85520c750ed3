//! Append-only conversation log.

use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One immutable entry in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    role: Role,
    content: String,
}

impl ConversationTurn {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Display form: user turns verbatim, assistant turns as paragraphs.
    pub fn paragraphs(&self) -> Vec<String> {
        match self.role {
            Role::User => vec![self.content.clone()],
            Role::Assistant => render_paragraphs(&self.content),
        }
    }
}

/// Turns in arrival order. Entries are never edited or removed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Role::User, content.into());
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content.into());
    }

    fn push(&mut self, role: Role, content: String) {
        self.turns.push(ConversationTurn { role, content });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Split assistant text into display paragraphs.
///
/// Drops carriage returns, splits on newline runs, strips one leading `*` or
/// `-` bullet marker, removes `*` emphasis, trims, and skips blank lines.
pub fn render_paragraphs(content: &str) -> Vec<String> {
    content
        .replace('\r', "")
        .split('\n')
        .map(|line| strip_bullet(line).replace('*', "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

fn strip_bullet(line: &str) -> &str {
    let Some(rest) = line.strip_prefix(['*', '-']) else {
        return line;
    };
    if rest.starts_with(char::is_whitespace) {
        rest.trim_start()
    } else {
        line
    }
}
