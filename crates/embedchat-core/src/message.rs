//! Chat messages and the append-only conversation log.

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// A single exchanged message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered sequence of messages for one widget instance.
///
/// The first entry is always the greeting inserted at construction. Entries
/// are only ever appended, and only by the widget state machine; hosts get
/// read access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub(crate) fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::bot(greeting)],
        }
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Never true in practice: the greeting is always present.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn greeting(&self) -> &Message {
        &self.messages[0]
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }
}

impl<'a> IntoIterator for &'a ConversationLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_starts_with_greeting() {
        let log = ConversationLog::with_greeting("Hello!");
        assert_eq!(log.len(), 1);
        assert_eq!(log.greeting(), &Message::bot("Hello!"));
        assert!(!log.is_empty());
    }

    #[test]
    fn test_push_preserves_order() {
        let mut log = ConversationLog::with_greeting("Hello!");
        log.push(Message::user("first"));
        log.push(Message::bot("second"));

        let contents: Vec<&str> = log.iter().map(Message::content).collect();
        assert_eq!(contents, vec!["Hello!", "first", "second"]);
        assert_eq!(log.last().map(Message::role), Some(Role::Bot));
    }

    #[test]
    fn test_message_serializes_lowercase_role() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }
}
