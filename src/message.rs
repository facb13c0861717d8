use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// A code snippet embedded in a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAttachment {
    pub language: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: u64,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Local>,
    pub attachments: Vec<CodeAttachment>,
}

/// Append-only chat log. Ids come from an internal counter, so two messages
/// created within the same instant never collide. Insertion order is display
/// order; entries are never mutated or removed.
#[derive(Debug, Default)]
pub struct MessageLog {
    next_id: u64,
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        sender: Sender,
        content: impl Into<String>,
        attachments: Vec<CodeAttachment>,
    ) {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            sender,
            content: content.into(),
            timestamp: Local::now(),
            attachments,
        });
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_monotonic() {
        let mut log = MessageLog::new();
        // Same-instant appends must still get distinct ids
        for _ in 0..100 {
            log.append(Sender::User, "hi", Vec::new());
        }
        let ids: Vec<u64> = log.all().iter().map(|m| m.id).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_append_preserves_insertion_order() {
        let mut log = MessageLog::new();
        log.append(Sender::User, "question", Vec::new());
        log.append(Sender::Assistant, "answer", Vec::new());
        assert_eq!(log.len(), 2);
        assert_eq!(log.all()[0].sender, Sender::User);
        assert_eq!(log.all()[1].sender, Sender::Assistant);
        assert_eq!(log.all()[0].content, "question");
        assert_eq!(log.all()[1].content, "answer");
    }

    #[test]
    fn test_attachments_keep_order() {
        let mut log = MessageLog::new();
        let attachments = vec![
            CodeAttachment {
                language: "python".to_string(),
                code: "print(1)".to_string(),
            },
            CodeAttachment {
                language: "rust".to_string(),
                code: "fn main() {}".to_string(),
            },
        ];
        log.append(Sender::Assistant, "two blocks", attachments);
        let msg = log.all().last().unwrap();
        assert_eq!(msg.attachments[0].language, "python");
        assert_eq!(msg.attachments[1].language, "rust");
    }
}
