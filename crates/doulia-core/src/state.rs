//! UI-agnostic conversation types
//!
//! These are shared by the turn-taking controller and whatever front end
//! renders the conversation. Nothing here depends on a UI framework.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PDF_MIME: &str = "application/pdf";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One renderable piece of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePart {
    Text { text: String },
    Link { text: String, href: String },
    Bold { text: String },
    Error { text: String },
    Audio { audio_base64: String },
    File { file_name: String, mime_type: String },
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        MessagePart::Text { text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        MessagePart::Error { text: text.into() }
    }

    pub fn audio(audio_base64: impl Into<String>) -> Self {
        MessagePart::Audio {
            audio_base64: audio_base64.into(),
        }
    }

    /// A file reference for display; the payload itself is never stored in the conversation.
    pub fn file(file: &AttachedFile) -> Self {
        MessagePart::File {
            file_name: file.file_name.clone(),
            mime_type: file.mime_type.clone(),
        }
    }

    /// The text forwarded to the model as history. Files and audio are never replayed.
    pub fn history_text(&self) -> Option<&str> {
        match self {
            MessagePart::Text { text } | MessagePart::Bold { text } | MessagePart::Link { text, .. } => {
                Some(text.as_str())
            }
            MessagePart::Error { .. } | MessagePart::Audio { .. } | MessagePart::File { .. } => None,
        }
    }
}

/// A single conversation turn. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub parts: Vec<MessagePart>,
}

impl Message {
    pub fn new(sender: Sender, parts: Vec<MessagePart>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
            parts,
        }
    }

    pub fn user(parts: Vec<MessagePart>) -> Self {
        Self::new(Sender::User, parts)
    }

    pub fn bot(parts: Vec<MessagePart>) -> Self {
        Self::new(Sender::Bot, parts)
    }

    pub fn has_playable_audio(&self) -> bool {
        self.parts.iter().any(|part| {
            matches!(part, MessagePart::Audio { audio_base64 } if !audio_base64.is_empty())
        })
    }

    pub fn is_error(&self) -> bool {
        self.parts.iter().any(|part| matches!(part, MessagePart::Error { .. }))
    }
}

/// A file held in memory as base64, either staged for the next message or
/// waiting for a summary confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFile {
    pub data: String,
    pub mime_type: String,
    pub file_name: String,
}

impl AttachedFile {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME
    }
}

/// Append-only, display-ordered list of messages.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playable_audio_requires_payload() {
        let silent = Message::bot(vec![MessagePart::text("hi"), MessagePart::audio("")]);
        assert!(!silent.has_playable_audio());

        let spoken = Message::bot(vec![MessagePart::text("hi"), MessagePart::audio("AAAA")]);
        assert!(spoken.has_playable_audio());

        let text_only = Message::bot(vec![MessagePart::text("hi")]);
        assert!(!text_only.has_playable_audio());
    }

    #[test]
    fn test_history_text_skips_files_audio_and_errors() {
        let file = AttachedFile::new("JVBERi0=", PDF_MIME, "dao.pdf");
        assert_eq!(MessagePart::text("a").history_text(), Some("a"));
        assert_eq!(MessagePart::Bold { text: "b".into() }.history_text(), Some("b"));
        assert_eq!(
            MessagePart::Link { text: "c".into(), href: "https://paa.cm".into() }.history_text(),
            Some("c")
        );
        assert_eq!(MessagePart::file(&file).history_text(), None);
        assert_eq!(MessagePart::audio("AAAA").history_text(), None);
        assert_eq!(MessagePart::error("oops").history_text(), None);
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user(vec![MessagePart::text("a")]);
        let b = Message::user(vec![MessagePart::text("a")]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_part_serializes_with_type_tag() {
        let json = serde_json::to_value(MessagePart::text("bonjour")).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "bonjour");
    }
}
