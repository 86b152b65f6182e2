pub mod gemini;
pub mod instruction;

use async_trait::async_trait;

use crate::error::ConverseError;
use crate::language::Language;
use crate::state::{AttachedFile, Message};

pub use gemini::GeminiClient;

/// A normalized reply from the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub detected_language: Language,
    pub audio_base64: Option<String>,
}

/// Anything that can answer a conversation turn.
#[async_trait]
pub trait ResponseClient: Send + Sync {
    /// Send `prompt` (and `file`, if any) after `history`. `prompt` may only be
    /// empty when a file is attached.
    async fn converse(
        &self,
        prompt: &str,
        history: &[Message],
        preferred_language: Option<Language>,
        wants_audio: bool,
        file: Option<&AttachedFile>,
    ) -> Result<Reply, ConverseError>;
}
