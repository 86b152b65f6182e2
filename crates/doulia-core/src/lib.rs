pub mod ai;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod i18n;
pub mod language;
pub mod state;
pub mod voice;

// Re-export main types for convenience
pub use ai::{GeminiClient, Reply, ResponseClient};
pub use config::Config;
pub use controller::{SpeechStep, TurnController, TurnOutcome, TurnRequest};
pub use error::{AudioDecodeError, ConverseError, TurnError, UploadError, VoiceError};
pub use language::{detect_language, Language};
pub use state::{AttachedFile, Conversation, Message, MessagePart, Sender};
pub use voice::{RecognitionEvent, SpeechAlert, SpeechRecognizer, VoiceCapture};
