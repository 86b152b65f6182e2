//! Turn taking: reconciles typed text, voice transcripts, staged files and a
//! pending summary offer into one linear conversation.
//!
//! A turn is split in two halves so a front end can run the network call on
//! a background task: [`TurnController::begin_submit`] /
//! [`TurnController::begin_service_turn`] append the user message and return
//! the request to send, [`TurnController::complete_turn`] appends the reply.
//! While a turn is in flight every entry point refuses new work.

use tracing::{info, warn};

use crate::ai::{Reply, ResponseClient};
use crate::catalog::{find_service, opening_prompt};
use crate::error::{ConverseError, TurnError, UploadError, VoiceError};
use crate::i18n;
use crate::language::Language;
use crate::state::{AttachedFile, Conversation, Message, MessagePart, Sender};
use crate::voice::{RecognitionEvent, SpeechAlert, VoiceCapture, VoiceOutcome};

pub const WELCOME_MESSAGE_ID: &str = "welcome";

const CONFIRMATION_TOKENS: &[&str] = &["oui", "résumez", "yes", "summarize"];

/// Does the text read as "yes, summarize it"? Case-insensitive substring match.
pub fn is_summary_confirmation(text: &str) -> bool {
    let lower = text.to_lowercase();
    CONFIRMATION_TOKENS.iter().any(|token| lower.contains(token))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Message,
    Summary,
    Service,
}

/// Everything needed to ask the model for the reply to one turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub kind: TurnKind,
    pub prompt: String,
    /// The conversation as it was before this turn's user message.
    pub history: Vec<Message>,
    pub language: Language,
    pub wants_audio: bool,
    pub file: Option<AttachedFile>,
}

impl TurnRequest {
    pub async fn send(&self, client: &dyn ResponseClient) -> Result<Reply, ConverseError> {
        client
            .converse(
                &self.prompt,
                &self.history,
                Some(self.language),
                self.wants_audio,
                self.file.as_ref(),
            )
            .await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A reply was appended. Audio, when present, should be played now.
    Replied { audio_base64: Option<String> },
    /// An error message was appended.
    Failed,
}

/// Result of feeding a speech event to the controller.
#[derive(Debug)]
pub enum SpeechStep {
    Idle,
    Alert(SpeechAlert),
    Submit(TurnRequest),
}

pub struct TurnController {
    conversation: Conversation,
    staged_file: Option<AttachedFile>,
    pending_summary: Option<AttachedFile>,
    current_language: Language,
    display_language: Language,
    in_flight: Option<TurnKind>,
    speaking: bool,
    voice: VoiceCapture,
}

impl TurnController {
    pub fn new(display_language: Language, voice: VoiceCapture) -> Self {
        let mut conversation = Conversation::new();
        conversation.push(Message {
            id: WELCOME_MESSAGE_ID.to_string(),
            sender: Sender::Bot,
            parts: i18n::welcome_parts(),
        });

        Self {
            conversation,
            staged_file: None,
            pending_summary: None,
            current_language: display_language,
            display_language,
            in_flight: None,
            speaking: false,
            voice,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn staged_file(&self) -> Option<&AttachedFile> {
        self.staged_file.as_ref()
    }

    pub fn pending_summary(&self) -> Option<&AttachedFile> {
        self.pending_summary.as_ref()
    }

    pub fn current_language(&self) -> Language {
        self.current_language
    }

    pub fn display_language(&self) -> Language {
        self.display_language
    }

    pub fn set_display_language(&mut self, language: Language) {
        self.display_language = language;
    }

    pub fn toggle_display_language(&mut self) -> Language {
        self.display_language = self.display_language.toggled();
        self.display_language
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_recording(&self) -> bool {
        self.voice.is_recording()
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn interim_text(&self) -> &str {
        self.voice.interim_text()
    }

    pub fn voice_available(&self) -> bool {
        self.voice.is_available()
    }

    /// Drop any live capture session without submitting its transcript.
    pub fn shutdown(&mut self) {
        if self.voice.is_recording() {
            self.voice.abort();
        }
    }

    /// Text input, upload and send are only live when nothing else is happening.
    pub fn input_enabled(&self) -> bool {
        !self.is_sending() && !self.is_recording() && !self.speaking
    }

    pub fn voice_toggle_enabled(&self) -> bool {
        !self.is_sending() && !self.speaking && self.staged_file.is_none()
    }

    /// Any edit of the input box drops a staged file.
    pub fn on_input_edited(&mut self) {
        self.staged_file = None;
    }

    /// Start a turn from typed text or a voice transcript.
    pub fn begin_submit(&mut self, typed: &str, is_voice: bool) -> Result<TurnRequest, TurnError> {
        if !self.input_enabled() {
            return Err(TurnError::Busy);
        }

        let typed = typed.trim();
        let effective_text = if typed.is_empty() {
            self.voice.interim_text().trim().to_string()
        } else {
            typed.to_string()
        };

        let confirmed = is_summary_confirmation(&effective_text);
        let (kind, prompt, file) = match (&self.pending_summary, &self.staged_file) {
            (Some(pending), _) if confirmed => (
                TurnKind::Summary,
                i18n::summarize_instruction(self.current_language).to_string(),
                Some(pending.clone()),
            ),
            (_, Some(staged)) => (TurnKind::Message, effective_text.clone(), Some(staged.clone())),
            _ => (TurnKind::Message, effective_text.clone(), None),
        };

        if prompt.is_empty() && file.is_none() {
            return Err(TurnError::Empty);
        }

        let history = self.conversation.messages().to_vec();

        // Show what the user typed, not the instruction it stands for, plus the
        // file going out with it.
        let mut parts = Vec::new();
        if !prompt.is_empty() {
            parts.push(MessagePart::text(effective_text.as_str()));
        }
        if let Some(file) = &file {
            parts.push(MessagePart::file(file));
        }
        self.conversation.push(Message::user(parts));

        self.in_flight = Some(kind);
        self.voice.clear_interim();
        self.staged_file = None;
        if kind == TurnKind::Summary || (self.pending_summary.is_some() && !confirmed) {
            self.pending_summary = None;
        }

        info!(
            kind = ?kind,
            is_voice,
            language = self.current_language.as_str(),
            attachment = file.as_ref().map(|f| f.file_name.as_str()),
            "Submitting turn"
        );

        Ok(TurnRequest {
            kind,
            prompt,
            history,
            language: self.current_language,
            wants_audio: is_voice,
            file,
        })
    }

    /// Start a turn for a service card, phrased in the display language.
    pub fn begin_service_turn(&mut self, service_id: &str) -> Result<TurnRequest, TurnError> {
        if !self.input_enabled() {
            return Err(TurnError::Busy);
        }
        let service =
            find_service(service_id).ok_or_else(|| TurnError::UnknownService(service_id.to_string()))?;

        let prompt = opening_prompt(service, self.display_language);
        self.current_language = self.display_language;

        let history = self.conversation.messages().to_vec();
        self.conversation
            .push(Message::user(vec![MessagePart::text(prompt.as_str())]));

        self.in_flight = Some(TurnKind::Service);
        self.pending_summary = None;
        self.staged_file = None;

        info!(service = service.id, language = self.current_language.as_str(), "Service selected");

        Ok(TurnRequest {
            kind: TurnKind::Service,
            prompt,
            history,
            language: self.current_language,
            wants_audio: false,
            file: None,
        })
    }

    /// Append the reply (or failure) for the turn in flight and leave the sending state.
    pub fn complete_turn(&mut self, result: Result<Reply, ConverseError>) -> Result<TurnOutcome, TurnError> {
        let kind = self.in_flight.take().ok_or(TurnError::NotInFlight)?;

        match result {
            Ok(reply) => {
                let text = if reply.text.trim().is_empty() {
                    i18n::no_response(self.current_language).to_string()
                } else {
                    reply.text
                };
                // Service turns never ask for speech
                let audio = match kind {
                    TurnKind::Service => None,
                    TurnKind::Message | TurnKind::Summary => {
                        reply.audio_base64.filter(|audio| !audio.is_empty())
                    }
                };

                let mut parts = vec![MessagePart::text(text)];
                if let Some(audio) = &audio {
                    parts.push(MessagePart::audio(audio.as_str()));
                }
                self.conversation.push(Message::bot(parts));
                self.current_language = reply.detected_language;

                if audio.is_some() {
                    self.speaking = true;
                }
                Ok(TurnOutcome::Replied { audio_base64: audio })
            }
            Err(err) => {
                warn!(kind = ?kind, "Turn failed: {}", err);
                let text = if err.is_configuration() {
                    i18n::configuration_failure(self.current_language)
                } else {
                    i18n::service_failure(self.current_language)
                };
                self.conversation.push(Message::bot(vec![MessagePart::error(text)]));
                Ok(TurnOutcome::Failed)
            }
        }
    }

    /// Playback finished, failed, or was skipped.
    pub fn playback_finished(&mut self) {
        self.speaking = false;
    }

    /// Submit and wait for the reply in one go.
    pub async fn submit(
        &mut self,
        client: &dyn ResponseClient,
        typed: &str,
        is_voice: bool,
    ) -> Result<TurnOutcome, TurnError> {
        let request = self.begin_submit(typed, is_voice)?;
        let result = request.send(client).await;
        self.complete_turn(result)
    }

    pub async fn select_service(
        &mut self,
        client: &dyn ResponseClient,
        service_id: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let request = self.begin_service_turn(service_id)?;
        let result = request.send(client).await;
        self.complete_turn(result)
    }

    /// Accept a PDF and offer to summarize it. No model round-trip happens here.
    pub fn upload_file(&mut self, file: AttachedFile) -> Result<(), UploadError> {
        self.check_attachment(&file)?;

        info!(file = %file.file_name, "Document received, offering summary");
        self.conversation
            .push(Message::user(vec![MessagePart::file(&file)]));
        self.conversation.push(Message::bot(vec![MessagePart::text(
            i18n::summary_offer(self.current_language, &file.file_name),
        )]));

        self.pending_summary = Some(file);
        self.staged_file = None;
        Ok(())
    }

    /// Attach a PDF to the next outgoing message only.
    pub fn stage_file(&mut self, file: AttachedFile) -> Result<(), UploadError> {
        self.check_attachment(&file)?;
        info!(file = %file.file_name, "File staged for next message");
        self.staged_file = Some(file);
        Ok(())
    }

    fn check_attachment(&self, file: &AttachedFile) -> Result<(), UploadError> {
        if !self.input_enabled() {
            return Err(UploadError::Busy);
        }
        if !file.is_pdf() {
            warn!(file = %file.file_name, mime = %file.mime_type, "Rejected non-PDF upload");
            return Err(UploadError::UnsupportedFileType {
                mime: file.mime_type.clone(),
            });
        }
        Ok(())
    }

    pub fn toggle_recording(&mut self) -> Result<(), VoiceError> {
        if !self.is_recording() && !self.voice_toggle_enabled() {
            return Err(VoiceError::Busy);
        }
        self.voice.toggle(self.current_language)
    }

    /// Feed a recognizer event; a finished utterance becomes a voice turn.
    pub fn handle_speech_event(&mut self, event: RecognitionEvent) -> SpeechStep {
        match self.voice.handle_event(event) {
            VoiceOutcome::Nothing => SpeechStep::Idle,
            VoiceOutcome::Alert(alert) => SpeechStep::Alert(alert),
            VoiceOutcome::Submit(text) => match self.begin_submit(&text, true) {
                Ok(request) => SpeechStep::Submit(request),
                Err(e) => {
                    warn!("Dropped voice transcript: {}", e);
                    SpeechStep::Idle
                }
            },
        }
    }
}
