//! Voice capture: a single-session state machine over a platform recognizer.
//!
//! The recognizer reports progress as [`RecognitionEvent`]s. One recording
//! session yields at most one finalized utterance: as soon as a final
//! segment arrives the recognizer is asked to stop, and the accumulated
//! text is handed back when the session ends.

use tracing::{info, warn};

use crate::error::VoiceError;
use crate::i18n;
use crate::language::Language;

/// Recognition failures, by the codes speech engines commonly report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechErrorKind {
    NoSpeech,
    NotAllowed,
    Other(String),
}

impl SpeechErrorKind {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "no-speech" => SpeechErrorKind::NoSpeech,
            "not-allowed" | "service-not-allowed" => SpeechErrorKind::NotAllowed,
            other => SpeechErrorKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSegment {
    pub transcript: String,
    pub is_final: bool,
}

impl TranscriptSegment {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    pub fn final_(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Started,
    /// Segments from `result_index` onward changed.
    Result {
        result_index: usize,
        results: Vec<TranscriptSegment>,
    },
    Error(SpeechErrorKind),
    End,
}

/// The platform speech-to-text capability. Events are delivered out of band.
pub trait SpeechRecognizer: Send {
    fn start(&mut self, locale: &str) -> anyhow::Result<()>;
    fn stop(&mut self);
    fn abort(&mut self);
}

/// User-facing voice problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechAlert {
    NoSpeech,
    PermissionDenied,
    Unavailable,
}

impl SpeechAlert {
    pub fn message(&self, language: Language) -> &'static str {
        match self {
            SpeechAlert::NoSpeech => i18n::no_speech(language),
            SpeechAlert::PermissionDenied => i18n::microphone_denied(language),
            SpeechAlert::Unavailable => i18n::speech_unavailable(language),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Recording,
}

/// What the owner should do after feeding an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOutcome {
    Nothing,
    Submit(String),
    Alert(SpeechAlert),
}

pub struct VoiceCapture {
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    state: CaptureState,
    interim: String,
}

impl VoiceCapture {
    pub fn new(recognizer: Option<Box<dyn SpeechRecognizer>>) -> Self {
        Self {
            recognizer,
            state: CaptureState::Idle,
            interim: String::new(),
        }
    }

    pub fn unavailable() -> Self {
        Self::new(None)
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    pub fn interim_text(&self) -> &str {
        &self.interim
    }

    pub fn clear_interim(&mut self) {
        self.interim.clear();
    }

    pub fn start(&mut self, language: Language) -> Result<(), VoiceError> {
        if self.is_recording() {
            return Err(VoiceError::AlreadyRecording);
        }
        let recognizer = self.recognizer.as_mut().ok_or(VoiceError::Unavailable)?;

        self.interim.clear();
        if let Err(e) = recognizer.start(language.locale_tag()) {
            warn!("Speech recognizer failed to start: {:#}", e);
            return Err(VoiceError::Unavailable);
        }

        self.state = CaptureState::Recording;
        info!(locale = language.locale_tag(), "Voice recognition started");
        Ok(())
    }

    /// Ask the recognizer to finish. The session ends when it reports `End`.
    pub fn stop(&mut self) -> Result<(), VoiceError> {
        if !self.is_recording() {
            return Err(VoiceError::NotRecording);
        }
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.stop();
        }
        Ok(())
    }

    pub fn abort(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.abort();
        }
        self.state = CaptureState::Idle;
        self.interim.clear();
    }

    pub fn toggle(&mut self, language: Language) -> Result<(), VoiceError> {
        if self.is_recording() {
            self.stop()
        } else {
            self.start(language)
        }
    }

    pub fn handle_event(&mut self, event: RecognitionEvent) -> VoiceOutcome {
        match event {
            RecognitionEvent::Started => {
                self.interim.clear();
                VoiceOutcome::Nothing
            }
            RecognitionEvent::Result { result_index, results } => {
                if !self.is_recording() {
                    return VoiceOutcome::Nothing;
                }

                let mut finalized = String::new();
                let mut pending = String::new();
                for segment in results.iter().skip(result_index) {
                    if segment.is_final {
                        finalized.push_str(&segment.transcript);
                    } else {
                        pending.push_str(&segment.transcript);
                    }
                }
                self.interim = format!("{finalized}{pending}");

                if !finalized.is_empty() {
                    if let Some(recognizer) = self.recognizer.as_mut() {
                        recognizer.stop();
                    }
                }
                VoiceOutcome::Nothing
            }
            RecognitionEvent::End => {
                if !self.is_recording() {
                    return VoiceOutcome::Nothing;
                }
                self.state = CaptureState::Idle;
                info!("Voice recognition ended");

                let text = std::mem::take(&mut self.interim).trim().to_string();
                if text.is_empty() {
                    VoiceOutcome::Nothing
                } else {
                    VoiceOutcome::Submit(text)
                }
            }
            RecognitionEvent::Error(kind) => {
                self.state = CaptureState::Idle;
                self.interim.clear();
                match kind {
                    SpeechErrorKind::NoSpeech => VoiceOutcome::Alert(SpeechAlert::NoSpeech),
                    SpeechErrorKind::NotAllowed => VoiceOutcome::Alert(SpeechAlert::PermissionDenied),
                    SpeechErrorKind::Other(code) => {
                        warn!(code = %code, "Speech recognition error");
                        VoiceOutcome::Nothing
                    }
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records the calls made to it.
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedRecognizer {
        pub calls: Arc<Mutex<Vec<String>>>,
        pub fail_start: bool,
    }

    impl SpeechRecognizer for ScriptedRecognizer {
        fn start(&mut self, locale: &str) -> anyhow::Result<()> {
            if self.fail_start {
                anyhow::bail!("no microphone");
            }
            self.calls.lock().unwrap().push(format!("start {locale}"));
            Ok(())
        }

        fn stop(&mut self) {
            self.calls.lock().unwrap().push("stop".to_string());
        }

        fn abort(&mut self) {
            self.calls.lock().unwrap().push("abort".to_string());
        }
    }

    fn capture() -> (VoiceCapture, Arc<Mutex<Vec<String>>>) {
        let recognizer = ScriptedRecognizer::default();
        let calls = recognizer.calls.clone();
        (VoiceCapture::new(Some(Box::new(recognizer))), calls)
    }

    #[test]
    fn test_start_passes_locale_and_guards_double_start() {
        let (mut voice, calls) = capture();
        voice.start(Language::Fr).unwrap();
        assert!(voice.is_recording());
        assert_eq!(voice.start(Language::Fr), Err(VoiceError::AlreadyRecording));
        assert_eq!(*calls.lock().unwrap(), vec!["start fr-FR".to_string()]);
    }

    #[test]
    fn test_unavailable_without_recognizer() {
        let mut voice = VoiceCapture::unavailable();
        assert_eq!(voice.start(Language::En), Err(VoiceError::Unavailable));
        assert!(!voice.is_recording());
    }

    #[test]
    fn test_failed_start_stays_idle() {
        let recognizer = ScriptedRecognizer {
            fail_start: true,
            ..Default::default()
        };
        let mut voice = VoiceCapture::new(Some(Box::new(recognizer)));
        assert_eq!(voice.start(Language::En), Err(VoiceError::Unavailable));
        assert_eq!(voice.state(), CaptureState::Idle);
    }

    #[test]
    fn test_interim_then_final_stops_and_submits() {
        let (mut voice, calls) = capture();
        voice.start(Language::En).unwrap();

        let outcome = voice.handle_event(RecognitionEvent::Result {
            result_index: 0,
            results: vec![TranscriptSegment::interim("tell me about")],
        });
        assert_eq!(outcome, VoiceOutcome::Nothing);
        assert_eq!(voice.interim_text(), "tell me about");
        assert!(!calls.lock().unwrap().contains(&"stop".to_string()));

        voice.handle_event(RecognitionEvent::Result {
            result_index: 0,
            results: vec![
                TranscriptSegment::final_("tell me about pricing"),
                TranscriptSegment::interim(" and"),
            ],
        });
        assert_eq!(voice.interim_text(), "tell me about pricing and");
        assert!(calls.lock().unwrap().contains(&"stop".to_string()));

        let outcome = voice.handle_event(RecognitionEvent::End);
        assert_eq!(outcome, VoiceOutcome::Submit("tell me about pricing and".to_string()));
        assert!(!voice.is_recording());
        assert_eq!(voice.interim_text(), "");
    }

    #[test]
    fn test_result_index_skips_earlier_segments() {
        let (mut voice, _) = capture();
        voice.start(Language::En).unwrap();
        voice.handle_event(RecognitionEvent::Result {
            result_index: 1,
            results: vec![
                TranscriptSegment::final_("old"),
                TranscriptSegment::interim("new"),
            ],
        });
        assert_eq!(voice.interim_text(), "new");
    }

    #[test]
    fn test_end_without_text_submits_nothing() {
        let (mut voice, _) = capture();
        voice.start(Language::En).unwrap();
        voice.stop().unwrap();
        assert_eq!(voice.handle_event(RecognitionEvent::End), VoiceOutcome::Nothing);
        assert_eq!(voice.state(), CaptureState::Idle);
    }

    #[test]
    fn test_stop_when_idle() {
        let (mut voice, _) = capture();
        assert_eq!(voice.stop(), Err(VoiceError::NotRecording));
    }

    #[test]
    fn test_named_errors_alert_others_are_silent() {
        let (mut voice, _) = capture();
        voice.start(Language::Fr).unwrap();
        assert_eq!(
            voice.handle_event(RecognitionEvent::Error(SpeechErrorKind::from_code("no-speech"))),
            VoiceOutcome::Alert(SpeechAlert::NoSpeech)
        );
        assert!(!voice.is_recording());

        voice.start(Language::Fr).unwrap();
        assert_eq!(
            voice.handle_event(RecognitionEvent::Error(SpeechErrorKind::from_code("not-allowed"))),
            VoiceOutcome::Alert(SpeechAlert::PermissionDenied)
        );

        voice.start(Language::Fr).unwrap();
        voice.handle_event(RecognitionEvent::Result {
            result_index: 0,
            results: vec![TranscriptSegment::interim("bonjour")],
        });
        assert_eq!(
            voice.handle_event(RecognitionEvent::Error(SpeechErrorKind::from_code("network"))),
            VoiceOutcome::Nothing
        );
        assert_eq!(voice.interim_text(), "");

        // The trailing End after an error does not resubmit anything
        assert_eq!(voice.handle_event(RecognitionEvent::End), VoiceOutcome::Nothing);
    }

    #[test]
    fn test_toggle() {
        let (mut voice, calls) = capture();
        voice.toggle(Language::En).unwrap();
        assert!(voice.is_recording());
        voice.toggle(Language::En).unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["start en-US".to_string(), "stop".to_string()]
        );
    }
}
