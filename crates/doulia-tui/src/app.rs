use std::sync::Arc;

use doulia_core::catalog::SERVICES;
use doulia_core::i18n;
use doulia_core::voice::SpeechRecognizer;
use doulia_core::{
    Config, ConverseError, GeminiClient, Language, MessagePart, RecognitionEvent, Reply,
    ResponseClient, SpeechStep, TurnController, TurnError, TurnOutcome, TurnRequest, UploadError,
    VoiceCapture, VoiceError,
};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::files;
use crate::playback::{self, AudioSink};
use crate::speech::CommandRecognizer;
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Services,
    Chat,
}

/// What a path typed into the file prompt is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPurpose {
    /// Upload a document and get offered a summary
    Upload,
    /// Attach to the next message only
    Stage,
}

#[derive(Debug, Clone)]
pub struct PathPrompt {
    pub purpose: PathPurpose,
    pub input: String,
    pub cursor: usize,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    pub controller: TurnController,
    client: Arc<dyn ResponseClient>,
    sink: Arc<dyn AudioSink>,
    events: UnboundedSender<AppEvent>,
    pub turn_task: Option<JoinHandle<Result<Reply, ConverseError>>>,

    // Chat input
    pub input: String,
    pub cursor: usize, // cursor position in chars

    // Service catalogue
    pub service_state: ListState,

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Areas for mouse hit-testing
    pub services_area: Option<Rect>,
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Popups
    pub alert: Option<String>,
    pub path_prompt: Option<PathPrompt>,
}

impl App {
    pub fn new(config: &Config, events: UnboundedSender<AppEvent>) -> Self {
        let recognizer = config
            .speech_command
            .as_deref()
            .and_then(|command| CommandRecognizer::from_command_line(command, events.clone()))
            .map(|recognizer| Box::new(recognizer) as Box<dyn SpeechRecognizer>);

        let client = GeminiClient::new(config);
        if !client.has_api_key() {
            warn!("No Gemini API key configured; replies will fail until one is set");
        }

        Self::with_parts(
            TurnController::new(config.display_language(), VoiceCapture::new(recognizer)),
            Arc::new(client),
            playback::default_sink(),
            events,
        )
    }

    pub fn with_parts(
        controller: TurnController,
        client: Arc<dyn ResponseClient>,
        sink: Arc<dyn AudioSink>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let mut service_state = ListState::default();
        service_state.select(Some(0));

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: FocusPane::Services,
            controller,
            client,
            sink,
            events,
            turn_task: None,
            input: String::new(),
            cursor: 0,
            service_state,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            services_area: None,
            chat_area: None,
            animation_frame: 0,
            alert: None,
            path_prompt: None,
        }
    }

    pub fn display_language(&self) -> Language {
        self.controller.display_language()
    }

    fn spawn_turn(&mut self, request: TurnRequest) {
        let client = self.client.clone();
        self.turn_task = Some(tokio::spawn(async move { request.send(client.as_ref()).await }));
        self.scroll_chat_to_bottom();
    }

    /// Send whatever is in the input box (plus any staged file).
    pub fn submit_input(&mut self) {
        match self.controller.begin_submit(&self.input, false) {
            Ok(request) => {
                self.input.clear();
                self.cursor = 0;
                self.input_mode = InputMode::Normal;
                self.spawn_turn(request);
            }
            Err(TurnError::Empty) => {}
            Err(e) => debug!("Submit ignored: {}", e),
        }
    }

    pub fn select_service(&mut self) {
        let Some(service) = self.service_state.selected().and_then(|i| SERVICES.get(i)) else {
            return;
        };
        match self.controller.begin_service_turn(service.id) {
            Ok(request) => {
                self.focus = FocusPane::Chat;
                self.spawn_turn(request);
            }
            Err(e) => debug!("Service selection ignored: {}", e),
        }
    }

    /// Collect the reply once the background request has finished.
    pub async fn poll_turn(&mut self) {
        if !self.turn_task.as_ref().is_some_and(|task| task.is_finished()) {
            return;
        }
        let Some(task) = self.turn_task.take() else {
            return;
        };

        let result = task.await.unwrap_or_else(|e| {
            Err(ConverseError::Service {
                status: None,
                message: format!("request task failed: {}", e),
            })
        });

        match self.controller.complete_turn(result) {
            Ok(TurnOutcome::Replied {
                audio_base64: Some(audio),
            }) => {
                playback::spawn_playback(self.sink.clone(), audio, self.events.clone());
            }
            Ok(_) => {}
            Err(e) => warn!("Reply arrived with no turn in flight: {}", e),
        }
        self.scroll_chat_to_bottom();
    }

    /// Abort any live capture before the terminal is torn down.
    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }

    pub fn on_playback_ended(&mut self) {
        self.controller.playback_finished();
    }

    pub fn toggle_voice(&mut self) {
        match self.controller.toggle_recording() {
            Ok(()) => self.input_mode = InputMode::Normal,
            Err(VoiceError::Unavailable) => {
                self.alert = Some(i18n::speech_unavailable(self.display_language()).to_string());
            }
            Err(e) => debug!("Voice toggle ignored: {}", e),
        }
    }

    pub fn on_speech_event(&mut self, event: RecognitionEvent) {
        match self.controller.handle_speech_event(event) {
            SpeechStep::Submit(request) => self.spawn_turn(request),
            SpeechStep::Alert(alert) => {
                self.alert = Some(alert.message(self.controller.current_language()).to_string());
            }
            SpeechStep::Idle => {}
        }
    }

    pub fn open_path_prompt(&mut self, purpose: PathPurpose) {
        if !self.controller.input_enabled() {
            return;
        }
        self.path_prompt = Some(PathPrompt {
            purpose,
            input: String::new(),
            cursor: 0,
        });
    }

    pub fn confirm_path_prompt(&mut self) {
        let Some(prompt) = self.path_prompt.take() else {
            return;
        };
        if prompt.input.trim().is_empty() {
            return;
        }

        let file = match files::read_attachment(&files::expand_path(&prompt.input)) {
            Ok(file) => file,
            Err(e) => {
                warn!("Could not load attachment: {:#}", e);
                self.alert = Some(format!("{:#}", e));
                return;
            }
        };

        let result = match prompt.purpose {
            PathPurpose::Upload => self.controller.upload_file(file),
            PathPurpose::Stage => self.controller.stage_file(file),
        };
        match result {
            Ok(()) => self.scroll_chat_to_bottom(),
            Err(UploadError::UnsupportedFileType { .. }) => {
                self.alert = Some(i18n::pdf_only(self.controller.current_language()).to_string());
            }
            Err(e) => debug!("Attachment ignored: {}", e),
        }
    }

    pub fn toggle_display_language(&mut self) {
        let language = self.controller.toggle_display_language();
        if let Err(e) = Config::save_display_language(language) {
            warn!("Could not save display language: {:#}", e);
        }
    }

    // Input editing. Any edit drops a staged file.

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
        self.controller.on_input_edited();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
            self.controller.on_input_edited();
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
            self.controller.on_input_edited();
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    // Navigation

    pub fn service_down(&mut self) {
        let i = self.service_state.selected().unwrap_or(0);
        self.service_state.select(Some((i + 1).min(SERVICES.len() - 1)));
    }

    pub fn service_up(&mut self) {
        let i = self.service_state.selected().unwrap_or(0);
        self.service_state.select(Some(i.saturating_sub(1)));
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.controller.is_sending() || self.controller.is_recording() || self.controller.is_speaking() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll chat to bottom so the latest reply (or the loading line) is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 { self.chat_width as usize } else { 50 };

        let wrapped = |text: &str| -> usize {
            text.lines()
                .map(|line| line.chars().count() / wrap_width + 1)
                .fold(0usize, usize::saturating_add)
                .max(1)
        };

        let mut total_lines: usize = 0;
        for message in self.controller.messages() {
            // Sender line and the blank line after the message
            total_lines = total_lines.saturating_add(2);
            for part in &message.parts {
                total_lines = total_lines.saturating_add(match part {
                    MessagePart::Text { text } | MessagePart::Error { text } => wrapped(text),
                    _ => 1,
                });
            }
        }

        if self.controller.is_sending() {
            total_lines = total_lines.saturating_add(2);
        }

        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        let scroll = total_lines.saturating_sub(visible_height as usize);
        self.chat_scroll = u16::try_from(scroll).unwrap_or(u16::MAX);
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
pub(crate) fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use doulia_core::audio::PcmBuffer;
    use doulia_core::{AttachedFile, Message, Sender};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    struct EchoClient {
        audio: Option<String>,
        reply: Option<String>,
    }

    #[async_trait]
    impl ResponseClient for EchoClient {
        async fn converse(
            &self,
            prompt: &str,
            _history: &[Message],
            preferred_language: Option<Language>,
            _wants_audio: bool,
            _file: Option<&AttachedFile>,
        ) -> Result<Reply, ConverseError> {
            Ok(Reply {
                text: self.reply.clone().unwrap_or_else(|| format!("echo: {}", prompt)),
                detected_language: preferred_language.unwrap_or_default(),
                audio_base64: self.audio.clone(),
            })
        }
    }

    #[derive(Default)]
    struct NullSink {
        plays: Mutex<usize>,
    }

    impl AudioSink for NullSink {
        fn play(&self, _buffer: PcmBuffer) -> anyhow::Result<()> {
            *self.plays.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn app(audio: Option<&str>) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        app_with_reply(audio, None)
    }

    fn app_with_reply(
        audio: Option<&str>,
        reply: Option<String>,
    ) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::with_parts(
            TurnController::new(Language::Fr, VoiceCapture::unavailable()),
            Arc::new(EchoClient {
                audio: audio.map(str::to_string),
                reply,
            }),
            Arc::new(NullSink::default()),
            tx,
        );
        (app, rx)
    }

    async fn finish_turn(app: &mut App) {
        if let Some(task) = app.turn_task.as_ref() {
            while !task.is_finished() {
                tokio::task::yield_now().await;
            }
        }
        app.poll_turn().await;
    }

    #[test]
    fn test_char_to_byte_index() {
        assert_eq!(char_to_byte_index("résumé", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[tokio::test]
    async fn test_typed_message_round_trip() {
        let (mut app, _rx) = app(None);
        for c in "Bonjour".chars() {
            app.insert_char(c);
        }
        app.submit_input();
        assert!(app.input.is_empty());
        assert!(app.controller.is_sending());

        finish_turn(&mut app).await;
        assert!(app.turn_task.is_none());
        assert!(!app.controller.is_sending());

        let last = app.controller.conversation().last().unwrap();
        assert_eq!(last.sender, Sender::Bot);
        assert_eq!(last.parts, vec![MessagePart::text("echo: Bonjour")]);
    }

    #[tokio::test]
    async fn test_service_selection_sends_opening_prompt() {
        let (mut app, _rx) = app(Some("AAH/fw=="));
        app.service_down();
        app.select_service();
        assert_eq!(app.focus, FocusPane::Chat);

        finish_turn(&mut app).await;
        let last = app.controller.conversation().last().unwrap();
        // Service turns never carry audio
        assert!(!last.has_playable_audio());
        assert!(!app.controller.is_speaking());
    }

    #[tokio::test]
    async fn test_spoken_reply_is_played_and_released() {
        let (mut app, mut rx) = app(Some("AAH/fw=="));
        let request = app.controller.begin_submit("hello", true).unwrap();
        app.spawn_turn(request);
        finish_turn(&mut app).await;
        assert!(app.controller.is_speaking());

        loop {
            match rx.recv().await {
                Some(AppEvent::PlaybackEnded) => break,
                Some(_) => continue,
                None => panic!("event channel closed"),
            }
        }
        app.on_playback_ended();
        assert!(!app.controller.is_speaking());
    }

    #[test]
    fn test_voice_without_recognizer_alerts() {
        let (mut app, _rx) = app(None);
        app.toggle_voice();
        assert_eq!(app.alert.as_deref(), Some(i18n::speech_unavailable(Language::Fr)));
    }

    #[test]
    fn test_non_pdf_path_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let (mut app, _rx) = app(None);
        app.open_path_prompt(PathPurpose::Upload);
        app.path_prompt.as_mut().unwrap().input = path.display().to_string();
        app.confirm_path_prompt();

        assert_eq!(app.alert.as_deref(), Some(i18n::pdf_only(Language::Fr)));
        assert_eq!(app.controller.messages().len(), 1);
    }

    #[test]
    fn test_staged_pdf_dropped_on_edit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dao.pdf");
        std::fs::write(&path, b"%PDF-1.4\n").unwrap();

        let (mut app, _rx) = app(None);
        app.open_path_prompt(PathPurpose::Stage);
        app.path_prompt.as_mut().unwrap().input = path.display().to_string();
        app.confirm_path_prompt();
        assert_eq!(app.controller.staged_file().map(|f| f.file_name.as_str()), Some("dao.pdf"));

        app.insert_char('x');
        assert!(app.controller.staged_file().is_none());
    }

    #[tokio::test]
    async fn test_very_long_reply_pins_scroll_to_limit() {
        let (mut app, _rx) = app_with_reply(None, Some("ligne\n".repeat(70_000)));
        app.chat_width = 40;
        app.chat_height = 10;
        for c in "Bonjour".chars() {
            app.insert_char(c);
        }
        app.submit_input();
        finish_turn(&mut app).await;

        assert!(!app.controller.is_sending());
        assert_eq!(app.chat_scroll, u16::MAX);
    }

    #[tokio::test]
    async fn test_scroll_reaches_bottom_of_short_chat() {
        let (mut app, _rx) = app(None);
        app.chat_width = 40;
        app.chat_height = 3;
        app.scroll_chat_to_bottom();
        let welcome = app.chat_scroll;

        for c in "Bonjour".chars() {
            app.insert_char(c);
        }
        app.submit_input();
        finish_turn(&mut app).await;
        // user and bot messages each add a sender line, one text line and a blank line
        assert_eq!(app.chat_scroll, welcome + 6);
    }
}
