//! Speech recognition through an external command.
//!
//! The command is started with the locale tag as its last argument and
//! reports on stdout, one event per line:
//!
//! ```text
//! partial <text>
//! final <text>
//! error <code>
//! ```
//!
//! The session ends when the process exits or is stopped.

use std::process::Stdio;

use anyhow::{anyhow, Context, Result};
use doulia_core::voice::{RecognitionEvent, SpeechErrorKind, SpeechRecognizer, TranscriptSegment};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::{mpsc::UnboundedSender, oneshot};
use tracing::{debug, info, warn};

use crate::tui::AppEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
enum RecognizerLine {
    Partial(String),
    Final(String),
    Error(String),
}

fn parse_line(line: &str) -> Option<RecognizerLine> {
    let line = line.trim_end();
    let (kind, rest) = line.split_once(' ').unwrap_or((line, ""));
    match kind {
        "partial" => Some(RecognizerLine::Partial(rest.to_string())),
        "final" => Some(RecognizerLine::Final(rest.to_string())),
        "error" => Some(RecognizerLine::Error(rest.trim().to_string())),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopMode {
    Finish,
    Abort,
}

pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    events: UnboundedSender<AppEvent>,
    stop_tx: Option<oneshot::Sender<StopMode>>,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<String>, args: Vec<String>, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            program: program.into(),
            args,
            events,
            stop_tx: None,
        }
    }

    /// Build from a whitespace-separated command line, e.g. `"vosk-transcribe --stream"`.
    pub fn from_command_line(command_line: &str, events: UnboundedSender<AppEvent>) -> Option<Self> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self::new(program, words.collect(), events))
    }

    fn signal(&mut self, mode: StopMode) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(mode);
        }
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn start(&mut self, locale: &str) -> Result<()> {
        // A previous session that is still winding down gets cut off
        self.signal(StopMode::Abort);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(locale)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Could not start speech recognizer '{}'", self.program))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("Speech recognizer has no stdout"))?;

        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_tx = Some(stop_tx);
        info!(program = %self.program, locale, "Speech recognizer started");

        tokio::spawn(run_session(child, stdout, stop_rx, self.events.clone()));
        Ok(())
    }

    fn stop(&mut self) {
        self.signal(StopMode::Finish);
    }

    fn abort(&mut self) {
        self.signal(StopMode::Abort);
    }
}

async fn run_session(
    mut child: Child,
    stdout: ChildStdout,
    mut stop_rx: oneshot::Receiver<StopMode>,
    events: UnboundedSender<AppEvent>,
) {
    let send = |event: RecognitionEvent| {
        let _ = events.send(AppEvent::Speech(event));
    };

    send(RecognitionEvent::Started);

    let mut lines = BufReader::new(stdout).lines();
    let mut results: Vec<TranscriptSegment> = Vec::new();
    let mut report_end = true;

    loop {
        tokio::select! {
            mode = &mut stop_rx => {
                // A dropped sender means the recognizer itself went away
                report_end = matches!(mode, Ok(StopMode::Finish));
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => match parse_line(&line) {
                    Some(RecognizerLine::Partial(text)) => {
                        if results.last().is_some_and(|s| !s.is_final) {
                            results.pop();
                        }
                        results.push(TranscriptSegment::interim(text));
                        send(RecognitionEvent::Result { result_index: 0, results: results.clone() });
                    }
                    Some(RecognizerLine::Final(text)) => {
                        if results.last().is_some_and(|s| !s.is_final) {
                            results.pop();
                        }
                        results.push(TranscriptSegment::final_(text));
                        send(RecognitionEvent::Result { result_index: 0, results: results.clone() });
                    }
                    Some(RecognizerLine::Error(code)) => {
                        send(RecognitionEvent::Error(SpeechErrorKind::from_code(&code)));
                        report_end = false;
                        break;
                    }
                    None => debug!(line = %line, "Ignoring recognizer output"),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("Could not read speech recognizer output: {}", e);
                    break;
                }
            }
        }
    }

    let _ = child.kill().await;
    let _ = child.wait().await;

    if report_end {
        send(RecognitionEvent::End);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("partial bonjour je"),
            Some(RecognizerLine::Partial("bonjour je".to_string()))
        );
        assert_eq!(
            parse_line("final bonjour je voudrais un audit\n"),
            Some(RecognizerLine::Final("bonjour je voudrais un audit".to_string()))
        );
        assert_eq!(
            parse_line("error no-speech"),
            Some(RecognizerLine::Error("no-speech".to_string()))
        );
        assert_eq!(parse_line("loading model..."), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn test_from_command_line() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let recognizer = CommandRecognizer::from_command_line("vosk-transcribe --stream", tx.clone()).unwrap();
        assert_eq!(recognizer.program, "vosk-transcribe");
        assert_eq!(recognizer.args, vec!["--stream".to_string()]);
        assert!(CommandRecognizer::from_command_line("   ", tx).is_none());
    }

    async fn next_speech(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> RecognitionEvent {
        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(AppEvent::Speech(event))) => event,
            other => panic!("expected a speech event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_session_reports_transcripts_then_end() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let script = "[ \"$1\" = fr-FR ] || exit 1; printf 'partial bon\\nfinal bonjour\\n'";
        let mut recognizer = CommandRecognizer::new(
            "sh",
            vec!["-c".to_string(), script.to_string(), "recognizer".to_string()],
            tx,
        );

        recognizer.start("fr-FR").unwrap();

        assert_eq!(next_speech(&mut rx).await, RecognitionEvent::Started);
        assert_eq!(
            next_speech(&mut rx).await,
            RecognitionEvent::Result {
                result_index: 0,
                results: vec![TranscriptSegment::interim("bon")],
            }
        );
        assert_eq!(
            next_speech(&mut rx).await,
            RecognitionEvent::Result {
                result_index: 0,
                results: vec![TranscriptSegment::final_("bonjour")],
            }
        );
        assert_eq!(next_speech(&mut rx).await, RecognitionEvent::End);
    }

    #[tokio::test]
    async fn test_error_line_ends_without_end_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut recognizer = CommandRecognizer::new(
            "sh",
            vec!["-c".to_string(), "echo 'error not-allowed'".to_string(), "recognizer".to_string()],
            tx,
        );

        recognizer.start("en-US").unwrap();

        assert_eq!(next_speech(&mut rx).await, RecognitionEvent::Started);
        assert_eq!(
            next_speech(&mut rx).await,
            RecognitionEvent::Error(SpeechErrorKind::NotAllowed)
        );
        // The sender is gone once the session task finishes
        drop(recognizer);
        assert!(tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .map(|event| event.is_none())
            .unwrap_or(false));
    }

    #[test]
    fn test_missing_program_fails_to_start() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let _guard = runtime.enter();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut recognizer = CommandRecognizer::new("doulia-no-such-recognizer", Vec::new(), tx);
        assert!(recognizer.start("fr-FR").is_err());
    }
}
