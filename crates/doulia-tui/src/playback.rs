use std::sync::Arc;

use anyhow::Result;
use doulia_core::audio::{decode_reply_audio, PcmBuffer};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::tui::AppEvent;

/// The audio output device.
pub trait AudioSink: Send + Sync {
    /// Blocks until the buffer has finished playing.
    fn play(&self, buffer: PcmBuffer) -> Result<()>;
}

#[cfg(feature = "playback")]
pub struct RodioSink;

#[cfg(feature = "playback")]
impl AudioSink for RodioSink {
    fn play(&self, buffer: PcmBuffer) -> Result<()> {
        use rodio::{buffer::SamplesBuffer, OutputStreamBuilder, Sink};

        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| anyhow::anyhow!("Audio device initialization failed: {}", e))?;
        let sink = Sink::connect_new(stream.mixer());

        sink.append(SamplesBuffer::new(
            buffer.channel_count(),
            buffer.sample_rate(),
            buffer.interleaved(),
        ));
        sink.sleep_until_end();
        Ok(())
    }
}

/// Used when the binary is built without the `playback` feature.
pub struct SilentSink;

impl AudioSink for SilentSink {
    fn play(&self, buffer: PcmBuffer) -> Result<()> {
        info!(
            duration_ms = buffer.duration().as_millis() as u64,
            "Audio playback not compiled in, skipping spoken reply"
        );
        Ok(())
    }
}

pub fn default_sink() -> Arc<dyn AudioSink> {
    #[cfg(feature = "playback")]
    {
        Arc::new(RodioSink)
    }
    #[cfg(not(feature = "playback"))]
    {
        Arc::new(SilentSink)
    }
}

/// Decode and play a reply on a blocking thread, then report `PlaybackEnded`.
/// Decode and device failures are logged and still end playback.
pub fn spawn_playback(sink: Arc<dyn AudioSink>, audio_base64: String, events: UnboundedSender<AppEvent>) {
    tokio::task::spawn_blocking(move || {
        match decode_reply_audio(&audio_base64) {
            Ok(buffer) => {
                debug!(frames = buffer.frame_count(), "Playing spoken reply");
                if let Err(e) = sink.play(buffer) {
                    warn!("Audio playback failed: {:#}", e);
                }
            }
            Err(e) => warn!("Could not decode reply audio: {}", e),
        }
        let _ = events.send(AppEvent::PlaybackEnded);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct RecordingSink {
        played: Mutex<Vec<usize>>,
    }

    impl AudioSink for RecordingSink {
        fn play(&self, buffer: PcmBuffer) -> Result<()> {
            self.played.lock().unwrap().push(buffer.frame_count());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_playback_reports_end() {
        let sink = Arc::new(RecordingSink::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        spawn_playback(sink.clone(), "AAH/fw==".to_string(), tx);

        assert!(matches!(rx.recv().await, Some(AppEvent::PlaybackEnded)));
        assert_eq!(*sink.played.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_undecodable_audio_still_ends_playback() {
        let sink = Arc::new(RecordingSink::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Three bytes is not a whole number of 16-bit samples
        spawn_playback(sink.clone(), "AAEC".to_string(), tx);

        assert!(matches!(rx.recv().await, Some(AppEvent::PlaybackEnded)));
        assert!(sink.played.lock().unwrap().is_empty());
    }

    #[test]
    fn test_silent_sink_accepts_audio() {
        let buffer = decode_reply_audio("AAH/fw==").unwrap();
        assert!(SilentSink.play(buffer).is_ok());
    }
}
