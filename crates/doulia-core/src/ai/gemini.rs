use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::instruction::system_instruction;
use super::{Reply, ResponseClient};
use crate::config::Config;
use crate::error::ConverseError;
use crate::language::{detect_language, Language};
use crate::state::{AttachedFile, Message, Sender};

const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.9;
const TOP_K: u32 = 40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorStatus {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorStatus,
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    text_model: String,
    audio_model: String,
    voice_name: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.resolved_api_key(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
            text_model: config.text_model().to_string(),
            audio_model: config.audio_model().to_string(),
            voice_name: config.voice_name().to_string(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn model_for(&self, wants_audio: bool) -> &str {
        if wants_audio {
            &self.audio_model
        } else {
            &self.text_model
        }
    }

    fn build_request(
        &self,
        prompt: &str,
        history: &[Message],
        wants_audio: bool,
        file: Option<&AttachedFile>,
    ) -> GenerateRequest {
        let (response_modalities, speech_config) = if wants_audio {
            (
                Some(vec!["AUDIO".to_string()]),
                Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.voice_name.clone(),
                        },
                    },
                }),
            )
        } else {
            (None, None)
        };

        GenerateRequest {
            contents: build_contents(prompt, history, file),
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(system_instruction()),
                    inline_data: None,
                }],
            },
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                top_k: TOP_K,
                response_modalities,
                speech_config,
            },
        }
    }
}

/// Project the conversation into model turns, then append the current turn.
///
/// Only textual parts survive; files and audio from earlier turns are never
/// re-sent. A message with no textual part is dropped entirely.
fn build_contents(prompt: &str, history: &[Message], file: Option<&AttachedFile>) -> Vec<Content> {
    let mut contents: Vec<Content> = history
        .iter()
        .filter_map(|message| {
            let parts: Vec<Part> = message
                .parts
                .iter()
                .filter_map(|part| part.history_text())
                .map(|text| Part {
                    text: Some(text.to_string()),
                    inline_data: None,
                })
                .collect();

            if parts.is_empty() {
                return None;
            }

            let role = match message.sender {
                Sender::User => "user",
                Sender::Bot => "model",
            };
            Some(Content {
                role: Some(role.to_string()),
                parts,
            })
        })
        .collect();

    let mut current = Vec::new();
    if !prompt.trim().is_empty() {
        current.push(Part {
            text: Some(prompt.to_string()),
            inline_data: None,
        });
    }
    if let Some(file) = file {
        current.push(Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: file.mime_type.clone(),
                data: file.data.clone(),
            }),
        });
    }
    if !current.is_empty() {
        contents.push(Content {
            role: Some("user".to_string()),
            parts: current,
        });
    }

    contents
}

/// Text of the first candidate plus its first audio payload, if any.
fn parse_reply(response: GenerateResponse) -> (String, Option<String>) {
    let text = response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default();

    let audio = response
        .candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.inline_data.as_ref())
        .find(|data| data.mime_type.starts_with("audio/"))
        .map(|data| data.data.clone());

    (text, audio)
}

/// Map a non-success HTTP response onto a typed error.
///
/// Credential problems are recognised from the status code or the structured
/// Google error body, never from the wording of the message.
fn classify_error(status: u16, body: &str) -> ConverseError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();

    let message = envelope
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| body.chars().take(300).collect());

    let auth_status = envelope.as_ref().is_some_and(|e| {
        matches!(
            e.error.status.as_deref(),
            Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED")
        )
    });
    let invalid_key = envelope.as_ref().is_some_and(|e| {
        e.error
            .details
            .iter()
            .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
    });

    if matches!(status, 401 | 403) || auth_status || invalid_key {
        ConverseError::Configuration(message)
    } else {
        ConverseError::Service {
            status: Some(status),
            message,
        }
    }
}

#[async_trait]
impl ResponseClient for GeminiClient {
    async fn converse(
        &self,
        prompt: &str,
        history: &[Message],
        preferred_language: Option<Language>,
        wants_audio: bool,
        file: Option<&AttachedFile>,
    ) -> Result<Reply, ConverseError> {
        if prompt.trim().is_empty() && file.is_none() {
            return Err(ConverseError::EmptyRequest);
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ConverseError::Configuration("no API key configured".to_string()))?;

        let model = self.model_for(wants_audio);
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let request = self.build_request(prompt, history, wants_audio, file);

        info!(
            model,
            turns = request.contents.len(),
            wants_audio,
            attachment = file.map(|f| f.mime_type.as_str()),
            "Calling Gemini"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini HTTP request failed: {}", e);
                ConverseError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read Gemini response body: {}", e);
            ConverseError::Network(e.to_string())
        })?;

        if !status.is_success() {
            error!(status = %status, "Gemini API error: {}", body);
            return Err(classify_error(status.as_u16(), &body));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse Gemini response JSON: {}", e);
            ConverseError::Malformed(e.to_string())
        })?;

        let (text, audio_base64) = parse_reply(parsed);
        debug!(chars = text.len(), has_audio = audio_base64.is_some(), "Gemini replied");

        Ok(Reply {
            text,
            detected_language: preferred_language.unwrap_or_else(|| detect_language(prompt)),
            audio_base64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{MessagePart, PDF_MIME};
    use serde_json::json;

    fn client() -> GeminiClient {
        let mut config = Config::new();
        config.api_key = Some("test-key".to_string());
        GeminiClient::new(&config)
    }

    fn pdf() -> AttachedFile {
        AttachedFile::new("JVBERi0xLjQ=", PDF_MIME, "dao.pdf")
    }

    #[test]
    fn test_history_keeps_only_text_parts() {
        let history = vec![
            Message::bot(vec![MessagePart::text("Bonjour")]),
            Message::user(vec![MessagePart::file(&pdf())]),
            Message::user(vec![MessagePart::text("Résumez"), MessagePart::file(&pdf())]),
            Message::bot(vec![MessagePart::text("Voici"), MessagePart::audio("AAAA")]),
            Message::bot(vec![MessagePart::error("failure")]),
        ];

        let contents = build_contents("Merci", &history, None);
        let value = serde_json::to_value(&contents).unwrap();
        assert_eq!(
            value,
            json!([
                {"role": "model", "parts": [{"text": "Bonjour"}]},
                {"role": "user", "parts": [{"text": "Résumez"}]},
                {"role": "model", "parts": [{"text": "Voici"}]},
                {"role": "user", "parts": [{"text": "Merci"}]},
            ])
        );
    }

    #[test]
    fn test_file_only_turn_attaches_inline_data() {
        let contents = build_contents("", &[], Some(&pdf()));
        let value = serde_json::to_value(&contents).unwrap();
        assert_eq!(
            value,
            json!([
                {"role": "user", "parts": [{"inlineData": {"mimeType": "application/pdf", "data": "JVBERi0xLjQ="}}]},
            ])
        );
    }

    #[test]
    fn test_text_request_has_no_audio_config() {
        let request = client().build_request("Bonjour", &[], false, None);
        let value = serde_json::to_value(&request).unwrap();
        let generation = &value["generationConfig"];
        assert!((generation["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(generation["topK"], 40);
        assert!(generation.get("responseModalities").is_none());
        assert!(generation.get("speechConfig").is_none());
        assert!(value["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("DOULIA"));
        assert!(value["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn test_audio_request_uses_voice_and_audio_model() {
        let client = client();
        let request = client.build_request("Bonjour", &[], true, None);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["generationConfig"]["responseModalities"], json!(["AUDIO"]));
        assert_eq!(
            value["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Zephyr"
        );
        assert_eq!(client.model_for(true), "gemini-2.5-flash-preview-tts");
        assert_eq!(client.model_for(false), "gemini-3-flash-preview");
    }

    #[test]
    fn test_parse_reply_text_and_audio() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Voici "},
                        {"text": "la réponse."},
                        {"inlineData": {"mimeType": "audio/L16;codec=pcm;rate=24000", "data": "AAH/fw=="}}
                    ]
                }
            }]
        }))
        .unwrap();

        let (text, audio) = parse_reply(response);
        assert_eq!(text, "Voici la réponse.");
        assert_eq!(audio.as_deref(), Some("AAH/fw=="));
    }

    #[test]
    fn test_parse_reply_ignores_non_audio_inline_data() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "iVBO"}}]}
            }]
        }))
        .unwrap();

        let (text, audio) = parse_reply(response);
        assert_eq!(text, "");
        assert!(audio.is_none());
    }

    #[test]
    fn test_parse_reply_without_candidates() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(parse_reply(response), (String::new(), None));
    }

    #[test]
    fn test_classify_auth_status_codes() {
        assert!(classify_error(401, "").is_configuration());
        assert!(classify_error(403, "forbidden").is_configuration());
    }

    #[test]
    fn test_classify_invalid_key_body() {
        let body = json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "API_KEY_INVALID"}]
            }
        })
        .to_string();

        assert_eq!(
            classify_error(400, &body),
            ConverseError::Configuration("API key not valid. Please pass a valid API key.".to_string())
        );
    }

    #[test]
    fn test_classify_other_failures_as_service_errors() {
        let body = json!({"error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}})
            .to_string();
        assert_eq!(
            classify_error(503, &body),
            ConverseError::Service {
                status: Some(503),
                message: "The model is overloaded.".to_string()
            }
        );

        // Wording alone is not enough to call it a configuration problem
        assert!(!classify_error(500, "API key not valid").is_configuration());
    }

    #[tokio::test]
    async fn test_empty_request_rejected_before_network() {
        let err = client().converse("  ", &[], None, false, None).await.unwrap_err();
        assert_eq!(err, ConverseError::EmptyRequest);
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let mut config = Config::new();
        config.api_key = None;
        let client = GeminiClient {
            api_key: None,
            ..GeminiClient::new(&config)
        };
        let err = client.converse("Bonjour", &[], None, false, None).await.unwrap_err();
        assert!(err.is_configuration());
    }
}
