//! Client for a Gemini-compatible `generateContent` endpoint

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{PhraseGenerator, SpeechGenerator, SpeechPayload};
use crate::config::ApiConfig;
use crate::{Error, Result};

/// Generates phrases and speech through the hosted model API
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
    text_model: String,
    tts_model: String,
    voice: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("tts_model", &self.tts_model)
            .field("voice", &self.voice)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client from API configuration and a prebuilt voice name
    #[must_use]
    pub fn new(api: &ApiConfig, voice: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api
                .key
                .as_ref()
                .map(|k| SecretString::from(k.expose_secret().to_owned())),
            base_url: api.base_url.clone(),
            text_model: api.text_model.clone(),
            tts_model: api.tts_model.clone(),
            voice: voice.to_string(),
        }
    }

    /// Whether a credential is available for requests
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest<'_>,
    ) -> Result<GenerateContentResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| Error::Config("API key not configured".to_string()))?;

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key.expose_secret())
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("{model} error {status}: {body}")));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl PhraseGenerator for GeminiClient {
    async fn generate_phrases(&self, prompt: &str) -> Result<Vec<String>> {
        let request = GenerateContentRequest {
            contents: vec![Content::text(prompt)],
            generation_config: GenerationConfig {
                response_mime_type: Some("application/json"),
                response_schema: Some(serde_json::json!({
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                })),
                ..GenerationConfig::default()
            },
        };

        let response = self.generate_content(&self.text_model, &request).await?;
        let text = response
            .text()
            .ok_or_else(|| Error::Generation("response contained no text".to_string()))?;

        let phrases = parse_phrase_list(&text)?;
        tracing::debug!(count = phrases.len(), model = %self.text_model, "phrases generated");
        Ok(phrases)
    }
}

#[async_trait]
impl SpeechGenerator for GeminiClient {
    async fn generate_speech(&self, text: &str) -> Result<SpeechPayload> {
        let request = GenerateContentRequest {
            contents: vec![Content::text(text)],
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["AUDIO"]),
                speech_config: Some(SpeechConfigBody {
                    voice_config: VoiceConfigBody {
                        prebuilt_voice_config: PrebuiltVoice {
                            voice_name: &self.voice,
                        },
                    },
                }),
                ..GenerationConfig::default()
            },
        };

        let response = self.generate_content(&self.tts_model, &request).await?;
        let payload = response
            .audio()
            .ok_or_else(|| Error::Tts("no audio data received".to_string()))?;

        tracing::debug!(
            encoded_len = payload.data.len(),
            mime_type = ?payload.mime_type,
            voice = %self.voice,
            "speech generated"
        );
        Ok(payload)
    }
}

/// Parse a JSON array of strings returned as model text
///
/// Blank entries are dropped. Anything other than a string array is an error.
///
/// # Errors
///
/// Returns error if the text is not a JSON array of strings
pub fn parse_phrase_list(text: &str) -> Result<Vec<String>> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);

    let phrases: Vec<String> = serde_json::from_str(body.trim())?;
    Ok(phrases
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect())
}

// ── API request/response types ─────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

impl<'a> Content<'a> {
    fn text(text: &'a str) -> Self {
        Self {
            parts: vec![RequestPart { text }],
        }
    }
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfigBody<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfigBody<'a> {
    voice_config: VoiceConfigBody<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfigBody<'a> {
    prebuilt_voice_config: PrebuiltVoice<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoice<'a> {
    voice_name: &'a str,
}

// Every field is optional: the response is untrusted and validated on use.

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: Option<String>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated text of the first candidate
    fn text(&self) -> Option<String> {
        let text: String = self
            .first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }

    /// First non-empty inline audio blob of the first candidate
    fn audio(&self) -> Option<SpeechPayload> {
        self.first_parts().iter().find_map(|p| {
            let inline = p.inline_data.as_ref()?;
            let data = inline.data.as_ref().filter(|d| !d.is_empty())?;
            Some(SpeechPayload {
                data: data.clone(),
                mime_type: inline.mime_type.clone(),
            })
        })
    }
}
