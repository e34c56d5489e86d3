//! Gemini transport for Sona
//!
//! Transport shape: no system role. The compiled instruction is folded into
//! the first user turn and assistant turns are tagged `model`. Web-search
//! grounding maps to the `google_search` tool.

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sona_core::streaming::text_stream;
use sona_core::{
    ContentPart, GenerateRequest, GenerateResponse, GenerationOutput, MessageContent, Result,
    Role, SonaConfig, SonaError, StreamHandler, TextGenerator, ToolSpec,
};
use std::sync::OnceLock;

/// Default model when neither the request nor the config names one
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Shared HTTP client for connection pooling
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

/// Get or initialize the shared HTTP client
fn http_client() -> Client {
    HTTP_CLIENT
        .get_or_init(|| {
            Client::builder()
                .pool_max_idle_per_host(50)
                .pool_idle_timeout(std::time::Duration::from_secs(300))
                .tcp_keepalive(std::time::Duration::from_secs(60))
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("failed to create HTTP client")
        })
        .clone()
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GeminiTool {
    google_search: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GeminiResponse {
    fn first_text(&self) -> String {
        self.candidates
            .as_ref()
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .concat()
            })
            .unwrap_or_default()
    }
}

/// Gemini-backed text generator
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGenerator {
    /// Create from the flat Sona configuration, using the shared pooled
    /// HTTP client.
    pub fn new(config: &SonaConfig) -> Self {
        let model = if config.model.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            config.model.clone()
        };

        Self {
            client: http_client(),
            api_key: config.api_key.clone(),
            model,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    /// Override the endpoint base URL (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Map the request into Gemini contents. System text has no role of its
    /// own here, so the instruction is prepended to the first user turn (or
    /// becomes one when the request carries no user entry).
    fn build_contents(request: &GenerateRequest) -> Vec<GeminiContent> {
        let mut contents: Vec<GeminiContent> = Vec::with_capacity(request.messages.len() + 1);

        for message in &request.messages {
            let role = match message.role {
                Role::Assistant | Role::Model => "model",
                // System entries are stripped upstream; anything left rides
                // as user text.
                Role::User | Role::System => "user",
            };
            contents.push(GeminiContent {
                role: role.to_string(),
                parts: to_parts(&message.content),
            });
        }

        if let Some(instruction) = &request.instruction {
            match contents.iter_mut().find(|content| content.role == "user") {
                Some(first_user) => {
                    first_user.parts.insert(
                        0,
                        GeminiPart {
                            text: Some(format!("{instruction}\n\n")),
                        },
                    );
                }
                None => {
                    contents.insert(
                        0,
                        GeminiContent {
                            role: "user".to_string(),
                            parts: vec![GeminiPart {
                                text: Some(instruction.clone()),
                            }],
                        },
                    );
                }
            }
        }

        contents
    }

    fn build_body(request: &GenerateRequest) -> GeminiRequest {
        let generation_config = if request.params.temperature.is_some()
            || request.params.max_tokens.is_some()
            || request.params.top_p.is_some()
        {
            Some(GenerationConfig {
                temperature: request.params.temperature,
                max_output_tokens: request.params.max_tokens,
                top_p: request.params.top_p,
            })
        } else {
            None
        };

        GeminiRequest {
            contents: Self::build_contents(request),
            tools: if request.tools.contains(&ToolSpec::WebSearch) {
                Some(vec![GeminiTool {
                    google_search: serde_json::json!({}),
                }])
            } else {
                None
            },
            generation_config,
        }
    }

    async fn generate_whole(&self, model: &str, body: GeminiRequest) -> Result<GenerationOutput> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SonaError::generation(format!("gemini request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(SonaError::generation(format!(
                "gemini API error ({status}): {detail}"
            )));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| SonaError::generation(format!("gemini reply was not valid JSON: {e}")))?;

        Ok(GenerationOutput::Complete(GenerateResponse::from_text(
            parsed.first_text(),
        )))
    }

    async fn generate_stream(&self, model: &str, body: GeminiRequest) -> Result<GenerationOutput> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, model, self.api_key
        );

        let mut response = self
            .client
            .post(&url)
            .header("accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| SonaError::generation(format!("gemini stream failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(SonaError::generation(format!(
                "gemini API error ({status}): {detail}"
            )));
        }

        let (sender, receiver) = text_stream(32);
        tokio::spawn(async move {
            let handler = StreamHandler::new(sender);
            let mut buffer = String::new();

            loop {
                let chunk = match response.chunk().await {
                    Ok(Some(chunk)) => chunk,
                    Ok(None) => break,
                    Err(e) => {
                        let _ = handler
                            .fail(SonaError::generation(format!("gemini stream failed: {e}")))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                let mut pieces = Vec::new();
                let data = std::mem::take(&mut buffer);
                {
                    let mut lines: Vec<&str> = data.split('\n').collect();
                    let tail = lines.pop().unwrap_or("");
                    for line in &lines {
                        if let Some(text) = sse_delta(line) {
                            pieces.push(text);
                        }
                    }
                    buffer = tail.to_string();
                }

                for piece in pieces {
                    if handler.send(piece).await.is_err() {
                        return;
                    }
                }
            }

            if let Some(text) = sse_delta(&std::mem::take(&mut buffer)) {
                let _ = handler.send(text).await;
            }
            let _ = handler.finish("").await;
        });

        Ok(GenerationOutput::Stream(receiver))
    }
}

/// Extract the incremental text from one SSE line, if it carries any
fn sse_delta(line: &str) -> Option<String> {
    let payload = line.trim().strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }

    let json: serde_json::Value = serde_json::from_str(payload).ok()?;
    json.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(|text| text.to_string())
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerationOutput> {
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let body = Self::build_body(&request);

        if request.stream {
            self.generate_stream(&model, body).await
        } else {
            self.generate_whole(&model, body).await
        }
    }
}

fn to_parts(content: &MessageContent) -> Vec<GeminiPart> {
    match content {
        MessageContent::Text(text) => vec![GeminiPart {
            text: Some(text.clone()),
        }],
        MessageContent::Parts(parts) => parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(GeminiPart {
                    text: Some(text.clone()),
                }),
                ContentPart::ImageUrl { .. } => {
                    tracing::debug!("gemini transport skips image parts");
                    None
                }
            })
            .collect(),
    }
}
