//! OpenAI-style chat transport for Sona
//!
//! Transport shape: flat role list with a distinguished `system` role. The
//! compiled instruction is always placed first as the only system message;
//! history arrives pre-normalized from the core.

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs, ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use sona_core::streaming::text_stream;
use sona_core::{
    ChatMessage, Choice, ChoiceMessage, ContentPart, GenerateRequest, GenerateResponse,
    GenerationOutput, MessageContent, Result, Role, SonaConfig, SonaError, StreamHandler,
    TextGenerator,
};

/// Default model when neither the request nor the config names one
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI-backed text generator
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGenerator {
    /// Create from the flat Sona configuration
    pub fn new(config: &SonaConfig) -> Self {
        let mut openai_config = OpenAIConfig::new();
        if !config.api_key.is_empty() {
            openai_config = openai_config.with_api_key(config.api_key.clone());
        }
        let model = if config.model.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            config.model.clone()
        };

        Self {
            client: Client::with_config(openai_config),
            model,
        }
    }

    fn build_messages(request: &GenerateRequest) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        // The compiled instruction is the single system message, placed first.
        if let Some(instruction) = &request.instruction {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(instruction.clone())
                    .build()
                    .map_err(|e| SonaError::generation(e.to_string()))?,
            ));
        }

        for message in &request.messages {
            messages.push(to_openai_message(message)?);
        }

        Ok(messages)
    }
}

fn to_openai_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    match message.role {
        Role::Assistant | Role::Model => Ok(ChatCompletionRequestMessage::Assistant(
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(message.text())
                .build()
                .map_err(|e| SonaError::generation(e.to_string()))?,
        )),
        Role::System => Ok(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(message.text())
                .build()
                .map_err(|e| SonaError::generation(e.to_string()))?,
        )),
        Role::User => {
            let content = match &message.content {
                MessageContent::Text(text) => {
                    ChatCompletionRequestUserMessageContent::Text(text.clone())
                }
                MessageContent::Parts(parts) => {
                    let mut converted = Vec::with_capacity(parts.len());
                    for part in parts {
                        match part {
                            ContentPart::Text { text } => converted.push(
                                ChatCompletionRequestMessageContentPartTextArgs::default()
                                    .text(text.clone())
                                    .build()
                                    .map_err(|e| SonaError::generation(e.to_string()))?
                                    .into(),
                            ),
                            ContentPart::ImageUrl { url } => converted.push(
                                ChatCompletionRequestMessageContentPartImageArgs::default()
                                    .image_url(
                                        ImageUrlArgs::default()
                                            .url(url.clone())
                                            .build()
                                            .map_err(|e| SonaError::generation(e.to_string()))?,
                                    )
                                    .build()
                                    .map_err(|e| SonaError::generation(e.to_string()))?
                                    .into(),
                            ),
                        }
                    }
                    ChatCompletionRequestUserMessageContent::Array(converted)
                }
            };

            Ok(ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(content)
                    .build()
                    .map_err(|e| SonaError::generation(e.to_string()))?,
            ))
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerationOutput> {
        if !request.tools.is_empty() {
            tracing::debug!("openai transport has no grounding tools, ignoring {:?}", request.tools);
        }

        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let messages = Self::build_messages(&request)?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(model).messages(messages);
        if let Some(temperature) = request.params.temperature {
            builder.temperature(temperature);
        }
        if let Some(max_tokens) = request.params.max_tokens {
            builder.max_tokens(max_tokens as u32);
        }
        if let Some(top_p) = request.params.top_p {
            builder.top_p(top_p);
        }

        if request.stream {
            builder.stream(true);
            let chat_request = builder
                .build()
                .map_err(|e| SonaError::generation(e.to_string()))?;

            let mut stream = self
                .client
                .chat()
                .create_stream(chat_request)
                .await
                .map_err(|e| SonaError::generation(format!("openai stream failed: {e}")))?;

            let (sender, receiver) = text_stream(32);
            tokio::spawn(async move {
                let handler = StreamHandler::new(sender);
                while let Some(chunk) = stream.next().await {
                    match chunk {
                        Ok(response) => {
                            if let Some(content) = response
                                .choices
                                .first()
                                .and_then(|choice| choice.delta.content.as_deref())
                            {
                                if handler.send(content).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            let _ = handler
                                .fail(SonaError::generation(format!("openai stream failed: {e}")))
                                .await;
                            return;
                        }
                    }
                }
                let _ = handler.finish("").await;
            });

            Ok(GenerationOutput::Stream(receiver))
        } else {
            let chat_request = builder
                .build()
                .map_err(|e| SonaError::generation(e.to_string()))?;

            let response = self
                .client
                .chat()
                .create(chat_request)
                .await
                .map_err(|e| SonaError::generation(format!("openai request failed: {e}")))?;

            let choices = response
                .choices
                .into_iter()
                .map(|choice| Choice {
                    message: ChoiceMessage {
                        content: choice.message.content,
                    },
                })
                .collect();

            Ok(GenerationOutput::Complete(GenerateResponse { choices }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SonaConfig {
        SonaConfig {
            provider: "openai".to_string(),
            model: String::new(),
            api_key: "test-key".to_string(),
            temperature: None,
        }
    }

    #[test]
    fn test_generator_defaults_model() {
        let generator = OpenAiGenerator::new(&test_config());
        assert_eq!(generator.model, DEFAULT_MODEL);
        assert_eq!(generator.name(), "openai");
    }

    #[test]
    fn test_instruction_becomes_first_system_message() {
        let request = GenerateRequest::new(vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ])
        .with_instruction("stay in character");

        let messages = OpenAiGenerator::build_messages(&request).unwrap();
        assert_eq!(messages.len(), 3);
        assert!(matches!(
            messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(
            messages[2],
            ChatCompletionRequestMessage::Assistant(_)
        ));
    }

    #[test]
    fn test_legacy_model_role_maps_to_assistant() {
        let request = GenerateRequest::new(vec![ChatMessage {
            role: Role::Model,
            content: sona_core::MessageContent::Text("legacy".to_string()),
        }]);

        let messages = OpenAiGenerator::build_messages(&request).unwrap();
        assert!(matches!(
            messages[0],
            ChatCompletionRequestMessage::Assistant(_)
        ));
    }

    #[test]
    fn test_multimodal_user_content_becomes_parts() {
        let request = GenerateRequest::new(vec![ChatMessage::user_with_images(
            "what is this",
            &["https://example.com/a.png".to_string()],
        )]);

        let messages = OpenAiGenerator::build_messages(&request).unwrap();
        match &messages[0] {
            ChatCompletionRequestMessage::User(user) => match &user.content {
                ChatCompletionRequestUserMessageContent::Array(parts) => {
                    assert_eq!(parts.len(), 2)
                }
                ChatCompletionRequestUserMessageContent::Text(_) => panic!("expected parts"),
            },
            other => panic!("expected user message, got {other:?}"),
        }
    }
}
