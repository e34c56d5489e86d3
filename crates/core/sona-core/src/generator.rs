//! The external generation capability boundary
//!
//! The core talks to every LLM backend through [`TextGenerator`]. A backend
//! may answer with a whole response object or a lazy stream of fragments;
//! [`collect_output`] is the single extraction routine tolerating both.

use crate::message::ChatMessage;
use crate::streaming::{collect_stream, TextStream};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Optional backend capability requested alongside a generation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolSpec {
    /// Ground the reply with a web search
    WebSearch,
}

/// Free-form generation parameters forwarded to the backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateParams {
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,

    /// Top P sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

/// One generation call: ordered messages plus per-call options
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Ordered role/content messages
    pub messages: Vec<ChatMessage>,

    /// Instruction/system text compiled for this turn
    pub instruction: Option<String>,

    /// Model identifier override
    pub model: Option<String>,

    /// Requested backend capabilities
    pub tools: Vec<ToolSpec>,

    /// Request incremental output
    pub stream: bool,

    /// Generation parameters
    pub params: GenerateParams,
}

impl GenerateRequest {
    /// Create a request carrying the given messages
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            instruction: None,
            model: None,
            tools: Vec::new(),
            stream: false,
            params: GenerateParams::default(),
        }
    }

    /// Attach instruction/system text
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Override the model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Request a backend capability
    pub fn with_tool(mut self, tool: ToolSpec) -> Self {
        self.tools.push(tool);
        self
    }

    /// Set the streaming flag
    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set the generation parameters
    pub fn with_params(mut self, params: GenerateParams) -> Self {
        self.params = params;
        self
    }
}

/// Message carried by a response choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceMessage {
    /// Extractable text content, if any
    pub content: Option<String>,
}

/// One response candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// The candidate's message
    pub message: ChoiceMessage,
}

/// Pre-materialized generation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Candidate choices in backend order
    pub choices: Vec<Choice>,
}

impl GenerateResponse {
    /// Build a single-choice response from plain text
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: ChoiceMessage {
                    content: Some(text.into()),
                },
            }],
        }
    }

    /// Text of the first choice; empty when the backend returned none
    pub fn first_text(&self) -> String {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}

/// Either a whole response or a lazy stream of fragments
#[derive(Debug)]
pub enum GenerationOutput {
    /// Whole response object
    Complete(GenerateResponse),
    /// Incremental fragments
    Stream(TextStream),
}

/// Uniform extraction: accumulate the full response text from either output
/// shape.
pub async fn collect_output(output: GenerationOutput) -> Result<String> {
    match output {
        GenerationOutput::Complete(response) => Ok(response.first_text()),
        GenerationOutput::Stream(stream) => collect_stream(stream).await,
    }
}

/// Boundary abstraction over any LLM backend.
///
/// Constructed once at process start and passed into the conversation
/// session explicitly; backend choice is a configuration-time decision.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend name for logs and diagnostics
    fn name(&self) -> &'static str;

    /// Run one generation call
    async fn generate(&self, request: GenerateRequest) -> Result<GenerationOutput>;
}
