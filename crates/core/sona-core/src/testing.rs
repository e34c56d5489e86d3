//! Test doubles for the generation capability
//!
//! Used by the crate's own tests and by downstream crates that need a
//! deterministic backend.

use crate::generator::{GenerateRequest, GenerateResponse, GenerationOutput, TextGenerator};
use crate::streaming::{text_stream, StreamHandler};
use crate::{Result, SonaError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One canned reply held by a [`ScriptedGenerator`]
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Whole-text response
    Text(String),
    /// Streamed response delivered as the given fragments
    Chunks(Vec<String>),
    /// Generation failure
    Error(String),
}

/// Generator double that replays canned replies in order and records every
/// request it receives. Running out of replies produces a generation error,
/// which best-effort callers are expected to swallow.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedGenerator {
    /// Create an empty double; queue replies with the `push_*` methods
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a sequence of whole-text replies
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::new();
        for reply in replies {
            generator.push_text(reply);
        }
        generator
    }

    /// Queue a whole-text reply
    pub fn push_text(&self, text: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Text(text.into()));
    }

    /// Queue a streamed reply delivered as the given fragments
    pub fn push_chunks<I, S>(&self, chunks: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies.lock().unwrap().push_back(ScriptedReply::Chunks(
            chunks.into_iter().map(Into::into).collect(),
        ));
    }

    /// Queue a generation failure
    pub fn push_error(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Error(message.into()));
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerationOutput> {
        self.requests.lock().unwrap().push(request);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SonaError::generation("scripted generator ran out of replies"))?;

        match reply {
            ScriptedReply::Text(text) => {
                Ok(GenerationOutput::Complete(GenerateResponse::from_text(text)))
            }
            ScriptedReply::Chunks(chunks) => {
                let (sender, stream) = text_stream(chunks.len().max(1));
                tokio::spawn(async move {
                    let handler = StreamHandler::new(sender);
                    let last = chunks.len().saturating_sub(1);
                    for (index, chunk) in chunks.into_iter().enumerate() {
                        let sent = if index == last {
                            handler.finish(chunk).await
                        } else {
                            handler.send(chunk).await
                        };
                        if sent.is_err() {
                            break;
                        }
                    }
                });
                Ok(GenerationOutput::Stream(stream))
            }
            ScriptedReply::Error(message) => Err(SonaError::generation(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::collect_output;
    use crate::message::ChatMessage;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let generator = ScriptedGenerator::with_replies(["first", "second"]);

        let one = generator
            .generate(GenerateRequest::new(vec![ChatMessage::user("a")]))
            .await
            .unwrap();
        assert_eq!(collect_output(one).await.unwrap(), "first");

        let two = generator
            .generate(GenerateRequest::new(vec![ChatMessage::user("b")]))
            .await
            .unwrap();
        assert_eq!(collect_output(two).await.unwrap(), "second");

        assert_eq!(generator.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_chunks() {
        let generator = ScriptedGenerator::new();
        generator.push_chunks(["one ", "two ", "three"]);

        let output = generator
            .generate(GenerateRequest::new(vec![]))
            .await
            .unwrap();
        assert_eq!(collect_output(output).await.unwrap(), "one two three");
    }

    #[tokio::test]
    async fn test_exhausted_script_errors() {
        let generator = ScriptedGenerator::new();
        let err = generator
            .generate(GenerateRequest::new(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, SonaError::Generation(_)));
    }
}
