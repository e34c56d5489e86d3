//! Streamed generation support
//!
//! Providers push incremental text fragments into a bounded channel; the
//! consumer side is a finite, forward-only sequence whose concatenation
//! reconstructs the full reply.

use crate::{Result, SonaError};
use tokio::sync::mpsc;

/// One incremental fragment of generated text
#[derive(Debug, Clone)]
pub struct TextChunk {
    /// Fragment text
    pub text: String,
    /// Set on the last fragment of the stream
    pub is_final: bool,
}

/// Finite, forward-only sequence of text fragments
pub type TextStream = mpsc::Receiver<Result<TextChunk>>;

/// Producer half of a text stream
pub type TextStreamSender = mpsc::Sender<Result<TextChunk>>;

/// Create a bounded text stream
pub fn text_stream(buffer: usize) -> (TextStreamSender, TextStream) {
    mpsc::channel(buffer)
}

/// Producer convenience wrapper used by providers
pub struct StreamHandler {
    sender: TextStreamSender,
}

impl StreamHandler {
    /// Wrap a stream sender
    pub fn new(sender: TextStreamSender) -> Self {
        Self { sender }
    }

    /// Push one fragment
    pub async fn send(&self, text: impl Into<String>) -> Result<()> {
        self.push(text.into(), false).await
    }

    /// Push the final fragment and close the stream
    pub async fn finish(&self, text: impl Into<String>) -> Result<()> {
        self.push(text.into(), true).await
    }

    /// Fail the stream
    pub async fn fail(&self, error: SonaError) -> Result<()> {
        self.sender
            .send(Err(error))
            .await
            .map_err(|e| SonaError::other(format!("stream receiver dropped: {e}")))
    }

    async fn push(&self, text: String, is_final: bool) -> Result<()> {
        self.sender
            .send(Ok(TextChunk { text, is_final }))
            .await
            .map_err(|e| SonaError::other(format!("stream receiver dropped: {e}")))
    }
}

/// Drain a stream, concatenating every fragment into the full response text
pub async fn collect_stream(mut stream: TextStream) -> Result<String> {
    let mut text = String::new();

    while let Some(chunk) = stream.recv().await {
        let chunk = chunk?;
        text.push_str(&chunk.text);
        if chunk.is_final {
            break;
        }
    }

    Ok(text)
}
