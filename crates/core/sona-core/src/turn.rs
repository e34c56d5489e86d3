//! Conversation turn orchestration
//!
//! A session drives one persona through request/response exchanges against
//! an injected generation backend. Each turn compiles the instruction from
//! the persona's *current* state, so a changing mood reframes future turns
//! without rewriting past ones.

use crate::compiler;
use crate::generator::{collect_output, GenerateParams, GenerateRequest, TextGenerator};
use crate::history::ConversationHistory;
use crate::init::strip_code_fences;
use crate::message::ChatMessage;
use crate::persona::Persona;
use crate::{Result, SonaError};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Bound applied to AI-supplied mood deltas before they touch the state
const MAX_AI_DELTA: f32 = 0.5;

/// Shape of the JSON object the mood-update prompt asks for
#[derive(Debug, Deserialize)]
struct MoodDeltas {
    #[serde(default)]
    pleasure: f32,
    #[serde(default)]
    arousal: f32,
    #[serde(default)]
    dominance: f32,
}

/// One persona, its history, and the backend it talks through.
///
/// Not safe for concurrent turns: persona state and history are mutated in
/// place. Callers serialize turns per session.
pub struct ConversationSession {
    /// Session id used in log output
    pub id: Uuid,
    /// The persona being role-played
    pub persona: Persona,
    /// Persisted turn history (user/assistant entries only)
    pub history: ConversationHistory,
    generator: Arc<dyn TextGenerator>,
    params: GenerateParams,
}

impl ConversationSession {
    /// Create a session around an explicitly injected generator
    pub fn new(persona: Persona, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            id: Uuid::new_v4(),
            persona,
            history: ConversationHistory::new(),
            generator,
            params: GenerateParams::default(),
        }
    }

    /// Set the generation parameters used on every turn
    pub fn with_params(mut self, params: GenerateParams) -> Self {
        self.params = params;
        self
    }

    /// Run one exchange: compile the instruction from current persona state,
    /// send it with the normalized history plus the new input, fold the
    /// reply back into history, and return the full response text.
    ///
    /// Whitespace-only input yields [`SonaError::EmptyInput`] with no state
    /// change. A failed generation call is surfaced with context; history is
    /// left untouched in that case.
    pub async fn take_turn(&mut self, user_input: &str) -> Result<String> {
        if user_input.trim().is_empty() {
            return Err(SonaError::EmptyInput);
        }

        let instruction = compiler::compiled_instruction(&self.persona, user_input)?;

        let mut messages = self.history.normalized();
        messages.push(ChatMessage::user(user_input));

        tracing::debug!(
            session = %self.id,
            persona = %self.persona.name,
            backend = self.generator.name(),
            history_len = messages.len(),
            "sending turn"
        );

        let request = GenerateRequest::new(messages)
            .with_instruction(instruction)
            .with_params(self.params.clone())
            .streaming(true);

        let output = self
            .generator
            .generate(request)
            .await
            .map_err(|e| SonaError::generation(format!("turn failed: {e}")))?;
        let response = collect_output(output)
            .await
            .map_err(|e| SonaError::generation(format!("turn failed mid-stream: {e}")))?;

        self.history.push(ChatMessage::user(user_input));
        self.history.push(ChatMessage::assistant(response.clone()));

        Ok(response)
    }

    /// Ask the backend how the exchange shifts the persona's mood and apply
    /// the bounded deltas. Strictly best-effort: every failure is logged at
    /// debug level and swallowed; the turn that already succeeded is never
    /// affected.
    pub async fn update_mood_via_ai(&mut self, user_input: &str, response: &str) {
        match self.request_mood_deltas(user_input, response).await {
            Ok((d_pleasure, d_arousal, d_dominance)) => {
                self.persona.mood.update(d_pleasure, d_arousal, d_dominance);
                tracing::debug!(
                    session = %self.id,
                    mood = %self.persona.mood.label(),
                    "mood updated via model: ({d_pleasure:.2}, {d_arousal:.2}, {d_dominance:.2})"
                );
            }
            Err(e) => {
                tracing::debug!(session = %self.id, "mood update skipped: {e}");
            }
        }
    }

    async fn request_mood_deltas(
        &self,
        user_input: &str,
        response: &str,
    ) -> Result<(f32, f32, f32)> {
        let name = &self.persona.name;
        let prompt = format!(
            r#"You observe one exchange in a conversation involving {name}.
User said: "{user_input}"
{name} replied: "{response}"
Estimate how this exchange shifts {name}'s mood on the Pleasure-Arousal-Dominance axes.
Return only a JSON object: {{"pleasure": float, "arousal": float, "dominance": float}}
with every delta between -0.5 and 0.5. No other text."#
        );

        let request = GenerateRequest::new(vec![ChatMessage::user(prompt)]);
        let output = self.generator.generate(request).await?;
        let text = collect_output(output).await?;

        let cleaned = strip_code_fences(&text);
        let deltas: MoodDeltas = serde_json::from_str(&cleaned)
            .map_err(|e| SonaError::parse(format!("mood delta reply: {e}")))?;

        Ok((
            deltas.pleasure.clamp(-MAX_AI_DELTA, MAX_AI_DELTA),
            deltas.arousal.clamp(-MAX_AI_DELTA, MAX_AI_DELTA),
            deltas.dominance.clamp(-MAX_AI_DELTA, MAX_AI_DELTA),
        ))
    }

    /// One conversational tick: decay the persona's mood toward calm
    pub fn tick(&mut self) {
        self.persona.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageContent, Role};
    use crate::testing::ScriptedGenerator;

    fn session_with(generator: Arc<ScriptedGenerator>) -> ConversationSession {
        ConversationSession::new(Persona::new("Ava", "female", true), generator)
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_without_state_change() {
        let generator = Arc::new(ScriptedGenerator::with_replies(["unused"]));
        let mut session = session_with(generator.clone());

        let err = session.take_turn("   \t ").await.unwrap_err();
        assert!(matches!(err, SonaError::EmptyInput));
        assert!(session.history.is_empty());
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_turn_appends_history_and_returns_reply() {
        let generator = Arc::new(ScriptedGenerator::with_replies(["Nice to meet you."]));
        let mut session = session_with(generator.clone());

        let reply = session.take_turn("hello there").await.unwrap();
        assert_eq!(reply, "Nice to meet you.");

        let entries = session.history.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, Role::User);
        assert_eq!(entries[0].text(), "hello there");
        assert_eq!(entries[1].role, Role::Assistant);
        assert_eq!(entries[1].text(), "Nice to meet you.");
    }

    #[tokio::test]
    async fn test_request_carries_fresh_instruction_and_normalized_history() {
        let generator = Arc::new(ScriptedGenerator::with_replies(["ok"]));
        let mut session = session_with(generator.clone());
        session.history.push(ChatMessage::system("stale instruction"));
        session.history.push(ChatMessage::user("earlier question"));
        session.history.push(ChatMessage {
            role: Role::Model,
            content: MessageContent::Text("earlier answer".to_string()),
        });

        session.take_turn("new question").await.unwrap();

        let request = &generator.requests()[0];
        let instruction = request.instruction.as_deref().unwrap();
        assert!(instruction.contains("[SYSTEM KERNEL: REALITY ANCHOR]"));
        assert!(instruction.contains("[SYSTEM INTERVENTION: COGNITIVE LOCK]"));
        assert!(request.stream);

        // Stale system entry stripped, model mapped to assistant, new input last.
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].text(), "earlier question");
        assert_eq!(request.messages[1].role, Role::Assistant);
        assert_eq!(request.messages[2].text(), "new question");
    }

    #[tokio::test]
    async fn test_streamed_reply_is_accumulated() {
        let generator = Arc::new(ScriptedGenerator::new());
        generator.push_chunks(["Good ", "to ", "see ", "you."]);
        let mut session = session_with(generator);

        let reply = session.take_turn("hi").await.unwrap();
        assert_eq!(reply, "Good to see you.");
        assert_eq!(session.history.entries()[1].text(), "Good to see you.");
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_history_untouched() {
        let generator = Arc::new(ScriptedGenerator::new());
        generator.push_error("rate limited");
        let mut session = session_with(generator);

        let err = session.take_turn("hello").await.unwrap_err();
        assert!(matches!(err, SonaError::Generation(_)));
        assert!(err.to_string().contains("rate limited"));
        assert!(session.history.is_empty());
    }

    #[tokio::test]
    async fn test_mood_update_via_ai_applies_clamped_deltas() {
        let generator = Arc::new(ScriptedGenerator::with_replies([
            r#"```json
{"pleasure": 0.9, "arousal": -0.2, "dominance": 0.1}
```"#,
        ]));
        let mut session = session_with(generator);

        session.update_mood_via_ai("great work", "thanks!").await;

        // 0.9 exceeds the bound and is clamped to 0.5 before applying.
        assert_eq!(session.persona.mood.pleasure, 0.5);
        assert_eq!(session.persona.mood.arousal, -0.2);
        assert_eq!(session.persona.mood.dominance, 0.1);
    }

    #[tokio::test]
    async fn test_mood_update_failure_is_swallowed() {
        let generator = Arc::new(ScriptedGenerator::with_replies(["not json at all"]));
        let mut session = session_with(generator.clone());

        session.update_mood_via_ai("hi", "hello").await;
        assert_eq!(session.persona.mood.pleasure, 0.0);

        // An outright generation failure is swallowed too.
        session.update_mood_via_ai("hi", "hello").await;
        assert_eq!(session.persona.mood.pleasure, 0.0);
    }
}
