//! Sona Core Runtime
//!
//! This crate provides the core types and state machine for persona-driven
//! conversational agents. It includes:
//!
//! - A static Big Five trait profile with AI-assisted bootstrap
//! - A dynamic PAD mood state with stimulus, decay, and label classification
//! - A deterministic persona compiler that turns current state into
//!   structured instruction text
//! - A conversation session orchestrating one request/response exchange at a
//!   time over a bounded history
//! - One capability boundary (`TextGenerator`) behind which every LLM
//!   backend lives; backends are injected explicitly at construction
//!
//! # Example
//!
//! ```no_run
//! use sona_core::testing::ScriptedGenerator;
//! use sona_core::{ConversationSession, Persona};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> sona_core::Result<()> {
//!     let persona = Persona::new("Ava", "female", true);
//!     let generator = Arc::new(ScriptedGenerator::with_replies(["hey!"]));
//!     let mut session = ConversationSession::new(persona, generator);
//!     let reply = session.take_turn("hello").await?;
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export commonly used types
pub use uuid::Uuid;

// Core modules
pub mod compiler;
pub mod config;
pub mod error;
pub mod generator;
pub mod history;
pub mod init;
pub mod message;
pub mod mood;
pub mod persona;
pub mod profile;
pub mod streaming;
pub mod testing;
pub mod turn;

// Re-export main types
pub use compiler::{
    compiled_instruction, reinforcement_block, system_instruction, TemplateEngine,
};
pub use config::{get_env_or, load_env, SonaConfig};
pub use error::{Result, SonaError};
pub use generator::{
    collect_output, Choice, ChoiceMessage, GenerateParams, GenerateRequest, GenerateResponse,
    GenerationOutput, TextGenerator, ToolSpec,
};
pub use history::{ConversationHistory, DEFAULT_WINDOW};
pub use init::{initialize_profile, strip_code_fences};
pub use message::{ChatMessage, ContentPart, MessageContent, Role};
pub use mood::{MoodLabel, MoodState, Stimulus, DEFAULT_DECAY_RATE};
pub use persona::{Persona, DEFAULT_STYLE_EXAMPLES};
pub use profile::TraitProfile;
pub use streaming::{
    collect_stream, text_stream, StreamHandler, TextChunk, TextStream, TextStreamSender,
};
pub use turn::ConversationSession;
