//! The persona aggregate: identity, trait profile, and mood

use crate::compiler::DEFAULT_THINKING_TEMPLATE;
use crate::mood::{MoodState, DEFAULT_DECAY_RATE};
use crate::profile::TraitProfile;
use serde::{Deserialize, Serialize};

/// Placeholder tone anchor used until style examples are provided
pub const DEFAULT_STYLE_EXAMPLES: &str =
    "(no specific style examples yet; use the character's standard voice)";

/// The simulated person: identity fields plus exclusively-owned trait and
/// mood state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// Display name
    pub name: String,

    /// Gender tag
    pub gender: String,

    /// Original characters are profiled purely from their description;
    /// known characters may draw on world knowledge.
    pub original_character: bool,

    /// Free-text tone anchor quoted in the compiled prompt
    pub style_examples: String,

    /// Chain-of-thought template with named placeholders, filled per turn
    pub thinking_template: String,

    /// Static Big Five profile
    pub profile: TraitProfile,

    /// Dynamic PAD mood
    pub mood: MoodState,
}

impl Persona {
    /// Create a persona with neutral trait and mood defaults
    pub fn new(name: impl Into<String>, gender: impl Into<String>, original_character: bool) -> Self {
        Self {
            name: name.into(),
            gender: gender.into(),
            original_character,
            style_examples: DEFAULT_STYLE_EXAMPLES.to_string(),
            thinking_template: DEFAULT_THINKING_TEMPLATE.to_string(),
            profile: TraitProfile::default(),
            mood: MoodState::default(),
        }
    }

    /// Set the style examples quoted in the compiled prompt
    pub fn with_style_examples(mut self, examples: impl Into<String>) -> Self {
        self.style_examples = examples.into();
        self
    }

    /// Set the trait profile
    pub fn with_profile(mut self, profile: TraitProfile) -> Self {
        self.profile = profile;
        self
    }

    /// One conversational tick: the mood decays toward calm at the default
    /// rate.
    pub fn tick(&mut self) {
        self.mood.decay(DEFAULT_DECAY_RATE);
    }
}
