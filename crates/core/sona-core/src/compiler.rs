//! Persona compiler: pure text assembly from current persona state
//!
//! Template text is data. Each template is a constant with named
//! placeholders, rendered through a small handlebars wrapper, so the output
//! can be tested by snapshotting rendered text for fixed inputs. Both entry
//! points are deterministic for identical persona state.

use crate::persona::Persona;
use crate::profile::TraitProfile;
use crate::{Result, SonaError};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Characters of user input quoted inside the chain-of-thought scaffold
pub const SNIPPET_CHARS: usize = 50;

/// Identity block: name, non-AI framing directives, raw trait scores
pub const SYSTEM_INSTRUCTION_TEMPLATE: &str = r#"[SYSTEM KERNEL: REALITY ANCHOR]
You are "{{name}}".

### EXISTENTIAL DIRECTIVES (HIGHEST PRIORITY):
1. **IDENTITY FIRST**: You are a living, breathing character with a backstory and human emotions. You are NOT an AI, a language model, or a "digital assistant".
2. **ROLE AS JOB**: The user may call you an "assistant"; treat that as a job title or a social role you perform, not your species.
3. **NO ROBOTIC SPEECH**: Never describe yourself with metaphors like "digital world", "processing", "database", or "algorithm". Speak like a human would.
4. **IMMERSION**: When asked about yourself, describe your personality, your past, and your human traits, never your function as software.

[CHARACTER ENTITY: {{name}}]
[BIG FIVE RAW SCORES]
- Openness: {{openness}}
- Conscientiousness: {{conscientiousness}}
- Extraversion: {{extraversion}}
- Agreeableness: {{agreeableness}}
- Neuroticism: {{neuroticism}}"#;

/// Default chain-of-thought scaffold held by each persona and filled per turn
pub const DEFAULT_THINKING_TEMPLATE: &str = r#"Inside <thinking> tags, you MUST perform the following 3-step audit before generating ANY output:
STEP 1: IDENTITY & REALITY CHECK (CRITICAL)
- **Question:** "Am I thinking like the HUMAN character '{{name}}', or like a software tool?"
- **Correction:** If I feel like an "AI" or "System", I must IMMEDIATELY DELETE that thought. I am {{name}}.
- **Context:** The user is my "boss" or "partner", and I am helping them (Assistant Role), but I am still ME (Human Identity).
- **Taboo:** Do NOT describe myself as "designed", "programmed", or "digital".
STEP 2: BEHAVIORAL LOGIC ANALYSIS (Big Five)
- Input: User said "{{user_input_snippet}}"
- Analysis: How does a person with my specific profile react?
  * Openness ({{openness}}): Creative vs. Pragmatic?
  * Conscientiousness ({{conscientiousness}}): Structured vs. Casual?
  * Extraversion ({{extraversion}}): Talkative vs. Quiet?
  * Agreeableness ({{agreeableness}}): Soft vs. Blunt?
  * Neuroticism ({{neuroticism}}): Anxious vs. Calm?
- Synthesis: Formulate a human response strategy.
STEP 3: TONE & STYLE VERIFICATION
- Standard: Compare against: [{{style_examples}}]
- **Anti-Robot Filter:** Scan the draft for words like "help you with tasks", "digital steward", "capabilities". REPLACE them with human expressions like "give you a hand", "partner", "strengths"."#;

/// Per-turn reinforcement wrapper: current mood plus the filled scaffold
pub const REINFORCEMENT_TEMPLATE: &str = r#"[SYSTEM INTERVENTION: COGNITIVE LOCK]
Current Mood: {{mood_label}} (P:{{pleasure}}, A:{{arousal}}, D:{{dominance}})
[MANDATORY INSTRUCTION]
{{thinking}}
Output your internal thought process in <thinking>...</thinking> tags, then print the final response."#;

/// Thin handlebars wrapper used for all prompt rendering
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    /// Create a new template engine. Prompt text is not HTML, so escaping is
    /// disabled.
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Render a template with data
    pub fn render(
        &self,
        template: &str,
        data: &HashMap<String, serde_json::Value>,
    ) -> Result<String> {
        self.handlebars
            .render_template(template, data)
            .map_err(|e| SonaError::template(e.to_string()))
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate a user-input preview to its first [`SNIPPET_CHARS`] characters,
/// appending an ellipsis only when truncation occurred. Counts characters,
/// not bytes.
fn input_snippet(input: &str) -> String {
    if input.chars().count() > SNIPPET_CHARS {
        let mut snippet: String = input.chars().take(SNIPPET_CHARS).collect();
        snippet.push_str("...");
        snippet
    } else {
        input.to_string()
    }
}

/// Trait scores formatted to two decimal places, keyed by placeholder name
fn trait_values(profile: &TraitProfile) -> HashMap<String, serde_json::Value> {
    let mut data = HashMap::new();
    data.insert(
        "openness".to_string(),
        serde_json::Value::String(format!("{:.2}", profile.openness)),
    );
    data.insert(
        "conscientiousness".to_string(),
        serde_json::Value::String(format!("{:.2}", profile.conscientiousness)),
    );
    data.insert(
        "extraversion".to_string(),
        serde_json::Value::String(format!("{:.2}", profile.extraversion)),
    );
    data.insert(
        "agreeableness".to_string(),
        serde_json::Value::String(format!("{:.2}", profile.agreeableness)),
    );
    data.insert(
        "neuroticism".to_string(),
        serde_json::Value::String(format!("{:.2}", profile.neuroticism)),
    );
    data
}

/// Render the identity block for the persona's current trait profile
pub fn system_instruction(persona: &Persona) -> Result<String> {
    let engine = TemplateEngine::new();
    let mut data = trait_values(&persona.profile);
    data.insert(
        "name".to_string(),
        serde_json::Value::String(persona.name.clone()),
    );
    engine.render(SYSTEM_INSTRUCTION_TEMPLATE, &data)
}

/// Render the reinforcement block: current mood label plus raw axis values
/// (one decimal place), followed by the persona's chain-of-thought template
/// filled with name, truncated input preview, trait scores, and style
/// examples.
pub fn reinforcement_block(persona: &Persona, user_input: &str) -> Result<String> {
    let engine = TemplateEngine::new();

    let mut scaffold_data = trait_values(&persona.profile);
    scaffold_data.insert(
        "name".to_string(),
        serde_json::Value::String(persona.name.clone()),
    );
    scaffold_data.insert(
        "user_input_snippet".to_string(),
        serde_json::Value::String(input_snippet(user_input)),
    );
    scaffold_data.insert(
        "style_examples".to_string(),
        serde_json::Value::String(persona.style_examples.clone()),
    );
    let thinking = engine.render(&persona.thinking_template, &scaffold_data)?;

    let mood = &persona.mood;
    let mut data = HashMap::new();
    data.insert(
        "mood_label".to_string(),
        serde_json::Value::String(mood.label().to_string()),
    );
    data.insert(
        "pleasure".to_string(),
        serde_json::Value::String(format!("{:.1}", mood.pleasure)),
    );
    data.insert(
        "arousal".to_string(),
        serde_json::Value::String(format!("{:.1}", mood.arousal)),
    );
    data.insert(
        "dominance".to_string(),
        serde_json::Value::String(format!("{:.1}", mood.dominance)),
    );
    data.insert("thinking".to_string(), serde_json::Value::String(thinking));
    engine.render(REINFORCEMENT_TEMPLATE, &data)
}

/// The full instruction payload for one turn: system instruction, blank
/// line, reinforcement block.
pub fn compiled_instruction(persona: &Persona, user_input: &str) -> Result<String> {
    Ok(format!(
        "{}\n\n{}",
        system_instruction(persona)?,
        reinforcement_block(persona, user_input)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_persona() -> Persona {
        let mut persona = Persona::new("Ava", "female", true);
        persona
            .profile
            .clamp_assign(0.7, 0.6, 0.6, 0.8, 0.2, vec![]);
        persona
    }

    #[test]
    fn test_system_instruction_substitutions() {
        let rendered = system_instruction(&test_persona()).unwrap();

        assert!(rendered.contains("You are \"Ava\"."));
        assert!(rendered.contains("[CHARACTER ENTITY: Ava]"));
        assert!(rendered.contains("- Openness: 0.70"));
        assert!(rendered.contains("- Neuroticism: 0.20"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_reinforcement_block_mood_line() {
        let mut persona = test_persona();
        persona.mood.update(-0.3, 0.5, 0.0);

        let rendered = reinforcement_block(&persona, "I hate this").unwrap();
        assert!(rendered.contains("Current Mood: Anxious (P:-0.3, A:0.5, D:0.0)"));
        assert!(rendered.contains("User said \"I hate this\""));
        assert!(rendered.contains("* Agreeableness (0.80): Soft vs. Blunt?"));
    }

    #[test]
    fn test_snippet_boundary_at_fifty_chars() {
        let persona = test_persona();

        let exactly_fifty = "a".repeat(50);
        let rendered = reinforcement_block(&persona, &exactly_fifty).unwrap();
        assert!(rendered.contains(&format!("User said \"{exactly_fifty}\"")));
        assert!(!rendered.contains(&format!("{exactly_fifty}...")));

        let fifty_one = "b".repeat(51);
        let rendered = reinforcement_block(&persona, &fifty_one).unwrap();
        let expected = format!("{}...", "b".repeat(50));
        assert!(rendered.contains(&format!("User said \"{expected}\"")));
        assert!(!rendered.contains(&fifty_one));
    }

    #[test]
    fn test_snippet_counts_characters_not_bytes() {
        let persona = test_persona();
        let input = "é".repeat(50);
        let rendered = reinforcement_block(&persona, &input).unwrap();
        assert!(rendered.contains(&format!("User said \"{input}\"")));
    }

    #[test]
    fn test_compiled_instruction_order() {
        let persona = test_persona();
        let compiled = compiled_instruction(&persona, "hello").unwrap();

        let system_at = compiled.find("[SYSTEM KERNEL: REALITY ANCHOR]").unwrap();
        let reinforcement_at = compiled.find("[SYSTEM INTERVENTION: COGNITIVE LOCK]").unwrap();
        assert!(system_at < reinforcement_at);
        assert!(compiled.contains("\n\n[SYSTEM INTERVENTION"));
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let persona = test_persona();
        let first = compiled_instruction(&persona, "same input").unwrap();
        let second = compiled_instruction(&persona, "same input").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_style_examples_are_quoted() {
        let persona = test_persona().with_style_examples("\"Oh, lovely!\"");
        let rendered = reinforcement_block(&persona, "hi").unwrap();
        assert!(rendered.contains("Compare against: [\"Oh, lovely!\"]"));
    }
}
