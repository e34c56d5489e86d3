//! One-shot trait-profile bootstrap from a free-text description
//!
//! Asks the generation backend to quantify a Big Five profile as a single
//! JSON object, then parses and clamps it. The pipeline is best-effort: any
//! failure is logged and the persona keeps its previous profile; nothing
//! propagates past the caller.

use crate::generator::{collect_output, GenerateRequest, TextGenerator, ToolSpec};
use crate::message::ChatMessage;
use crate::persona::Persona;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

const fn neutral_trait() -> f32 {
    0.5
}

/// Shape of the JSON object the profiling prompt asks for. Missing fields
/// fall back to neutral values.
#[derive(Debug, Deserialize)]
struct ProfileReply {
    #[serde(default = "neutral_trait")]
    openness: f32,
    #[serde(default = "neutral_trait")]
    conscientiousness: f32,
    #[serde(default = "neutral_trait")]
    extraversion: f32,
    #[serde(default = "neutral_trait")]
    agreeableness: f32,
    #[serde(default = "neutral_trait")]
    neuroticism: f32,
    #[serde(default)]
    traits: Vec<String>,
}

fn original_character_prompt(description: &str) -> String {
    format!(
        r#"You are a professional psychologist. From the character description below, quantify the character's Big Five personality traits (each 0.0 to 1.0) and produce matching trait descriptors.
Character description: {description}
Return exactly one JSON object in this shape and nothing else:
{{
  "openness": float,
  "conscientiousness": float,
  "extraversion": float,
  "agreeableness": float,
  "neuroticism": float,
  "traits": ["trait1", "trait2", ...]
}}"#
    )
}

fn known_character_prompt(name: &str, description: &str) -> String {
    format!(
        r#"You are a professional psychologist. Using your knowledge of the character {name} together with the description below, quantify the character's Big Five personality traits (each 0.0 to 1.0) and produce matching trait descriptors.
Character description: {description}
Return exactly one JSON object in this shape and nothing else:
{{
  "openness": float,
  "conscientiousness": float,
  "extraversion": float,
  "agreeableness": float,
  "neuroticism": float,
  "traits": ["trait1", "trait2", ...]
}}"#
    )
}

/// Strip a wrapping ```` ```json ... ``` ```` code fence, if present
pub fn strip_code_fences(text: &str) -> String {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?m)^```(?:json)?\s*|\s*```$").expect("fence regex is valid")
    });
    fence.replace_all(text.trim(), "").trim().to_string()
}

/// Ask the generator to infer a Big Five profile for the persona and assign
/// it, clamping every numeric field to [0.0, 1.0].
///
/// Original characters are profiled purely from the description; known
/// characters additionally request web-search grounding on the name. Returns
/// `true` when a profile was parsed and assigned; on any failure the persona
/// keeps its previous profile and the failure is logged, never raised.
pub async fn initialize_profile(
    persona: &mut Persona,
    generator: &dyn TextGenerator,
    description: &str,
) -> bool {
    let prompt = if persona.original_character {
        original_character_prompt(description)
    } else {
        known_character_prompt(&persona.name, description)
    };

    let mut request = GenerateRequest::new(vec![ChatMessage::user(prompt)]).streaming(true);
    if !persona.original_character {
        request = request.with_tool(ToolSpec::WebSearch);
    }

    let reply = match generator.generate(request).await {
        Ok(output) => match collect_output(output).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(persona = %persona.name, "profile reply stream failed: {e}");
                return false;
            }
        },
        Err(e) => {
            tracing::warn!(persona = %persona.name, "profile initialization call failed: {e}");
            return false;
        }
    };

    apply_profile_reply(persona, &reply)
}

/// Parse a profiling reply and assign it to the persona. Returns `false` and
/// leaves the profile untouched when the reply is not a valid profile object.
fn apply_profile_reply(persona: &mut Persona, reply: &str) -> bool {
    let cleaned = strip_code_fences(reply);

    match serde_json::from_str::<ProfileReply>(&cleaned) {
        Ok(parsed) => {
            persona.profile.clamp_assign(
                parsed.openness,
                parsed.conscientiousness,
                parsed.extraversion,
                parsed.agreeableness,
                parsed.neuroticism,
                parsed.traits,
            );
            tracing::info!(
                persona = %persona.name,
                "trait profile initialized: {}",
                persona.profile.describe()
            );
            true
        }
        Err(e) => {
            tracing::warn!(
                persona = %persona.name,
                "profile reply was not a valid profile object, keeping previous values: {e}"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;

    const WELL_FORMED: &str = r#"{
        "openness": 0.9,
        "conscientiousness": 1.4,
        "extraversion": -0.2,
        "agreeableness": 0.7,
        "neuroticism": 0.3,
        "traits": ["curious", "warm"]
    }"#;

    #[tokio::test]
    async fn test_well_formed_reply_is_assigned_and_clamped() {
        let mut persona = Persona::new("Ava", "female", true);
        let generator = ScriptedGenerator::with_replies([WELL_FORMED]);

        assert!(initialize_profile(&mut persona, &generator, "a warm explorer").await);
        assert_eq!(persona.profile.openness, 0.9);
        assert_eq!(persona.profile.conscientiousness, 1.0);
        assert_eq!(persona.profile.extraversion, 0.0);
        assert_eq!(persona.profile.tags, vec!["curious", "warm"]);
    }

    #[tokio::test]
    async fn test_fenced_reply_is_parsed() {
        let mut persona = Persona::new("Ava", "female", true);
        let generator =
            ScriptedGenerator::with_replies([format!("```json\n{WELL_FORMED}\n```")]);

        assert!(initialize_profile(&mut persona, &generator, "desc").await);
        assert_eq!(persona.profile.agreeableness, 0.7);
    }

    #[tokio::test]
    async fn test_malformed_reply_keeps_previous_values() {
        let mut persona = Persona::new("Ava", "female", true);
        persona.profile.clamp_assign(0.8, 0.8, 0.8, 0.8, 0.8, vec!["bold".to_string()]);
        let generator = ScriptedGenerator::with_replies(["I'd rather not answer in JSON."]);

        assert!(!initialize_profile(&mut persona, &generator, "desc").await);
        assert_eq!(persona.profile.openness, 0.8);
        assert_eq!(persona.profile.tags, vec!["bold"]);
    }

    #[tokio::test]
    async fn test_generation_failure_is_swallowed() {
        let mut persona = Persona::new("Ava", "female", true);
        let generator = ScriptedGenerator::new();
        generator.push_error("quota exceeded");

        assert!(!initialize_profile(&mut persona, &generator, "desc").await);
        assert_eq!(persona.profile.openness, 0.5);
    }

    #[tokio::test]
    async fn test_missing_fields_fall_back_to_neutral() {
        let mut persona = Persona::new("Ava", "female", true);
        let generator = ScriptedGenerator::with_replies([r#"{"openness": 0.9}"#]);

        assert!(initialize_profile(&mut persona, &generator, "desc").await);
        assert_eq!(persona.profile.openness, 0.9);
        assert_eq!(persona.profile.neuroticism, 0.5);
        assert!(persona.profile.tags.is_empty());
    }

    #[tokio::test]
    async fn test_known_character_requests_web_search() {
        let mut known = Persona::new("Sherlock Holmes", "male", false);
        let generator = ScriptedGenerator::with_replies([WELL_FORMED]);
        initialize_profile(&mut known, &generator, "the detective").await;

        let request = &generator.requests()[0];
        assert!(request.tools.contains(&ToolSpec::WebSearch));
        assert!(request.messages[0].text().contains("Sherlock Holmes"));

        let mut original = Persona::new("Ava", "female", true);
        let generator = ScriptedGenerator::with_replies([WELL_FORMED]);
        initialize_profile(&mut original, &generator, "an explorer").await;
        assert!(generator.requests()[0].tools.is_empty());
    }

    #[test]
    fn test_strip_code_fences_variants() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }
}
