//! Big Five trait profile (OCEAN model)

use serde::{Deserialize, Serialize};

/// Static five-axis personality vector, each axis scored 0.0 to 1.0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitProfile {
    /// Openness to experience
    /// High: creative, curious. Low: practical, conventional.
    pub openness: f32,

    /// Conscientiousness
    /// High: organized, dependable. Low: flexible, spontaneous.
    pub conscientiousness: f32,

    /// Extraversion
    /// High: outgoing, talkative. Low: reserved, quiet.
    pub extraversion: f32,

    /// Agreeableness
    /// High: cooperative, warm. Low: blunt, challenging.
    pub agreeableness: f32,

    /// Neuroticism
    /// High: sensitive, easily stressed. Low: calm, resilient.
    pub neuroticism: f32,

    /// Free-text descriptors in generation order; duplicates are allowed
    pub tags: Vec<String>,
}

impl Default for TraitProfile {
    fn default() -> Self {
        Self {
            openness: 0.5,
            conscientiousness: 0.5,
            extraversion: 0.5,
            agreeableness: 0.5,
            neuroticism: 0.5,
            tags: Vec::new(),
        }
    }
}

impl TraitProfile {
    /// Assign all five scalars and the tag list. Each scalar is clamped to
    /// [0.0, 1.0] independently; out-of-range input is corrected silently.
    /// Tags are assigned verbatim.
    pub fn clamp_assign(
        &mut self,
        openness: f32,
        conscientiousness: f32,
        extraversion: f32,
        agreeableness: f32,
        neuroticism: f32,
        tags: Vec<String>,
    ) {
        self.openness = openness.clamp(0.0, 1.0);
        self.conscientiousness = conscientiousness.clamp(0.0, 1.0);
        self.extraversion = extraversion.clamp(0.0, 1.0);
        self.agreeableness = agreeableness.clamp(0.0, 1.0);
        self.neuroticism = neuroticism.clamp(0.0, 1.0);
        self.tags = tags;
    }

    /// Derive a descriptive label string from the scalar scores.
    /// Deterministic for identical inputs: fixed axis order, fixed threshold
    /// bands.
    pub fn describe(&self) -> String {
        let mut traits = Vec::new();

        if self.openness > 0.7 {
            traits.push("creative and curious");
        } else if self.openness < 0.3 {
            traits.push("practical and conventional");
        }

        if self.conscientiousness > 0.7 {
            traits.push("organized and reliable");
        } else if self.conscientiousness < 0.3 {
            traits.push("flexible and spontaneous");
        }

        if self.extraversion > 0.7 {
            traits.push("outgoing and energetic");
        } else if self.extraversion < 0.3 {
            traits.push("reserved and reflective");
        }

        if self.agreeableness > 0.7 {
            traits.push("warm and cooperative");
        } else if self.agreeableness < 0.3 {
            traits.push("direct and challenging");
        }

        if self.neuroticism > 0.7 {
            traits.push("sensitive and easily stressed");
        } else if self.neuroticism < 0.3 {
            traits.push("calm and resilient");
        }

        if traits.is_empty() {
            "balanced and adaptable".to_string()
        } else {
            traits.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_neutral() {
        let profile = TraitProfile::default();
        assert_eq!(profile.openness, 0.5);
        assert_eq!(profile.neuroticism, 0.5);
        assert!(profile.tags.is_empty());
    }

    #[test]
    fn test_clamp_assign_out_of_range() {
        let mut profile = TraitProfile::default();
        profile.clamp_assign(1.7, -0.4, 2.0, -100.0, 1.0001, vec![]);

        assert_eq!(profile.openness, 1.0);
        assert_eq!(profile.conscientiousness, 0.0);
        assert_eq!(profile.extraversion, 1.0);
        assert_eq!(profile.agreeableness, 0.0);
        assert_eq!(profile.neuroticism, 1.0);
    }

    #[test]
    fn test_clamp_assign_preserves_in_range_values() {
        let mut profile = TraitProfile::default();
        profile.clamp_assign(0.85, 0.4, 0.6, 0.72, 0.31, vec!["stubborn".to_string()]);

        assert_eq!(profile.openness, 0.85);
        assert_eq!(profile.conscientiousness, 0.4);
        assert_eq!(profile.extraversion, 0.6);
        assert_eq!(profile.agreeableness, 0.72);
        assert_eq!(profile.neuroticism, 0.31);
        assert_eq!(profile.tags, vec!["stubborn"]);
    }

    #[test]
    fn test_tags_keep_order_and_duplicates() {
        let mut profile = TraitProfile::default();
        profile.clamp_assign(
            0.5,
            0.5,
            0.5,
            0.5,
            0.5,
            vec!["kind".to_string(), "blunt".to_string(), "kind".to_string()],
        );

        assert_eq!(profile.tags, vec!["kind", "blunt", "kind"]);
    }

    #[test]
    fn test_describe_is_deterministic() {
        let mut profile = TraitProfile::default();
        profile.clamp_assign(0.9, 0.2, 0.5, 0.8, 0.1, vec![]);

        let first = profile.describe();
        let second = profile.describe();
        assert_eq!(first, second);
        assert!(first.contains("creative and curious"));
        assert!(first.contains("calm and resilient"));
    }

    #[test]
    fn test_describe_balanced() {
        assert_eq!(TraitProfile::default().describe(), "balanced and adaptable");
    }
}
