//! PAD mood state: stimulus, decay, and label classification

use serde::{Deserialize, Serialize};

/// Default multiplicative decay rate per conversational tick
pub const DEFAULT_DECAY_RATE: f32 = 0.1;

/// Discrete mood classification derived from the PAD axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoodLabel {
    /// Calm and content (low arousal, positive pleasure)
    Relaxed,
    /// Flat and listless (low arousal, negative pleasure)
    BoredDepressed,
    /// Strongly positive and in control
    Joyful,
    /// Positive and activated
    Excited,
    /// Strongly negative and dominant
    Angry,
    /// Strongly negative and submissive
    Fearful,
    /// Negative and activated
    Anxious,
    /// No branch matched; includes exactly-zero arousal
    Neutral,
}

impl std::fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MoodLabel::Relaxed => "Relaxed",
            MoodLabel::BoredDepressed => "Bored/Depressed",
            MoodLabel::Joyful => "Joyful",
            MoodLabel::Excited => "Excited",
            MoodLabel::Angry => "Angry",
            MoodLabel::Fearful => "Fearful",
            MoodLabel::Anxious => "Anxious",
            MoodLabel::Neutral => "Neutral",
        };
        write!(f, "{label}")
    }
}

/// Dynamic three-axis affect vector (Pleasure-Arousal-Dominance) plus an
/// energy scalar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodState {
    /// Displeasure to pleasure (-1.0 to 1.0)
    pub pleasure: f32,

    /// Calm to activated (-1.0 to 1.0)
    pub arousal: f32,

    /// Submissive to in control (-1.0 to 1.0)
    pub dominance: f32,

    /// Energy reserve (0.0 to 1.0). Tracked and clamped, but consumed by no
    /// operation yet.
    pub energy: f32,
}

impl Default for MoodState {
    fn default() -> Self {
        Self {
            pleasure: 0.0,
            arousal: 0.0,
            dominance: 0.0,
            energy: 1.0,
        }
    }
}

impl MoodState {
    /// Create a neutral mood
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an additive stimulus to each axis, then clamp every axis to
    /// [-1.0, 1.0]. Delta magnitude is not bounded here; callers are expected
    /// to choose bounded stimuli.
    pub fn update(&mut self, d_pleasure: f32, d_arousal: f32, d_dominance: f32) {
        self.pleasure = (self.pleasure + d_pleasure).clamp(-1.0, 1.0);
        self.arousal = (self.arousal + d_arousal).clamp(-1.0, 1.0);
        self.dominance = (self.dominance + d_dominance).clamp(-1.0, 1.0);
    }

    /// Apply a stimulus vector
    pub fn apply(&mut self, stimulus: Stimulus) {
        self.update(stimulus.pleasure, stimulus.arousal, stimulus.dominance);
    }

    /// Decay the mood toward calm. Dominance is modeled as a more stable
    /// axis and decays at half the rate. Energy is unaffected.
    pub fn decay(&mut self, rate: f32) {
        self.pleasure *= 1.0 - rate;
        self.arousal *= 1.0 - rate;
        self.dominance *= 1.0 - rate / 2.0;
    }

    /// Set the energy reserve, clamped to [0.0, 1.0]
    pub fn set_energy(&mut self, energy: f32) {
        self.energy = energy.clamp(0.0, 1.0);
    }

    /// Classify the current PAD values into a discrete label. The first
    /// matching branch wins; `arousal == 0.0` matches no arousal branch and
    /// falls through to `Neutral`.
    pub fn label(&self) -> MoodLabel {
        let (p, a, d) = (self.pleasure, self.arousal, self.dominance);

        if a < 0.0 && p > 0.0 {
            return MoodLabel::Relaxed;
        }
        if a < 0.0 && p < 0.0 {
            return MoodLabel::BoredDepressed;
        }

        if a > 0.0 {
            if p > 0.5 && d > 0.0 {
                return MoodLabel::Joyful;
            }
            if p > 0.2 && d > 0.0 {
                return MoodLabel::Excited;
            }
            if p < -0.5 && d > 0.0 {
                return MoodLabel::Angry;
            }
            if p < -0.5 && d < 0.0 {
                return MoodLabel::Fearful;
            }
            if p < 0.0 {
                return MoodLabel::Anxious;
            }
        }

        MoodLabel::Neutral
    }
}

/// A bounded additive stimulus vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    /// Pleasure delta
    pub pleasure: f32,
    /// Arousal delta
    pub arousal: f32,
    /// Dominance delta
    pub dominance: f32,
}

/// Negative sentiment words; a match maps to a fixed negative stimulus
const NEGATIVE_WORDS: [&str; 2] = ["bad", "hate"];

/// Positive sentiment words; a match maps to a fixed positive stimulus
const POSITIVE_WORDS: [&str; 2] = ["good", "love"];

impl Stimulus {
    /// Create a stimulus vector
    pub const fn new(pleasure: f32, arousal: f32, dominance: f32) -> Self {
        Self {
            pleasure,
            arousal,
            dominance,
        }
    }

    /// Keyword heuristic over raw user text. Negative matches win over
    /// positive ones; text matching neither produces no stimulus.
    pub fn from_text(input: &str) -> Option<Self> {
        let lower = input.to_lowercase();
        if NEGATIVE_WORDS.iter().any(|word| lower.contains(word)) {
            return Some(Self::new(-0.3, 0.5, 0.0));
        }
        if POSITIVE_WORDS.iter().any(|word| lower.contains(word)) {
            return Some(Self::new(0.3, 0.2, 0.0));
        }
        None
    }
}
