// Alert model types: rules loaded from the text tables and the results the
// engine hands back to whoever draws the overlay.

use serde::{Deserialize, Serialize};

use crate::core::model::{EntitySnapshot, Rgba};

/// When a matched rule is allowed to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerDistance {
    /// `-1` in the rule file.
    Always,
    /// `-2` in the rule file: fire while the entity is valid, ignore range.
    WhileValid,
    /// Fire when the measured distance is strictly below this value.
    /// Other negative values land here and never fire.
    Within(i32),
}

impl TriggerDistance {
    /// Decode the integer column. Unparsable input means `Always`.
    pub fn parse(value: &str) -> Self {
        match value.trim().parse::<i32>() {
            Ok(-1) | Err(_) => Self::Always,
            Ok(-2) => Self::WhileValid,
            Ok(n) => Self::Within(n),
        }
    }

    pub fn allows(self, entity: &EntitySnapshot) -> bool {
        match self {
            Self::Always => true,
            Self::WhileValid => entity.is_valid,
            Self::Within(max) => entity.distance < max as f32,
        }
    }
}

/// One line of a rule file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub key: String,
    pub text: String,
    pub color: Rgba,
    pub distance: TriggerDistance,
    /// Sound file name relative to the sounds folder. Empty means silent.
    pub sound: String,
}

/// Which stage of the evaluation produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchSource {
    /// Warnings already recorded on the entity.
    Active,
    Modifier,
    Path,
    Beast,
    Builtin,
}

/// A single overlay line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
    pub color: Rgba,
    pub sound: String,
}

impl From<&AlertRule> for Annotation {
    fn from(rule: &AlertRule) -> Self {
        Self {
            text: rule.text.clone(),
            color: rule.color,
            sound: rule.sound.clone(),
        }
    }
}

/// Outcome of evaluating one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub source: Option<MatchSource>,
    /// Modifier stages may carry several lines, the others exactly one.
    pub annotations: Vec<Annotation>,
}

impl MatchResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(source: MatchSource, annotation: Annotation) -> Self {
        Self {
            source: Some(source),
            annotations: vec![annotation],
        }
    }

    pub fn matched(&self) -> bool {
        self.source.is_some()
    }

    pub fn primary(&self) -> Option<&Annotation> {
        self.annotations.first()
    }
}
