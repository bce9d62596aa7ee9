use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Specificity tier of a hint, derived from how many hints the student has
/// already received for the same question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum HintLevel {
    General,
    Directional,
    Detailed,
}

impl HintLevel {
    /// Prompt instruction describing how specific the hint should be.
    pub fn instruction(&self) -> &'static str {
        match self {
            HintLevel::General => "general; only suggest a direction of thinking",
            HintLevel::Directional => "clearer; point toward the solution method",
            HintLevel::Detailed => "detailed; give step-by-step guidance",
        }
    }
}

pub fn select_level(previous_hint_count: usize) -> HintLevel {
    match previous_hint_count {
        0 => HintLevel::General,
        1 => HintLevel::Directional,
        _ => HintLevel::Detailed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalates_with_previous_hints() {
        assert_eq!(select_level(0), HintLevel::General);
        assert_eq!(select_level(1), HintLevel::Directional);
        for count in [2, 3, 7, 100, usize::MAX] {
            assert_eq!(select_level(count), HintLevel::Detailed);
        }
    }

    #[test]
    fn instructions_differ_per_level() {
        assert!(HintLevel::General.instruction().contains("direction of thinking"));
        assert!(HintLevel::Directional.instruction().contains("solution method"));
        assert!(HintLevel::Detailed.instruction().contains("step-by-step"));
    }
}
