//! Answer classification.
//!
//! Two separate verdicts are computed from a submission:
//!
//! - [`classify`] produces the three-way [`Verdict`] the rule-based strategy
//!   uses to pick the tone of its feedback.
//! - [`is_exact_match`] produces the boolean stored on each feedback record
//!   and tallied by performance analytics.
//!
//! They are intentionally different rules and must not be merged.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Three-way verdict for a submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Correct,
    Partial,
    Incorrect,
}

/// Tokens of this length or shorter never count toward a partial match.
const MIN_SIGNIFICANT_TOKEN_LEN: usize = 2;

/// Trim and lowercase; an absent answer normalizes to the empty string.
pub fn normalize(text: Option<&str>) -> String {
    text.map(|t| t.trim().to_lowercase()).unwrap_or_default()
}

pub fn classify(student_answer: Option<&str>, correct_answer: Option<&str>) -> Verdict {
    let student = normalize(student_answer);
    let correct = normalize(correct_answer);

    if student == correct {
        Verdict::Correct
    } else if is_partially_correct(&student, &correct) {
        Verdict::Partial
    } else {
        Verdict::Incorrect
    }
}

/// Exact normalized equality. A missing answer on either side is never correct.
pub fn is_exact_match(student_answer: Option<&str>, correct_answer: Option<&str>) -> bool {
    match (student_answer, correct_answer) {
        (Some(student), Some(correct)) => {
            student.trim().to_lowercase() == correct.trim().to_lowercase()
        }
        _ => false,
    }
}

// Token containment scan over the correct answer. `total` counts every token,
// including the short ones that can never match.
fn is_partially_correct(student: &str, correct: &str) -> bool {
    if student.is_empty() || correct.is_empty() {
        return false;
    }

    let tokens: Vec<&str> = correct.split_whitespace().collect();
    let matched = tokens
        .iter()
        .filter(|token| token.chars().count() > MIN_SIGNIFICANT_TOKEN_LEN && student.contains(*token))
        .count();

    matched > 0 && matched < tokens.len()
}
