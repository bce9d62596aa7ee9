//! Prompt composers, one per generation task.
//!
//! Every composer renders absent optional fields either as a labelled
//! default or by dropping the section entirely, so the output never carries
//! a stringified missing value.

mod chat;
mod explanation;
mod feedback;
mod hint;
mod materials;
mod recommendation;

pub use chat::ChatPrompt;
pub use explanation::ExplanationPrompt;
pub use feedback::FeedbackPrompt;
pub use hint::HintPrompt;
pub use materials::MaterialsPrompt;
pub use recommendation::RecommendationPrompt;

use tutor_core::types::FeedbackRecord;
use tutor_core::utils::non_blank;

/// Substituted when a question or lookup target could not be found.
pub const DETAILS_NOT_AVAILABLE: &str = "(details not available)";
pub const NO_DATA_YET: &str = "(no data yet)";
pub const NOT_SPECIFIED: &str = "Not specified";

const TUTOR_FRAMING: &str = "You are a friendly AI tutor in an Intelligent Tutoring System.";

fn or_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    non_blank(value).unwrap_or(default)
}

fn outcome_label(is_correct: Option<bool>) -> &'static str {
    if is_correct == Some(true) {
        "✓ Correct"
    } else {
        "✗ Incorrect"
    }
}

fn history_line(record: &FeedbackRecord) -> String {
    format!(
        "- {} ({}): {}",
        or_default(record.topic.as_deref(), NOT_SPECIFIED),
        or_default(record.difficulty.as_deref(), NOT_SPECIFIED),
        outcome_label(record.is_correct)
    )
}
