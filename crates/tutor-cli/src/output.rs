//! Text and JSON rendering of service responses.

use anyhow::Result;
use serde::Serialize;

use tutor_core::types::{ExplanationRecord, FeedbackRecord, StudentProfile};
use tutor_service::{
    ChatResponse, ExplanationResponse, FeedbackResponse, HintHistoryEntry, HintResponse,
    RecommendationsResponse,
};

#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub json_format: bool,
}

/// Renders `value` as pretty JSON or with the given text formatter.
pub fn render<T: Serialize + ?Sized>(
    value: &T,
    options: &OutputOptions,
    text: impl FnOnce(&T) -> String,
) -> Result<String> {
    if options.json_format {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(text(value))
    }
}

pub fn feedback_text(response: &FeedbackResponse) -> String {
    format!(
        "{}\n\nHint: {}\n\nCorrect: {} | Source: {} | Record: #{}",
        response.feedback_text,
        response.hint,
        if response.is_correct { "yes" } else { "no" },
        response.source,
        response.id
    )
}

pub fn hint_text(response: &HintResponse) -> String {
    format!(
        "Hint #{} ({}):\n{}\n\nSource: {}",
        response.hint_count, response.level, response.hint, response.source
    )
}

pub fn explanation_text(response: &ExplanationResponse) -> String {
    format!("{}\n\nSource: {}", response.explanation, response.source)
}

pub fn recommendations_text(response: &RecommendationsResponse) -> String {
    let mut lines = vec![format!(
        "Recommendations for student {} ({}):",
        response.student_id, response.source
    )];
    for (i, rec) in response.recommendations.iter().enumerate() {
        lines.push(format!("{}. {}\n   {}", i + 1, rec.next_topic, rec.explanation));
    }
    lines.join("\n")
}

pub fn hint_history_text(entries: &[HintHistoryEntry]) -> String {
    if entries.is_empty() {
        return "No hints yet.".to_string();
    }
    entries
        .iter()
        .map(|e| {
            format!(
                "#{} [{}] {}",
                e.hint_count,
                e.created_at.format("%Y-%m-%d %H:%M:%S"),
                e.hint
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn feedback_record_text(record: &FeedbackRecord) -> String {
    let outcome = match record.is_correct {
        Some(true) => "correct",
        Some(false) => "incorrect",
        None => "ungraded",
    };
    let mut line = format!(
        "#{} [{}] question {} ({}{}): {}",
        record.id,
        record.created_at.format("%Y-%m-%d %H:%M:%S"),
        record.question_id,
        outcome,
        record
            .topic
            .as_deref()
            .map(|t| format!(", {}", t))
            .unwrap_or_default(),
        record.feedback_text
    );
    if let Some(hint) = &record.hint {
        line.push_str(&format!("\n    Hint: {}", hint));
    }
    line
}

pub fn feedback_history_text(records: &[FeedbackRecord]) -> String {
    if records.is_empty() {
        return "No feedback yet.".to_string();
    }
    records
        .iter()
        .map(feedback_record_text)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn explanation_history_text(records: &[ExplanationRecord]) -> String {
    if records.is_empty() {
        return "No explanations yet.".to_string();
    }
    records
        .iter()
        .map(|r| {
            format!(
                "#{} [{}] Q: {}\n{}",
                r.id,
                r.created_at.format("%Y-%m-%d %H:%M:%S"),
                r.student_question.as_deref().unwrap_or("-"),
                r.explanation
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn profile_text(profile: &StudentProfile) -> String {
    let list = |topics: &[String]| {
        if topics.is_empty() {
            "-".to_string()
        } else {
            topics.join(", ")
        }
    };
    [
        format!("Student {}", profile.student_id),
        format!(
            "Attempts: {} ({} correct, {:.2}%)",
            profile.total_attempts, profile.correct_answers, profile.accuracy
        ),
        format!("Strengths: {}", list(&profile.strengths)),
        format!("Weaknesses: {}", list(&profile.weaknesses)),
        format!("Recommended difficulty: {}", profile.recommended_difficulty),
        format!("Next topic: {}", profile.recommended_next_topic),
    ]
    .join("\n")
}

pub fn chat_text(response: &ChatResponse) -> String {
    match &response.suggested_materials {
        Some(materials) => format!("{}\n\n{}", response.reply, materials),
        None => response.reply.clone(),
    }
}
