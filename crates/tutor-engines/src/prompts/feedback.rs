use tutor_core::classifier::is_exact_match;
use tutor_core::traits::PromptComposer;
use tutor_core::types::{SubmissionContext, TestContext};
use tutor_core::utils::non_blank;

use super::{or_default, outcome_label, DETAILS_NOT_AVAILABLE, NOT_SPECIFIED, TUTOR_FRAMING};

#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackPrompt;

impl PromptComposer for FeedbackPrompt {
    type Context = SubmissionContext;

    fn compose(&self, ctx: &SubmissionContext) -> String {
        let mut lines = vec![
            TUTOR_FRAMING.to_string(),
            "Evaluate the student's answer and give detailed, encouraging feedback.".to_string(),
            String::new(),
            "Submission:".to_string(),
            format!("- Subject: {}", or_default(ctx.subject.as_deref(), NOT_SPECIFIED)),
            format!("- Topic: {}", or_default(ctx.topic.as_deref(), NOT_SPECIFIED)),
            format!("- Difficulty: {}", or_default(ctx.difficulty.as_deref(), "Medium")),
            format!(
                "- Question: {}",
                or_default(ctx.question_text.as_deref(), DETAILS_NOT_AVAILABLE)
            ),
            format!(
                "- Student answer: {}",
                or_default(ctx.student_answer.as_deref(), "Not answered")
            ),
            format!(
                "- Correct answer: {}",
                or_default(ctx.correct_answer.as_deref(), "Not provided")
            ),
        ];

        if let Some(test) = &ctx.test {
            lines.push(String::new());
            lines.extend(test_block(test));
        }

        lines.extend(
            [
                "",
                "Return a JSON object in this format:",
                "{",
                "    \"feedbackText\": \"Detailed comments on the answer (2-3 sentences)\",",
                "    \"hint\": \"A study tip or next step (1-2 sentences)\"",
                "}",
                "",
                "Guidelines:",
                "- If correct: praise and encourage the student",
                "- If incorrect: encourage, point out the mistake and how to fix it",
                "- If partially correct: acknowledge what is right and guide the student to complete it",
                "- Use fitting emoji",
                "- Do not reveal the correct answer directly",
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        lines.join("\n")
    }
}

fn test_block(test: &TestContext) -> Vec<String> {
    let mut lines = vec![format!(
        "Test: {}",
        or_default(test.title.as_deref(), DETAILS_NOT_AVAILABLE)
    )];
    if let Some(description) = non_blank(test.description.as_deref()) {
        lines.push(format!("- Description: {}", description));
    }
    if let Some(date) = non_blank(test.date_taken.as_deref()) {
        lines.push(format!("- Date taken: {}", date));
    }
    if let Some(minutes) = test.time_limit {
        lines.push(format!("- Time limit: {} minutes", minutes));
    }

    if test.questions.is_empty() {
        lines.push(format!("Questions: {}", DETAILS_NOT_AVAILABLE));
        return lines;
    }

    lines.push("Questions and results:".to_string());
    let mut correct = 0usize;
    for (index, question) in test.questions.iter().enumerate() {
        let is_correct = is_exact_match(
            question.student_answer.as_deref(),
            question.correct_answer.as_deref(),
        );
        if is_correct {
            correct += 1;
        }

        lines.push(format!(
            "{}. {}",
            index + 1,
            or_default(question.question_text.as_deref(), DETAILS_NOT_AVAILABLE)
        ));
        if !question.options.is_empty() {
            lines.push(format!("   Options: {}", question.options.join(" | ")));
        }
        lines.push(format!(
            "   Correct answer: {}",
            or_default(question.correct_answer.as_deref(), "Not provided")
        ));
        lines.push(format!(
            "   Student answer: {}",
            or_default(question.student_answer.as_deref(), "Not answered")
        ));
        lines.push(format!("   Result: {}", outcome_label(Some(is_correct))));
    }

    let total = test.questions.len();
    lines.push(format!(
        "Score: {}/{} correct ({:.1}%)",
        correct,
        total,
        correct as f64 * 100.0 / total as f64
    ));
    lines
}
