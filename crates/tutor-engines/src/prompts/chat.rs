use tutor_core::traits::PromptComposer;
use tutor_core::types::ChatContext;
use tutor_core::utils::non_blank;

use super::{history_line, DETAILS_NOT_AVAILABLE};

#[derive(Debug, Clone, Copy, Default)]
pub struct ChatPrompt;

impl PromptComposer for ChatPrompt {
    type Context = ChatContext;

    fn compose(&self, ctx: &ChatContext) -> String {
        let mut lines = vec![
            "You are the AI Learning Bot, a friendly study assistant in an Intelligent Tutoring System."
                .to_string(),
            format!("You are talking with student {}.", ctx.student_id),
        ];

        if !ctx.recent_history.is_empty() {
            lines.push(String::new());
            lines.push("The student's recent learning history:".to_string());
            lines.extend(ctx.recent_history.iter().map(history_line));
        }

        if let Some(context) = non_blank(ctx.learning_context.as_deref()) {
            lines.push(String::new());
            lines.push("Current learning context:".to_string());
            lines.push(context.to_string());
        }

        lines.push(String::new());
        lines.push("Student message:".to_string());
        lines.push(non_blank(Some(ctx.message.as_str())).unwrap_or(DETAILS_NOT_AVAILABLE).to_string());

        lines.extend(
            [
                "",
                "Reply helpfully and concisely, adapt to the student's level using the history above,",
                "encourage them and suggest a concrete next step when it fits.",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omits_absent_sections() {
        let ctx = ChatContext {
            student_id: 3,
            message: "How do I study fractions?".into(),
            ..Default::default()
        };
        let prompt = ChatPrompt.compose(&ctx);
        assert!(prompt.contains("How do I study fractions?"));
        assert!(!prompt.contains("recent learning history"));
        assert!(!prompt.contains("Current learning context"));
    }
}
