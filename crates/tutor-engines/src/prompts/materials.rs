use tutor_core::traits::PromptComposer;
use tutor_core::types::MaterialsContext;

use super::{or_default, NO_DATA_YET};

#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialsPrompt;

impl PromptComposer for MaterialsPrompt {
    type Context = MaterialsContext;

    fn compose(&self, ctx: &MaterialsContext) -> String {
        let weak = if ctx.weak_topics.is_empty() {
            NO_DATA_YET.to_string()
        } else {
            ctx.weak_topics.join(", ")
        };

        [
            "You are an AI learning advisor in an Intelligent Tutoring System.".to_string(),
            format!("Suggest study materials for student {}.", ctx.student_id),
            String::new(),
            format!(
                "- Current topic: {}",
                or_default(ctx.current_topic.as_deref(), "the current topic")
            ),
            format!("- Topics the student struggles with: {}", weak),
            String::new(),
            "Return a short numbered list (3-5 items) mixing theory, worked examples and practice,"
                .to_string(),
            "prioritising the weak topics. Keep each item to one line.".to_string(),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_weak_topics() {
        let ctx = MaterialsContext {
            student_id: 2,
            current_topic: Some("Fractions".into()),
            weak_topics: vec!["Decimals".into(), "Ratios".into()],
        };
        let prompt = MaterialsPrompt.compose(&ctx);
        assert!(prompt.contains("- Current topic: Fractions"));
        assert!(prompt.contains("Decimals, Ratios"));
    }
}
