use tutor_core::traits::PromptComposer;
use tutor_core::types::ExplanationContext;
use tutor_core::utils::non_blank;

use super::{or_default, DETAILS_NOT_AVAILABLE, TUTOR_FRAMING};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExplanationPrompt;

impl PromptComposer for ExplanationPrompt {
    type Context = ExplanationContext;

    fn compose(&self, ctx: &ExplanationContext) -> String {
        let mut lines = vec![
            TUTOR_FRAMING.to_string(),
            "The student is studying a document and has a question that needs explaining."
                .to_string(),
        ];

        let material = ctx.material.as_ref();
        match material.and_then(|m| non_blank(m.content.as_deref())) {
            Some(content) => {
                lines.push(String::new());
                lines.push("MATERIAL:".to_string());
                if let Some(name) = material.and_then(|m| non_blank(m.file_name.as_deref())) {
                    lines.push(format!("File: {}", name));
                }
                if let Some(pages) = material.and_then(|m| m.pages) {
                    lines.push(format!("Pages: {}", pages));
                }
                lines.push("Content:".to_string());
                lines.push(content.to_string());
            }
            None => {
                lines.push(String::new());
                lines.push(format!("MATERIAL: {}", DETAILS_NOT_AVAILABLE));
            }
        }

        if !ctx.previous.is_empty() {
            lines.push(String::new());
            lines.push("PREVIOUS QUESTIONS AND EXPLANATIONS:".to_string());
            for (index, exchange) in ctx.previous.iter().enumerate() {
                lines.push(format!("--- Question {} ---", index + 1));
                lines.push(format!(
                    "Question: {}",
                    or_default(exchange.question.as_deref(), DETAILS_NOT_AVAILABLE)
                ));
                lines.push(format!("Explanation: {}", exchange.explanation.trim()));
            }
            lines.push(
                "The student still does not fully understand this material; explain from a different angle or in more depth."
                    .to_string(),
            );
        }

        lines.push(String::new());
        lines.push("STUDENT QUESTION:".to_string());
        lines.push(or_default(ctx.student_question.as_deref(), "No question provided").to_string());

        lines.extend(
            [
                "",
                "Requirements:",
                "- Base the explanation on the material above when it is available",
                "- Keep it easy to understand and suited to the student's level",
                "- Do not repeat earlier explanations; add a new perspective",
                "- Illustrative examples are welcome",
                "- Encourage the student to keep thinking and asking questions",
                "- Return only the explanation text (no JSON)",
                "",
                "Explanation:",
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
    use tutor_core::types::{ExplanationExchange, MaterialContent};

    #[test]
    fn includes_material_and_history() {
        let ctx = ExplanationContext {
            student_question: Some("Why does ice float?".into()),
            material: Some(MaterialContent {
                file_name: Some("water.pdf".into()),
                pages: Some(4),
                content: Some("Ice is less dense than liquid water.".into()),
            }),
            previous: vec![ExplanationExchange {
                question: Some("What is density?".into()),
                explanation: "Mass per unit volume.".into(),
            }],
            ..Default::default()
        };
        let prompt = ExplanationPrompt.compose(&ctx);
        assert!(prompt.contains("File: water.pdf"));
        assert!(prompt.contains("Pages: 4"));
        assert!(prompt.contains("Ice is less dense"));
        assert!(prompt.contains("--- Question 1 ---"));
        assert!(prompt.contains("different angle"));
        assert!(prompt.contains("Why does ice float?"));
    }

    #[test]
    fn missing_material_uses_placeholder() {
        let prompt = ExplanationPrompt.compose(&ExplanationContext::default());
        assert!(prompt.contains("MATERIAL: (details not available)"));
        assert!(prompt.contains("No question provided"));
        assert!(!prompt.contains("PREVIOUS QUESTIONS"));
    }
}
