use tutor_core::traits::PromptComposer;
use tutor_core::types::{CourseMaterial, HintContext};
use tutor_core::utils::non_blank;

use super::{or_default, DETAILS_NOT_AVAILABLE, NOT_SPECIFIED, TUTOR_FRAMING};

#[derive(Debug, Clone, Copy, Default)]
pub struct HintPrompt;

impl PromptComposer for HintPrompt {
    type Context = HintContext;

    fn compose(&self, ctx: &HintContext) -> String {
        let mut lines = vec![
            TUTOR_FRAMING.to_string(),
            "The student is struggling with a question and needs a hint.".to_string(),
            String::new(),
            "Question information:".to_string(),
            format!("- Subject: {}", or_default(ctx.subject.as_deref(), NOT_SPECIFIED)),
            format!("- Topic: {}", or_default(ctx.topic.as_deref(), NOT_SPECIFIED)),
            format!("- Difficulty: {}", or_default(ctx.difficulty.as_deref(), "Medium")),
            format!(
                "- Answer: {}",
                or_default(ctx.correct_answer.as_deref(), "Not provided")
            ),
            format!(
                "- Question: {}",
                ctx.resolved_question_text().unwrap_or(DETAILS_NOT_AVAILABLE)
            ),
        ];

        if !ctx.previous_hints.is_empty() {
            lines.push(String::new());
            lines.push("Hints already given to the student:".to_string());
            for (index, hint) in ctx.previous_hints.iter().enumerate() {
                lines.push(format!("{}. {}", index + 1, hint.trim()));
            }
            lines.push(
                "The student still has not found the answer; build on the earlier hints with a new one."
                    .to_string(),
            );
        }

        let materials: Vec<String> = ctx
            .materials
            .iter()
            .enumerate()
            .filter_map(|(index, material)| material_entry(index + 1, material))
            .collect();
        if !materials.is_empty() {
            lines.push(String::new());
            lines.push("Related course materials:".to_string());
            lines.extend(materials);
            lines.push("Use the materials above so the hint matches the course content.".to_string());
        }

        lines.push(String::new());
        lines.push("Requirements:".to_string());
        lines.push(format!("- Hint level: {}", ctx.level().instruction()));
        lines.extend(
            [
                "- Do NOT reveal the answer directly",
                "- Help the student find the answer on their own",
                "- If this is a follow-up hint, do not repeat earlier hints; be more specific",
                "- Use a friendly tone with fitting emoji",
                "- Return only the hint text (no JSON)",
                "",
                "Hint:",
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        lines.join("\n")
    }
}

fn material_entry(number: usize, material: &CourseMaterial) -> Option<String> {
    let title = non_blank(material.title.as_deref());
    let content = non_blank(material.content_or_url.as_deref());
    let metadata = non_blank(material.metadata.as_deref());
    if title.is_none() && content.is_none() && metadata.is_none() {
        return None;
    }

    let mut entry = format!("{}. {}", number, title.unwrap_or("Untitled material"));
    if let Some(kind) = non_blank(material.kind.as_deref()) {
        entry.push_str(&format!(" ({})", kind));
    }
    if let Some(content) = content {
        entry.push_str(&format!("\n   Content: {}", content));
    }
    if let Some(metadata) = metadata {
        entry.push_str(&format!("\n   Metadata: {}", metadata));
    }
    Some(entry)
}
