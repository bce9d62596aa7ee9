use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use serde_json::Value;

use tutor_core::error::{ChatError, GenerationError, GenerationResult};
use tutor_core::traits::{ChatClient, GenerationStrategy, PromptComposer};
use tutor_core::types::{
    AnalyticsSnapshot, ChatContext, ExplanationContext, Generated, GeneratedFeedback, HintContext,
    LearningRecommendation, MaterialsContext, SubmissionContext,
};
use tutor_core::utils::json_spans;

use crate::prompts::{
    ChatPrompt, ExplanationPrompt, FeedbackPrompt, HintPrompt, MaterialsPrompt,
    RecommendationPrompt,
};
use crate::rule_based::MAX_RECOMMENDATIONS;

pub const DEFAULT_FEEDBACK_HINT: &str = "Review your work and try again!";
pub const MISSING_FEEDBACK_TEXT: &str = "No feedback provided";
pub const MISSING_HINT: &str = "No hint provided";
pub const MISSING_NEXT_TOPIC: &str = "Next topic";
pub const MISSING_EXPLANATION: &str = "Keep learning!";
pub const UNPARSED_RECOMMENDATION_TOPIC: &str = "Review the material";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Generation backed by a [`ChatClient`].
///
/// Every call is bounded by the configured timeout. Client and timeout
/// failures surface as [`GenerationError`] so a coordinator can fall back;
/// unparseable model output degrades to defaults instead of failing.
pub struct LlmStrategy {
    client: Arc<dyn ChatClient>,
    timeout: Duration,
}

impl LlmStrategy {
    pub const NAME: &'static str = "llm";

    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self {
            client,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn complete(&self, task: &str, prompt: String) -> GenerationResult<String> {
        if !self.client.is_configured() {
            return Err(GenerationError::ConfigurationMissing {
                strategy: Self::NAME.to_string(),
                reason: "no API credential configured".to_string(),
            });
        }

        debug!("Requesting {} completion ({} prompt chars)", task, prompt.len());
        let outcome = tokio::time::timeout(self.timeout, self.client.chat(&prompt))
            .await
            .unwrap_or(Err(ChatError::Timeout(self.timeout)));

        match outcome {
            Ok(text) => {
                info!("Received {} completion ({} chars)", task, text.len());
                Ok(text)
            }
            Err(err) => Err(GenerationError::from_chat(Self::NAME, err)),
        }
    }
}

// First embedded span that parses as JSON and satisfies `accept`.
fn first_json_value(raw: &str, accept: impl Fn(&Value) -> bool) -> Option<Value> {
    json_spans(raw)
        .filter_map(|span| serde_json::from_str::<Value>(span).ok())
        .find(|value| accept(value))
}

/// Reads `{"feedbackText", "hint"}` from the first JSON object in `raw`.
pub fn parse_feedback(raw: &str) -> GeneratedFeedback {
    let parsed = first_json_value(raw, Value::is_object);

    match parsed {
        Some(object) => GeneratedFeedback {
            feedback_text: string_field(&object, "feedbackText", MISSING_FEEDBACK_TEXT),
            hint: string_field(&object, "hint", MISSING_HINT),
        },
        None => {
            debug!("Feedback completion carried no JSON object, using raw text");
            GeneratedFeedback {
                feedback_text: raw.trim().to_string(),
                hint: DEFAULT_FEEDBACK_HINT.to_string(),
            }
        }
    }
}

/// Reads up to three `{"nextTopic", "explanation"}` items from the first JSON
/// array (or single object) in `raw`.
pub fn parse_recommendations(raw: &str, student_id: i64) -> Vec<LearningRecommendation> {
    let parsed = first_json_value(raw, |value| match value {
        Value::Array(items) => items.iter().any(Value::is_object),
        Value::Object(_) => true,
        _ => false,
    });
    let items = match parsed {
        Some(Value::Array(items)) => items,
        Some(object @ Value::Object(_)) => vec![object],
        _ => {
            debug!("Recommendation completion carried no JSON, wrapping raw text");
            return vec![LearningRecommendation {
                student_id,
                next_topic: UNPARSED_RECOMMENDATION_TOPIC.to_string(),
                explanation: raw.trim().to_string(),
            }];
        }
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .take(MAX_RECOMMENDATIONS)
        .map(|item| LearningRecommendation {
            student_id,
            next_topic: string_field(item, "nextTopic", MISSING_NEXT_TOPIC),
            explanation: string_field(item, "explanation", MISSING_EXPLANATION),
        })
        .collect()
}

fn string_field(object: &Value, key: &str, default: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

#[async_trait]
impl GenerationStrategy for LlmStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn generate_feedback(
        &self,
        ctx: &SubmissionContext,
    ) -> GenerationResult<Generated<GeneratedFeedback>> {
        let raw = self.complete("feedback", FeedbackPrompt.compose(ctx)).await?;
        Ok(Generated::primary(parse_feedback(&raw)))
    }

    async fn generate_hint(&self, ctx: &HintContext) -> GenerationResult<Generated<String>> {
        let raw = self.complete("hint", HintPrompt.compose(ctx)).await?;
        Ok(Generated::primary(raw))
    }

    async fn generate_explanation(
        &self,
        ctx: &ExplanationContext,
    ) -> GenerationResult<Generated<String>> {
        let raw = self
            .complete("explanation", ExplanationPrompt.compose(ctx))
            .await?;
        Ok(Generated::primary(raw))
    }

    async fn suggest_next_steps(
        &self,
        snapshot: &AnalyticsSnapshot,
    ) -> GenerationResult<Generated<Vec<LearningRecommendation>>> {
        let raw = self
            .complete("recommendation", RecommendationPrompt.compose(snapshot))
            .await?;
        Ok(Generated::primary(parse_recommendations(
            &raw,
            snapshot.student_id,
        )))
    }

    async fn chat(&self, ctx: &ChatContext) -> GenerationResult<Generated<String>> {
        let raw = self.complete("chat", ChatPrompt.compose(ctx)).await?;
        Ok(Generated::primary(raw))
    }

    async fn suggest_materials(
        &self,
        ctx: &MaterialsContext,
    ) -> GenerationResult<Generated<String>> {
        let raw = self.complete("materials", MaterialsPrompt.compose(ctx)).await?;
        Ok(Generated::primary(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_json_is_read_from_prose() {
        let raw = "Here is my evaluation:\n{\"feedbackText\": \"Great job!\", \"hint\": \"Try harder ones\"}\nGood luck.";
        let feedback = parse_feedback(raw);
        assert_eq!(feedback.feedback_text, "Great job!");
        assert_eq!(feedback.hint, "Try harder ones");
    }

    #[test]
    fn feedback_missing_fields_get_defaults() {
        let feedback = parse_feedback("{\"feedbackText\": \"Nice\"}");
        assert_eq!(feedback.feedback_text, "Nice");
        assert_eq!(feedback.hint, MISSING_HINT);

        let empty = parse_feedback("{}");
        assert_eq!(empty.feedback_text, MISSING_FEEDBACK_TEXT);
    }

    #[test]
    fn unparseable_feedback_keeps_raw_text() {
        let feedback = parse_feedback("  Well done, your reasoning is sound.  ");
        assert_eq!(feedback.feedback_text, "Well done, your reasoning is sound.");
        assert_eq!(feedback.hint, DEFAULT_FEEDBACK_HINT);
    }

    #[test]
    fn feedback_skips_bracketed_prose_before_payload() {
        let raw = "Verdict [partial]: {\"feedbackText\": \"Close, check the sign.\", \"hint\": \"Recheck step 2\"}";
        let feedback = parse_feedback(raw);
        assert_eq!(feedback.feedback_text, "Close, check the sign.");
        assert_eq!(feedback.hint, "Recheck step 2");
    }

    #[test]
    fn recommendations_skip_bracketed_prose_before_payload() {
        let raw = "Based on your data [see above] and note [1], here:\n\
                   [{\"nextTopic\": \"Algebra\", \"explanation\": \"Review equations\"}]";
        let recs = parse_recommendations(raw, 1);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].next_topic, "Algebra");
        assert_eq!(recs[0].explanation, "Review equations");
    }

    #[test]
    fn recommendations_are_truncated_to_three() {
        let raw = r#"Sure: [
            {"nextTopic": "A", "explanation": "a"},
            {"nextTopic": "B"},
            {"explanation": "c"},
            {"nextTopic": "D", "explanation": "d"}
        ]"#;
        let recs = parse_recommendations(raw, 4);
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[1].explanation, MISSING_EXPLANATION);
        assert_eq!(recs[2].next_topic, MISSING_NEXT_TOPIC);
        assert!(recs.iter().all(|r| r.student_id == 4));
    }

    #[test]
    fn unparseable_recommendations_wrap_raw_text() {
        let recs = parse_recommendations("Focus on algebra this week.", 9);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].next_topic, UNPARSED_RECOMMENDATION_TOPIC);
        assert_eq!(recs[0].explanation, "Focus on algebra this week.");
    }

    #[test]
    fn empty_array_yields_no_recommendations() {
        assert!(parse_recommendations("[]", 1).is_empty());
    }
}
