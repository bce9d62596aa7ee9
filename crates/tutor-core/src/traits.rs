use anyhow::Result;
use async_trait::async_trait;

use crate::error::{ChatError, GenerationResult};
use crate::types::{
    AnalyticsSnapshot, ChatContext, CourseMaterial, ExplanationContext, ExplanationRecord,
    FeedbackRecord, Generated, GeneratedFeedback, HintContext, HintRecord, LearningRecommendation,
    MaterialContent, MaterialsContext, NewExplanation, NewFeedback, NewHint, SubmissionContext,
    TestContext, TopicAggregate,
};

/// Single-shot chat completion against a language model.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// False when no credential or endpoint is available; callers should not
    /// attempt `chat` in that case.
    fn is_configured(&self) -> bool;

    async fn chat(&self, prompt: &str) -> Result<String, ChatError>;
}

/// Text generation for every tutoring capability.
///
/// Implementations return [`Generated::primary`] values; the fallback
/// coordinator re-tags values that came from its secondary strategy.
#[async_trait]
pub trait GenerationStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_feedback(
        &self,
        ctx: &SubmissionContext,
    ) -> GenerationResult<Generated<GeneratedFeedback>>;

    async fn generate_hint(&self, ctx: &HintContext) -> GenerationResult<Generated<String>>;

    async fn generate_explanation(
        &self,
        ctx: &ExplanationContext,
    ) -> GenerationResult<Generated<String>>;

    /// At most three recommendations.
    async fn suggest_next_steps(
        &self,
        snapshot: &AnalyticsSnapshot,
    ) -> GenerationResult<Generated<Vec<LearningRecommendation>>>;

    async fn chat(&self, ctx: &ChatContext) -> GenerationResult<Generated<String>>;

    async fn suggest_materials(&self, ctx: &MaterialsContext)
        -> GenerationResult<Generated<String>>;
}

/// Renders a task-specific prompt. Composition is pure and never fails.
pub trait PromptComposer: Send + Sync {
    type Context;

    fn compose(&self, ctx: &Self::Context) -> String;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn append_feedback(&self, feedback: NewFeedback) -> Result<FeedbackRecord>;

    /// Oldest first.
    async fn feedback_for_student(&self, student_id: i64) -> Result<Vec<FeedbackRecord>>;

    /// Newest first, at most `limit` records.
    async fn recent_feedback(&self, student_id: i64, limit: usize) -> Result<Vec<FeedbackRecord>>;

    /// Returns `(total, correct)` where correct counts `is_correct == Some(true)`.
    async fn attempt_counts(&self, student_id: i64) -> Result<(u64, u64)>;

    /// Topics of records whose `is_correct` equals `correct`, by descending
    /// count then topic name. Records without a topic are skipped.
    async fn topic_aggregates(&self, student_id: i64, correct: bool)
        -> Result<Vec<TopicAggregate>>;

    async fn latest_feedback(&self, student_id: i64) -> Result<Option<FeedbackRecord>> {
        Ok(self.recent_feedback(student_id, 1).await?.into_iter().next())
    }
}

#[async_trait]
pub trait HintStore: Send + Sync {
    async fn append_hint(&self, hint: NewHint) -> Result<HintRecord>;

    /// Creation order, oldest first.
    async fn hints_for(&self, student_id: i64, question_id: i64) -> Result<Vec<HintRecord>>;
}

#[async_trait]
pub trait ExplanationStore: Send + Sync {
    async fn append_explanation(&self, explanation: NewExplanation) -> Result<ExplanationRecord>;

    /// Creation order, oldest first.
    async fn explanations_for(
        &self,
        student_id: i64,
        material_id: i64,
    ) -> Result<Vec<ExplanationRecord>>;
}

#[async_trait]
pub trait MaterialProvider: Send + Sync {
    async fn material_content(&self, material_id: i64) -> Result<Option<MaterialContent>>;

    async fn course_materials(&self, course_id: i64) -> Result<Vec<CourseMaterial>>;
}

#[async_trait]
pub trait TestContextProvider: Send + Sync {
    async fn test_context(
        &self,
        course_id: i64,
        assessment_id: i64,
        student_id: Option<i64>,
    ) -> Result<Option<TestContext>>;
}
