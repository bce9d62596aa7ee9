use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};

use tutor_core::error::{GenerationError, GenerationResult};
use tutor_core::traits::GenerationStrategy;
use tutor_core::types::{
    AnalyticsSnapshot, ChatContext, ExplanationContext, Generated, GeneratedFeedback, HintContext,
    LearningRecommendation, MaterialsContext, SubmissionContext,
};

// Tries the primary strategy and retries the same capability on the
// secondary when it fails, tagging the secondary's value as fallback.
macro_rules! with_fallback {
    ($coordinator:ident, $capability:literal, $method:ident, $arg:expr) => {
        match $coordinator.primary.$method($arg).await {
            Ok(generated) => Ok(generated),
            Err(err) => {
                $coordinator.log_fallback($capability, &err);
                $coordinator
                    .secondary
                    .$method($arg)
                    .await
                    .map(Generated::into_fallback)
            }
        }
    };
}

/// Composes a primary strategy with a secondary one used whenever the
/// primary is unconfigured or unavailable.
///
/// The coordinator is itself a [`GenerationStrategy`], so every capability
/// goes through the same fallback path.
pub struct FallbackCoordinator {
    primary: Arc<dyn GenerationStrategy>,
    secondary: Arc<dyn GenerationStrategy>,
}

impl FallbackCoordinator {
    pub fn new(primary: Arc<dyn GenerationStrategy>, secondary: Arc<dyn GenerationStrategy>) -> Self {
        Self { primary, secondary }
    }

    fn log_fallback(&self, capability: &str, err: &GenerationError) {
        match err {
            GenerationError::ConfigurationMissing { .. } => info!(
                "{} generation: {}; using '{}'",
                capability,
                err,
                self.secondary.name()
            ),
            GenerationError::Unavailable { .. } => warn!(
                "{} generation failed: {}; falling back to '{}'",
                capability,
                err,
                self.secondary.name()
            ),
        }
    }
}

#[async_trait]
impl GenerationStrategy for FallbackCoordinator {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn generate_feedback(
        &self,
        ctx: &SubmissionContext,
    ) -> GenerationResult<Generated<GeneratedFeedback>> {
        with_fallback!(self, "feedback", generate_feedback, ctx)
    }

    async fn generate_hint(&self, ctx: &HintContext) -> GenerationResult<Generated<String>> {
        with_fallback!(self, "hint", generate_hint, ctx)
    }

    async fn generate_explanation(
        &self,
        ctx: &ExplanationContext,
    ) -> GenerationResult<Generated<String>> {
        with_fallback!(self, "explanation", generate_explanation, ctx)
    }

    async fn suggest_next_steps(
        &self,
        snapshot: &AnalyticsSnapshot,
    ) -> GenerationResult<Generated<Vec<LearningRecommendation>>> {
        with_fallback!(self, "recommendation", suggest_next_steps, snapshot)
    }

    async fn chat(&self, ctx: &ChatContext) -> GenerationResult<Generated<String>> {
        with_fallback!(self, "chat", chat, ctx)
    }

    async fn suggest_materials(
        &self,
        ctx: &MaterialsContext,
    ) -> GenerationResult<Generated<String>> {
        with_fallback!(self, "materials", suggest_materials, ctx)
    }
}
