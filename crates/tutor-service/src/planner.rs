use std::sync::Arc;

use log::info;

use tutor_core::error::TutorResult;
use tutor_core::traits::GenerationStrategy;
use tutor_core::types::{Generated, LearningRecommendation};
use tutor_engines::FallbackCoordinator;

use crate::analytics::PerformanceAnalytics;

/// Turns a performance snapshot into next-step recommendations.
pub struct RecommendationPlanner {
    analytics: Arc<PerformanceAnalytics>,
    coordinator: Arc<FallbackCoordinator>,
}

impl RecommendationPlanner {
    pub fn new(analytics: Arc<PerformanceAnalytics>, coordinator: Arc<FallbackCoordinator>) -> Self {
        Self {
            analytics,
            coordinator,
        }
    }

    pub async fn plan(&self, student_id: i64) -> TutorResult<Generated<Vec<LearningRecommendation>>> {
        let snapshot = self.analytics.snapshot(student_id).await?;
        let recommendations = self.coordinator.suggest_next_steps(&snapshot).await?;
        info!(
            "Planned {} recommendation(s) for student {} ({})",
            recommendations.value.len(),
            student_id,
            recommendations.source
        );
        Ok(recommendations)
    }
}
