use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use log::{debug, info, warn};
use tokio::sync::Mutex;

use tutor_core::classifier::is_exact_match;
use tutor_core::config::AnalyticsConfig;
use tutor_core::error::{TutorError, TutorResult};
use tutor_core::traits::{
    ExplanationStore, FeedbackStore, GenerationStrategy, HintStore, MaterialProvider,
    TestContextProvider,
};
use tutor_core::types::{
    ChatContext, CourseMaterial, ExplanationContext, ExplanationExchange, ExplanationRecord,
    FeedbackRecord, Generated, HintContext, MaterialContent, MaterialsContext, NewExplanation,
    NewFeedback, NewHint, StudentProfile, SubmissionContext, TestContext,
};
use tutor_core::utils::non_blank;
use tutor_engines::FallbackCoordinator;

use crate::analytics::PerformanceAnalytics;
use crate::api::{
    ChatRequest, ChatResponse, ExplanationRequest, ExplanationResponse, FeedbackRequest,
    FeedbackResponse, HintHistoryEntry, HintRequest, HintResponse, RecommendationsResponse,
};
use crate::planner::RecommendationPlanner;

const SUGGESTION_WEAK_TOPICS: usize = 3;

type HintKey = (i64, i64);

/// The tutoring operations: generation goes through the fallback
/// coordinator and every generated artefact is appended to its store.
pub struct TutorService {
    coordinator: Arc<FallbackCoordinator>,
    feedback: Arc<dyn FeedbackStore>,
    hints: Arc<dyn HintStore>,
    explanations: Arc<dyn ExplanationStore>,
    analytics: Arc<PerformanceAnalytics>,
    planner: RecommendationPlanner,
    materials: Option<Arc<dyn MaterialProvider>>,
    tests: Option<Arc<dyn TestContextProvider>>,
    recent_history_limit: usize,
    // Serializes count -> generate -> append per (student, question).
    hint_locks: Mutex<HashMap<HintKey, Arc<Mutex<()>>>>,
}

impl TutorService {
    /// Builds a service whose three record stores are all backed by `store`.
    pub fn new<S>(
        coordinator: Arc<FallbackCoordinator>,
        store: Arc<S>,
        config: &AnalyticsConfig,
    ) -> Self
    where
        S: FeedbackStore + HintStore + ExplanationStore + 'static,
    {
        Self::from_stores(coordinator, store.clone(), store.clone(), store, config)
    }

    pub fn from_stores(
        coordinator: Arc<FallbackCoordinator>,
        feedback: Arc<dyn FeedbackStore>,
        hints: Arc<dyn HintStore>,
        explanations: Arc<dyn ExplanationStore>,
        config: &AnalyticsConfig,
    ) -> Self {
        let analytics = Arc::new(PerformanceAnalytics::new(
            feedback.clone(),
            config.recent_history_limit,
        ));
        let planner = RecommendationPlanner::new(analytics.clone(), coordinator.clone());
        Self {
            coordinator,
            feedback,
            hints,
            explanations,
            analytics,
            planner,
            materials: None,
            tests: None,
            recent_history_limit: config.recent_history_limit,
            hint_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_material_provider(mut self, provider: Arc<dyn MaterialProvider>) -> Self {
        self.materials = Some(provider);
        self
    }

    pub fn with_test_context_provider(mut self, provider: Arc<dyn TestContextProvider>) -> Self {
        self.tests = Some(provider);
        self
    }

    pub async fn generate_feedback(&self, request: FeedbackRequest) -> TutorResult<FeedbackResponse> {
        let test = self
            .fetch_test_context(request.course_id, request.assessment_id, request.student_id)
            .await;
        let is_correct = is_exact_match(
            request.student_answer.as_deref(),
            request.correct_answer.as_deref(),
        );

        let ctx = SubmissionContext {
            student_id: request.student_id,
            question_id: request.question_id,
            question_text: request.question_text,
            student_answer: request.student_answer,
            correct_answer: request.correct_answer,
            topic: request.topic,
            difficulty: request.difficulty,
            subject: request.subject,
            test,
        };
        let generated = self.coordinator.generate_feedback(&ctx).await?;

        let record = self
            .feedback
            .append_feedback(NewFeedback {
                student_id: ctx.student_id,
                question_id: ctx.question_id,
                feedback_text: generated.value.feedback_text,
                hint: Some(generated.value.hint),
                topic: ctx.topic,
                subject: ctx.subject,
                difficulty: ctx.difficulty,
                is_correct: Some(is_correct),
            })
            .await
            .context("failed to record feedback")?;

        info!(
            "Feedback {} for student {} question {} (correct: {}, {})",
            record.id, record.student_id, record.question_id, is_correct, generated.source
        );

        Ok(FeedbackResponse {
            id: record.id,
            feedback_text: record.feedback_text,
            hint: record.hint.unwrap_or_default(),
            is_correct,
            source: generated.source,
        })
    }

    pub async fn generate_hint(&self, request: HintRequest) -> TutorResult<HintResponse> {
        let key = (request.student_id, request.question_id);
        let lock = self.hint_lock(key).await;
        let result = {
            let _guard = lock.lock().await;
            self.generate_hint_locked(request).await
        };
        self.release_hint_lock(key, lock).await;
        result
    }

    async fn generate_hint_locked(&self, request: HintRequest) -> TutorResult<HintResponse> {
        let previous_hints: Vec<String> = self
            .hints
            .hints_for(request.student_id, request.question_id)
            .await
            .context("failed to read previous hints")?
            .into_iter()
            .map(|h| h.hint)
            .collect();
        let materials = self.fetch_course_materials(request.course_id).await;
        let test = self
            .fetch_test_context(request.course_id, request.assessment_id, request.student_id)
            .await;

        let ctx = HintContext {
            student_id: request.student_id,
            question_id: request.question_id,
            question_text: request.question_text,
            correct_answer: request.correct_answer,
            topic: request.topic,
            difficulty: request.difficulty,
            subject: request.subject,
            previous_hints,
            materials,
            test,
        };
        let level = ctx.level();
        let hint_count = ctx.previous_hints.len() as u64 + 1;
        debug!(
            "Hint #{} for student {} question {} at level {}",
            hint_count, ctx.student_id, ctx.question_id, level
        );

        let generated = self.coordinator.generate_hint(&ctx).await?;
        let record = self
            .hints
            .append_hint(NewHint {
                student_id: ctx.student_id,
                question_id: ctx.question_id,
                hint: generated.value,
                subject: ctx.subject,
                topic: ctx.topic,
                difficulty: ctx.difficulty,
            })
            .await
            .context("failed to record hint")?;

        Ok(HintResponse {
            hint: record.hint,
            hint_count,
            level,
            created_at: record.created_at,
            source: generated.source,
        })
    }

    async fn hint_lock(&self, key: HintKey) -> Arc<Mutex<()>> {
        let mut locks = self.hint_locks.lock().await;
        locks.entry(key).or_default().clone()
    }

    async fn release_hint_lock(&self, key: HintKey, lock: Arc<Mutex<()>>) {
        let mut locks = self.hint_locks.lock().await;
        // One reference in the map plus ours: nobody else is waiting.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&key);
        }
    }

    pub async fn generate_explanation(
        &self,
        request: ExplanationRequest,
    ) -> TutorResult<ExplanationResponse> {
        let material = self.fetch_material_content(request.material_id).await;
        let previous = self
            .explanations
            .explanations_for(request.student_id, request.material_id)
            .await
            .context("failed to read previous explanations")?
            .into_iter()
            .map(|r| ExplanationExchange {
                question: r.student_question,
                explanation: r.explanation,
            })
            .collect();

        let ctx = ExplanationContext {
            student_id: request.student_id,
            material_id: request.material_id,
            student_question: request.student_question,
            material,
            previous,
        };
        let generated = self.coordinator.generate_explanation(&ctx).await?;

        let record = self
            .explanations
            .append_explanation(NewExplanation {
                student_id: ctx.student_id,
                material_id: ctx.material_id,
                student_question: ctx.student_question,
                explanation: generated.value,
            })
            .await
            .context("failed to record explanation")?;

        Ok(ExplanationResponse {
            id: record.id,
            explanation: record.explanation,
            source: generated.source,
        })
    }

    pub async fn get_recommendations(&self, student_id: i64) -> TutorResult<RecommendationsResponse> {
        let planned = self.planner.plan(student_id).await?;
        Ok(RecommendationsResponse {
            student_id,
            recommendations: planned.value,
            source: planned.source,
        })
    }

    pub async fn get_hint_history(
        &self,
        student_id: i64,
        question_id: i64,
    ) -> TutorResult<Vec<HintHistoryEntry>> {
        let hints = self.hints.hints_for(student_id, question_id).await?;
        Ok(hints
            .into_iter()
            .zip(1u64..)
            .map(|(record, hint_count)| HintHistoryEntry {
                hint: record.hint,
                hint_count,
                created_at: record.created_at,
            })
            .collect())
    }

    pub async fn get_feedback_history(&self, student_id: i64) -> TutorResult<Vec<FeedbackRecord>> {
        Ok(self.feedback.feedback_for_student(student_id).await?)
    }

    pub async fn get_latest_feedback(&self, student_id: i64) -> TutorResult<FeedbackRecord> {
        self.feedback
            .latest_feedback(student_id)
            .await?
            .ok_or_else(|| TutorError::NotFound(format!("no feedback for student {}", student_id)))
    }

    pub async fn get_explanation_history(
        &self,
        student_id: i64,
        material_id: i64,
    ) -> TutorResult<Vec<ExplanationRecord>> {
        Ok(self
            .explanations
            .explanations_for(student_id, material_id)
            .await?)
    }

    pub async fn get_student_profile(&self, student_id: i64) -> TutorResult<StudentProfile> {
        Ok(self.analytics.profile(student_id).await?)
    }

    pub async fn chat(&self, request: ChatRequest) -> TutorResult<ChatResponse> {
        let recent_history = self
            .feedback
            .recent_feedback(request.student_id, self.recent_history_limit)
            .await?;
        let ctx = ChatContext {
            student_id: request.student_id,
            message: request.message,
            learning_context: request.learning_context,
            recent_history,
        };
        let reply = self.coordinator.chat(&ctx).await?;

        let suggested_materials = match non_blank(request.current_topic.as_deref()) {
            Some(topic) => Some(
                self.suggest_materials(request.student_id, Some(topic))
                    .await?
                    .value,
            ),
            None => None,
        };

        Ok(ChatResponse {
            reply: reply.value,
            suggested_materials,
            source: reply.source,
        })
    }

    pub async fn suggest_materials(
        &self,
        student_id: i64,
        topic: Option<&str>,
    ) -> TutorResult<Generated<String>> {
        let weak_topics = self
            .analytics
            .weak_topic_names(student_id, SUGGESTION_WEAK_TOPICS)
            .await?;
        let ctx = MaterialsContext {
            student_id,
            current_topic: non_blank(topic).map(str::to_string),
            weak_topics,
        };
        Ok(self.coordinator.suggest_materials(&ctx).await?)
    }

    async fn fetch_test_context(
        &self,
        course_id: Option<i64>,
        assessment_id: Option<i64>,
        student_id: i64,
    ) -> Option<TestContext> {
        let (provider, course_id, assessment_id) = match (&self.tests, course_id, assessment_id) {
            (Some(provider), Some(course), Some(assessment)) => (provider, course, assessment),
            _ => return None,
        };
        match provider
            .test_context(course_id, assessment_id, Some(student_id))
            .await
        {
            Ok(test) => test,
            Err(e) => {
                warn!(
                    "Test context for course {} assessment {} unavailable: {}",
                    course_id, assessment_id, e
                );
                None
            }
        }
    }

    async fn fetch_course_materials(&self, course_id: Option<i64>) -> Vec<CourseMaterial> {
        let (provider, course_id) = match (&self.materials, course_id) {
            (Some(provider), Some(course)) => (provider, course),
            _ => return Vec::new(),
        };
        provider
            .course_materials(course_id)
            .await
            .unwrap_or_else(|e| {
                warn!("Course materials for course {} unavailable: {}", course_id, e);
                Vec::new()
            })
    }

    async fn fetch_material_content(&self, material_id: i64) -> Option<MaterialContent> {
        let provider = self.materials.as_ref()?;
        match provider.material_content(material_id).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Material {} unavailable: {}", material_id, e);
                None
            }
        }
    }
}
