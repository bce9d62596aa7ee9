use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use tutor_core::config::{AnalyticsConfig, LlmConfig};
use tutor_core::error::{ChatError, TutorError};
use tutor_core::hint_level::HintLevel;
use tutor_core::traits::{ChatClient, FeedbackStore, MaterialProvider, TestContextProvider};
use tutor_core::types::{
    CourseMaterial, GenerationSource, MaterialContent, NewFeedback, TestContext, TestQuestion,
};
use tutor_engines::{create_coordinator, FallbackCoordinator, LlmStrategy, RuleBasedStrategy};
use tutor_service::{
    ChatRequest, ExplanationRequest, FeedbackRequest, HintRequest, TutorService,
};
use tutor_storage::MemoryRecordStore;

fn offline_service() -> (TutorService, Arc<MemoryRecordStore>) {
    let store = Arc::new(MemoryRecordStore::new());
    let coordinator = Arc::new(create_coordinator(&LlmConfig::default()));
    let service = TutorService::new(coordinator, store.clone(), &AnalyticsConfig::default());
    (service, store)
}

async fn seed(store: &MemoryRecordStore, student_id: i64, topic: &str, correct: bool, n: usize) -> Result<()> {
    for _ in 0..n {
        store
            .append_feedback(NewFeedback {
                student_id,
                question_id: 1,
                feedback_text: "seeded".into(),
                topic: Some(topic.into()),
                is_correct: Some(correct),
                ..Default::default()
            })
            .await?;
    }
    Ok(())
}

fn hint_request(student_id: i64, question_id: i64) -> HintRequest {
    HintRequest {
        student_id,
        question_id,
        question_text: Some("Solve 2x + 3 = 7".into()),
        correct_answer: Some("x = 2".into()),
        topic: Some("Algebra".into()),
        ..Default::default()
    }
}

struct ReplyClient(&'static str);

#[async_trait]
impl ChatClient for ReplyClient {
    fn is_configured(&self) -> bool {
        true
    }

    async fn chat(&self, _prompt: &str) -> Result<String, ChatError> {
        Ok(self.0.to_string())
    }
}

struct CourseService {
    reachable: bool,
}

#[async_trait]
impl MaterialProvider for CourseService {
    async fn material_content(&self, material_id: i64) -> Result<Option<MaterialContent>> {
        if !self.reachable {
            return Err(anyhow!("course service down"));
        }
        Ok(Some(MaterialContent {
            file_name: Some(format!("chapter-{}.pdf", material_id)),
            pages: Some(12),
            content: Some("Vectors have magnitude and direction.".into()),
        }))
    }

    async fn course_materials(&self, _course_id: i64) -> Result<Vec<CourseMaterial>> {
        if !self.reachable {
            return Err(anyhow!("course service down"));
        }
        Ok(vec![CourseMaterial {
            title: Some("Linear equations".into()),
            ..Default::default()
        }])
    }
}

#[async_trait]
impl TestContextProvider for CourseService {
    async fn test_context(
        &self,
        _course_id: i64,
        _assessment_id: i64,
        student_id: Option<i64>,
    ) -> Result<Option<TestContext>> {
        if !self.reachable {
            return Err(anyhow!("course service down"));
        }
        Ok(Some(TestContext {
            student_id,
            questions: vec![TestQuestion {
                question_id: 5,
                question_text: Some("Solve 2x + 3 = 7".into()),
                ..Default::default()
            }],
            ..Default::default()
        }))
    }
}

#[tokio::test]
async fn new_student_gets_start_learning() -> Result<()> {
    let (service, _) = offline_service();
    let response = service.get_recommendations(42).await?;
    assert_eq!(response.source, GenerationSource::Fallback);
    assert_eq!(response.recommendations.len(), 1);
    assert_eq!(response.recommendations[0].next_topic, "Start learning");
    Ok(())
}

#[tokio::test]
async fn struggling_student_reviews_weakest_topic() -> Result<()> {
    let (service, store) = offline_service();
    seed(&store, 1, "Geometry", true, 3).await?;
    seed(&store, 1, "Algebra", false, 5).await?;
    seed(&store, 1, "Fractions", false, 2).await?;

    let response = service.get_recommendations(1).await?;
    let top = &response.recommendations[0];
    assert!(top.next_topic.contains("Algebra"));
    assert!(top.next_topic.starts_with("Review"));
    assert!(response.recommendations.len() <= 3);
    Ok(())
}

#[tokio::test]
async fn strong_student_advances() -> Result<()> {
    let (service, store) = offline_service();
    seed(&store, 2, "Geometry", true, 8).await?;
    seed(&store, 2, "Algebra", true, 1).await?;
    seed(&store, 2, "Algebra", false, 1).await?;

    let response = service.get_recommendations(2).await?;
    let top = &response.recommendations[0];
    assert!(top.next_topic.contains("Geometry"));
    assert!(top.explanation.to_lowercase().contains("challenge"));
    Ok(())
}

#[tokio::test]
async fn trailing_whitespace_answer_is_correct() -> Result<()> {
    let (service, _) = offline_service();
    let response = service
        .generate_feedback(FeedbackRequest {
            student_id: 3,
            question_id: 9,
            question_text: Some("What is 6 x 7?".into()),
            student_answer: Some("42 ".into()),
            correct_answer: Some("42".into()),
            topic: Some("Multiplication".into()),
            ..Default::default()
        })
        .await?;
    assert!(response.is_correct);
    assert_eq!(response.source, GenerationSource::Fallback);
    assert!(!response.feedback_text.is_empty());

    let latest = service.get_latest_feedback(3).await?;
    assert_eq!(latest.id, response.id);
    assert_eq!(latest.is_correct, Some(true));
    assert_eq!(latest.hint.as_deref(), Some(response.hint.as_str()));
    Ok(())
}

#[tokio::test]
async fn hints_escalate_per_question() -> Result<()> {
    let (service, _) = offline_service();

    let first = service.generate_hint(hint_request(1, 5)).await?;
    assert_eq!(first.hint_count, 1);
    assert_eq!(first.level, HintLevel::General);

    let second = service.generate_hint(hint_request(1, 5)).await?;
    assert_eq!(second.hint_count, 2);
    assert_eq!(second.level, HintLevel::Directional);

    let third = service.generate_hint(hint_request(1, 5)).await?;
    assert_eq!(third.level, HintLevel::Detailed);

    let other = service.generate_hint(hint_request(1, 6)).await?;
    assert_eq!(other.hint_count, 1);
    assert_eq!(other.level, HintLevel::General);

    let history = service.get_hint_history(1, 5).await?;
    assert_eq!(
        history.iter().map(|h| h.hint_count).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(history[0].hint, first.hint);
    assert_eq!(history[2].hint, third.hint);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_hints_observe_distinct_counts() -> Result<()> {
    let (service, _) = offline_service();
    let service = Arc::new(service);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.generate_hint(hint_request(7, 1)).await })
        })
        .collect();

    let mut counts = Vec::new();
    for handle in handles {
        counts.push(handle.await??.hint_count);
    }
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(service.get_hint_history(7, 1).await?.len(), 6);
    Ok(())
}

#[tokio::test]
async fn latest_feedback_is_not_found_without_history() -> Result<()> {
    let (service, _) = offline_service();
    let err = service.get_latest_feedback(99).await.unwrap_err();
    assert!(matches!(err, TutorError::NotFound(_)));
    assert!(service.get_feedback_history(99).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn explanations_change_angle_across_requests() -> Result<()> {
    let (service, _) = offline_service();
    let service = service.with_material_provider(Arc::new(CourseService { reachable: true }));
    let request = ExplanationRequest {
        student_id: 1,
        material_id: 3,
        student_question: Some("What is a vector?".into()),
    };

    let first = service.generate_explanation(request.clone()).await?;
    let second = service.generate_explanation(request).await?;
    assert_ne!(first.explanation, second.explanation);

    let history = service.get_explanation_history(1, 3).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, first.id);
    assert_eq!(history[1].explanation, second.explanation);
    Ok(())
}

#[tokio::test]
async fn unreachable_upstream_is_treated_as_absent() -> Result<()> {
    let (service, _) = offline_service();
    let upstream = Arc::new(CourseService { reachable: false });
    let service = service
        .with_material_provider(upstream.clone())
        .with_test_context_provider(upstream);

    let hint = service
        .generate_hint(HintRequest {
            course_id: Some(1),
            assessment_id: Some(2),
            ..hint_request(1, 5)
        })
        .await?;
    assert_eq!(hint.hint_count, 1);

    let feedback = service
        .generate_feedback(FeedbackRequest {
            student_id: 1,
            question_id: 5,
            course_id: Some(1),
            assessment_id: Some(2),
            ..Default::default()
        })
        .await?;
    assert!(!feedback.is_correct);

    let explanation = service
        .generate_explanation(ExplanationRequest {
            student_id: 1,
            material_id: 3,
            student_question: Some("Why?".into()),
        })
        .await?;
    assert!(explanation.explanation.contains("Why?"));
    Ok(())
}

#[tokio::test]
async fn chat_suggests_materials_only_with_a_topic() -> Result<()> {
    let (service, store) = offline_service();
    seed(&store, 4, "Fractions", false, 2).await?;

    let plain = service
        .chat(ChatRequest {
            student_id: 4,
            message: "How do I add fractions?".into(),
            ..Default::default()
        })
        .await?;
    assert!(plain.suggested_materials.is_none());
    assert!(plain.reply.contains("How do I add fractions?"));

    let with_topic = service
        .chat(ChatRequest {
            student_id: 4,
            message: "How do I add fractions?".into(),
            current_topic: Some("Fractions".into()),
            ..Default::default()
        })
        .await?;
    let materials = with_topic.suggested_materials.unwrap_or_default();
    assert!(materials.contains("Fractions"));
    Ok(())
}

#[tokio::test]
async fn profile_summarises_history() -> Result<()> {
    let (service, store) = offline_service();
    seed(&store, 5, "Geometry", true, 4).await?;
    seed(&store, 5, "Algebra", false, 1).await?;

    let profile = service.get_student_profile(5).await?;
    assert_eq!(profile.total_attempts, 5);
    assert_eq!(profile.correct_answers, 4);
    assert_eq!(profile.accuracy, 80.0);
    assert_eq!(profile.recommended_difficulty, "hard");
    assert_eq!(profile.strengths, vec!["Geometry"]);
    assert_eq!(profile.recommended_next_topic, "Algebra");
    Ok(())
}

#[tokio::test]
async fn configured_primary_is_reported_as_primary() -> Result<()> {
    let primary = LlmStrategy::new(Arc::new(ReplyClient(
        "Here you go: {\"feedbackText\": \"Nice work\", \"hint\": \"Try a harder one\"}",
    )));
    let coordinator = Arc::new(FallbackCoordinator::new(
        Arc::new(primary),
        Arc::new(RuleBasedStrategy),
    ));
    let store = Arc::new(MemoryRecordStore::new());
    let service = TutorService::new(coordinator, store, &AnalyticsConfig::default());

    let response = service
        .generate_feedback(FeedbackRequest {
            student_id: 1,
            question_id: 1,
            student_answer: Some("4".into()),
            correct_answer: Some("4".into()),
            ..Default::default()
        })
        .await?;
    assert_eq!(response.source, GenerationSource::Primary);
    assert_eq!(response.feedback_text, "Nice work");
    assert_eq!(response.hint, "Try a harder one");
    Ok(())
}
