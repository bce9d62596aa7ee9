use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use tutor_core::error::{ChatError, GenerationError};
use tutor_core::traits::{ChatClient, GenerationStrategy};
use tutor_core::types::{
    AnalyticsSnapshot, ChatContext, ExplanationContext, GenerationSource, HintContext,
    MaterialsContext, SubmissionContext, TopicAggregate,
};
use tutor_engines::{FallbackCoordinator, LlmStrategy, RuleBasedStrategy};

/// Chat client whose behaviour is fixed per test.
enum StubClient {
    Unconfigured,
    Failing(fn() -> ChatError),
    Slow(Duration),
    Reply(&'static str),
}

#[async_trait]
impl ChatClient for StubClient {
    fn is_configured(&self) -> bool {
        !matches!(self, StubClient::Unconfigured)
    }

    async fn chat(&self, _prompt: &str) -> Result<String, ChatError> {
        match self {
            StubClient::Unconfigured => Err(ChatError::MissingCredential),
            StubClient::Failing(make) => Err(make()),
            StubClient::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok("too late".to_string())
            }
            StubClient::Reply(text) => Ok(text.to_string()),
        }
    }
}

/// Counts how often the client was actually called.
struct CountingClient {
    calls: AtomicUsize,
}

#[async_trait]
impl ChatClient for CountingClient {
    fn is_configured(&self) -> bool {
        false
    }

    async fn chat(&self, _prompt: &str) -> Result<String, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("unexpected".to_string())
    }
}

fn coordinator(client: StubClient) -> FallbackCoordinator {
    let primary = LlmStrategy::new(Arc::new(client)).with_timeout(Duration::from_millis(50));
    FallbackCoordinator::new(Arc::new(primary), Arc::new(RuleBasedStrategy))
}

fn submission() -> SubmissionContext {
    SubmissionContext {
        student_id: 1,
        question_id: 5,
        question_text: Some("What is the capital of France?".into()),
        student_answer: Some("Paris".into()),
        correct_answer: Some("paris".into()),
        topic: Some("Geography".into()),
        difficulty: Some("easy".into()),
        subject: Some("Social studies".into()),
        test: None,
    }
}

fn snapshot() -> AnalyticsSnapshot {
    AnalyticsSnapshot {
        student_id: 1,
        total_attempts: 10,
        correct_count: 3,
        weak_topics: vec![TopicAggregate::new("Algebra", 5)],
        ..Default::default()
    }
}

async fn assert_every_capability_falls_back(coordinator: &FallbackCoordinator) -> Result<()> {
    let rules = RuleBasedStrategy;

    let feedback = coordinator.generate_feedback(&submission()).await?;
    assert_eq!(feedback.source, GenerationSource::Fallback);
    assert_eq!(feedback.value, rules.feedback(&submission()));

    let hint_ctx = HintContext {
        topic: Some("Geography".into()),
        previous_hints: vec!["Think about Europe".into()],
        ..Default::default()
    };
    let hint = coordinator.generate_hint(&hint_ctx).await?;
    assert_eq!(hint.source, GenerationSource::Fallback);
    assert_eq!(hint.value, rules.hint(&hint_ctx));

    let explain_ctx = ExplanationContext {
        student_question: Some("Why is Paris the capital?".into()),
        ..Default::default()
    };
    let explanation = coordinator.generate_explanation(&explain_ctx).await?;
    assert_eq!(explanation.source, GenerationSource::Fallback);
    assert_eq!(explanation.value, rules.explanation(&explain_ctx));

    let recs = coordinator.suggest_next_steps(&snapshot()).await?;
    assert_eq!(recs.source, GenerationSource::Fallback);
    assert_eq!(recs.value, rules.recommendations(&snapshot()));

    let chat_ctx = ChatContext {
        student_id: 1,
        message: "Help me with maps".into(),
        ..Default::default()
    };
    let chat = coordinator.chat(&chat_ctx).await?;
    assert_eq!(chat.source, GenerationSource::Fallback);
    assert_eq!(chat.value, rules.chat_reply(&chat_ctx));

    let materials_ctx = MaterialsContext {
        student_id: 1,
        current_topic: Some("Geography".into()),
        weak_topics: vec!["Algebra".into()],
    };
    let materials = coordinator.suggest_materials(&materials_ctx).await?;
    assert_eq!(materials.source, GenerationSource::Fallback);
    assert_eq!(materials.value, rules.materials(&materials_ctx));
    Ok(())
}

#[tokio::test]
async fn unconfigured_primary_falls_back_everywhere() -> Result<()> {
    assert_every_capability_falls_back(&coordinator(StubClient::Unconfigured)).await
}

#[tokio::test]
async fn failing_primary_falls_back_everywhere() -> Result<()> {
    let failures: [fn() -> ChatError; 4] = [
        || ChatError::Http {
            status: 401,
            message: "invalid api key".into(),
        },
        || ChatError::Http {
            status: 503,
            message: "overloaded".into(),
        },
        || ChatError::Transport("connection refused".into()),
        || ChatError::MalformedResponse("no choices".into()),
    ];
    for failure in failures {
        assert_every_capability_falls_back(&coordinator(StubClient::Failing(failure))).await?;
    }
    Ok(())
}

#[tokio::test]
async fn timed_out_primary_falls_back() -> Result<()> {
    assert_every_capability_falls_back(&coordinator(StubClient::Slow(Duration::from_millis(500))))
        .await
}

#[tokio::test]
async fn unconfigured_client_is_never_called() -> Result<()> {
    let client = Arc::new(CountingClient {
        calls: AtomicUsize::new(0),
    });
    let strategy = LlmStrategy::new(client.clone());
    let err = strategy.generate_feedback(&submission()).await.unwrap_err();
    assert!(matches!(err, GenerationError::ConfigurationMissing { .. }));
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn llm_timeout_is_unavailable() -> Result<()> {
    let strategy = LlmStrategy::new(Arc::new(StubClient::Slow(Duration::from_millis(500))))
        .with_timeout(Duration::from_millis(20));
    let err = strategy.generate_hint(&HintContext::default()).await.unwrap_err();
    assert!(matches!(err, GenerationError::Unavailable { .. }));
    assert!(err.to_string().contains("timed out"));
    Ok(())
}

#[tokio::test]
async fn healthy_primary_is_tagged_primary() -> Result<()> {
    let coordinator = coordinator(StubClient::Reply(
        "{\"feedbackText\": \"Spot on!\", \"hint\": \"Try capitals of Asia next.\"}",
    ));
    let feedback = coordinator.generate_feedback(&submission()).await?;
    assert_eq!(feedback.source, GenerationSource::Primary);
    assert_eq!(feedback.value.feedback_text, "Spot on!");

    let hint = coordinator.generate_hint(&HintContext::default()).await?;
    assert_eq!(hint.source, GenerationSource::Primary);
    assert!(hint.value.contains("Spot on!"));
    Ok(())
}

#[tokio::test]
async fn malformed_llm_recommendations_stay_primary() -> Result<()> {
    let coordinator = coordinator(StubClient::Reply("Practise algebra every day."));
    let recs = coordinator.suggest_next_steps(&snapshot()).await?;
    assert_eq!(recs.source, GenerationSource::Primary);
    assert_eq!(recs.value.len(), 1);
    assert_eq!(recs.value[0].next_topic, "Review the material");
    assert_eq!(recs.value[0].explanation, "Practise algebra every day.");
    Ok(())
}

#[tokio::test]
async fn nested_coordinators_keep_fallback_tag() -> Result<()> {
    let inner = coordinator(StubClient::Unconfigured);
    let outer = FallbackCoordinator::new(Arc::new(inner), Arc::new(RuleBasedStrategy));
    let hint = outer.generate_hint(&HintContext::default()).await?;
    assert_eq!(hint.source, GenerationSource::Fallback);
    assert_eq!(outer.name(), "llm");
    Ok(())
}
