use std::sync::Arc;

use anyhow::Result;
use log::debug;

use tutor_core::traits::FeedbackStore;
use tutor_core::types::{AnalyticsSnapshot, StudentProfile, TopicAggregate};

pub const DEFAULT_NEXT_TOPIC: &str = "Continue with the current topic";
const PROFILE_TOPIC_LIMIT: usize = 3;

/// Read-only view of a student's performance, derived from feedback history.
pub struct PerformanceAnalytics {
    feedback: Arc<dyn FeedbackStore>,
    recent_history_limit: usize,
}

impl PerformanceAnalytics {
    pub fn new(feedback: Arc<dyn FeedbackStore>, recent_history_limit: usize) -> Self {
        Self {
            feedback,
            recent_history_limit,
        }
    }

    pub async fn snapshot(&self, student_id: i64) -> Result<AnalyticsSnapshot> {
        let (total_attempts, correct_count) = self.feedback.attempt_counts(student_id).await?;
        let strong_topics = self.feedback.topic_aggregates(student_id, true).await?;
        let weak_topics = self.feedback.topic_aggregates(student_id, false).await?;
        let recent_history = self
            .feedback
            .recent_feedback(student_id, self.recent_history_limit)
            .await?;

        debug!(
            "Snapshot for student {}: {} attempts, {} correct, {} strong / {} weak topics",
            student_id,
            total_attempts,
            correct_count,
            strong_topics.len(),
            weak_topics.len()
        );

        Ok(AnalyticsSnapshot {
            student_id,
            total_attempts,
            correct_count,
            strong_topics,
            weak_topics,
            recent_history,
        })
    }

    pub async fn profile(&self, student_id: i64) -> Result<StudentProfile> {
        let snapshot = self.snapshot(student_id).await?;
        Ok(profile_from_snapshot(&snapshot))
    }

    /// Names of the student's weakest topics, most missed first.
    pub async fn weak_topic_names(&self, student_id: i64, limit: usize) -> Result<Vec<String>> {
        let weak = self.feedback.topic_aggregates(student_id, false).await?;
        Ok(topic_names(&weak, limit))
    }
}

pub fn profile_from_snapshot(snapshot: &AnalyticsSnapshot) -> StudentProfile {
    let accuracy = round_to_hundredths(snapshot.accuracy());
    StudentProfile {
        student_id: snapshot.student_id,
        total_attempts: snapshot.total_attempts,
        correct_answers: snapshot.correct_count,
        accuracy,
        strengths: topic_names(&snapshot.strong_topics, PROFILE_TOPIC_LIMIT),
        weaknesses: topic_names(&snapshot.weak_topics, PROFILE_TOPIC_LIMIT),
        recommended_difficulty: recommended_difficulty(accuracy).to_string(),
        recommended_next_topic: snapshot
            .top_weak_topic()
            .unwrap_or(DEFAULT_NEXT_TOPIC)
            .to_string(),
    }
}

pub fn recommended_difficulty(accuracy: f64) -> &'static str {
    if accuracy >= 80.0 {
        "hard"
    } else if accuracy >= 60.0 {
        "medium"
    } else {
        "easy"
    }
}

fn topic_names(aggregates: &[TopicAggregate], limit: usize) -> Vec<String> {
    aggregates
        .iter()
        .take(limit)
        .map(|a| a.topic.clone())
        .collect()
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
