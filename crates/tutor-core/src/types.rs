// crates/tutor-core/src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::hint_level::{select_level, HintLevel};

/// Recent accuracy must differ from lifetime accuracy by more than this many
/// percentage points before a trend is reported as improving or declining.
pub const TREND_MARGIN_POINTS: f64 = 5.0;

/// A student's answer to a single question together with its grading context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionContext {
    pub student_id: i64,
    pub question_id: i64,
    pub question_text: Option<String>,
    pub student_answer: Option<String>,
    pub correct_answer: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub subject: Option<String>,
    /// The whole test the question belongs to, when the caller could fetch it.
    pub test: Option<TestContext>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HintContext {
    pub student_id: i64,
    pub question_id: i64,
    pub question_text: Option<String>,
    pub correct_answer: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub subject: Option<String>,
    /// Earlier hints for the same (student, question), oldest first.
    pub previous_hints: Vec<String>,
    pub materials: Vec<CourseMaterial>,
    pub test: Option<TestContext>,
}

impl HintContext {
    pub fn level(&self) -> HintLevel {
        select_level(self.previous_hints.len())
    }

    /// Question text supplied with the request, else the matching question
    /// of the attached test.
    pub fn resolved_question_text(&self) -> Option<&str> {
        if let Some(text) = self.question_text.as_deref().filter(|t| !t.trim().is_empty()) {
            return Some(text);
        }
        self.test
            .as_ref()?
            .questions
            .iter()
            .find(|q| q.question_id == self.question_id)
            .and_then(|q| q.question_text.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

/// One earlier question/explanation pair about the same material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationExchange {
    pub question: Option<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplanationContext {
    pub student_id: i64,
    pub material_id: i64,
    pub student_question: Option<String>,
    pub material: Option<MaterialContent>,
    pub previous: Vec<ExplanationExchange>,
}

impl ExplanationContext {
    pub fn has_material_content(&self) -> bool {
        self.material
            .as_ref()
            .and_then(|m| m.content.as_deref())
            .map_or(false, |c| !c.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatContext {
    pub student_id: i64,
    pub message: String,
    pub learning_context: Option<String>,
    /// Most recent feedback first.
    pub recent_history: Vec<FeedbackRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialsContext {
    pub student_id: i64,
    pub current_topic: Option<String>,
    pub weak_topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: i64,
    pub student_id: i64,
    pub question_id: i64,
    pub feedback_text: String,
    pub hint: Option<String>,
    pub topic: Option<String>,
    pub subject: Option<String>,
    pub difficulty: Option<String>,
    pub is_correct: Option<bool>,
    pub created_at: DateTime<Utc>,
}

/// Feedback about to be appended; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewFeedback {
    pub student_id: i64,
    pub question_id: i64,
    pub feedback_text: String,
    pub hint: Option<String>,
    pub topic: Option<String>,
    pub subject: Option<String>,
    pub difficulty: Option<String>,
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintRecord {
    pub id: i64,
    pub student_id: i64,
    pub question_id: i64,
    pub hint: String,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewHint {
    pub student_id: i64,
    pub question_id: i64,
    pub hint: String,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationRecord {
    pub id: i64,
    pub student_id: i64,
    pub material_id: i64,
    pub student_question: Option<String>,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewExplanation {
    pub student_id: i64,
    pub material_id: i64,
    pub student_question: Option<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFeedback {
    pub feedback_text: String,
    pub hint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningRecommendation {
    pub student_id: i64,
    pub next_topic: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicAggregate {
    pub topic: String,
    pub count: u64,
}

impl TopicAggregate {
    pub fn new(topic: impl Into<String>, count: u64) -> Self {
        Self {
            topic: topic.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Steady,
}

/// Aggregated performance of one student, read from feedback history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub student_id: i64,
    pub total_attempts: u64,
    pub correct_count: u64,
    pub strong_topics: Vec<TopicAggregate>,
    pub weak_topics: Vec<TopicAggregate>,
    /// Newest first.
    pub recent_history: Vec<FeedbackRecord>,
}

impl AnalyticsSnapshot {
    /// Lifetime accuracy in percent; zero when nothing has been attempted.
    pub fn accuracy(&self) -> f64 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        self.correct_count as f64 * 100.0 / self.total_attempts as f64
    }

    pub fn recent_accuracy(&self) -> Option<f64> {
        if self.recent_history.is_empty() {
            return None;
        }
        let correct = self
            .recent_history
            .iter()
            .filter(|r| r.is_correct == Some(true))
            .count();
        Some(correct as f64 * 100.0 / self.recent_history.len() as f64)
    }

    pub fn trend(&self) -> Trend {
        match self.recent_accuracy() {
            Some(recent) if recent > self.accuracy() + TREND_MARGIN_POINTS => Trend::Improving,
            Some(recent) if recent < self.accuracy() - TREND_MARGIN_POINTS => Trend::Declining,
            _ => Trend::Steady,
        }
    }

    pub fn top_strong_topic(&self) -> Option<&str> {
        self.strong_topics.first().map(|t| t.topic.as_str())
    }

    pub fn top_weak_topic(&self) -> Option<&str> {
        self.weak_topics.first().map(|t| t.topic.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseMaterial {
    pub title: Option<String>,
    pub kind: Option<String>,
    pub content_or_url: Option<String>,
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialContent {
    pub file_name: Option<String>,
    pub pages: Option<u32>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestQuestion {
    pub question_id: i64,
    pub question_text: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: Option<String>,
    pub student_answer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestContext {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date_taken: Option<String>,
    /// Minutes.
    pub time_limit: Option<u32>,
    pub student_id: Option<i64>,
    #[serde(default)]
    pub questions: Vec<TestQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub student_id: i64,
    pub total_attempts: u64,
    pub correct_answers: u64,
    pub accuracy: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommended_difficulty: String,
    pub recommended_next_topic: String,
}

/// Which strategy produced a generated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GenerationSource {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generated<T> {
    pub value: T,
    pub source: GenerationSource,
}

impl<T> Generated<T> {
    pub fn primary(value: T) -> Self {
        Self {
            value,
            source: GenerationSource::Primary,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            source: GenerationSource::Fallback,
        }
    }

    pub fn into_fallback(self) -> Self {
        Self::fallback(self.value)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Generated<U> {
        Generated {
            value: f(self.value),
            source: self.source,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == GenerationSource::Fallback
    }
}
