//! Request and response shapes of [`TutorService`](crate::TutorService).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tutor_core::hint_level::HintLevel;
use tutor_core::types::{GenerationSource, LearningRecommendation};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub student_id: i64,
    pub question_id: i64,
    pub question_text: Option<String>,
    pub student_answer: Option<String>,
    pub correct_answer: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub subject: Option<String>,
    /// With `assessment_id`, identifies the test to fetch for the prompt.
    pub course_id: Option<i64>,
    pub assessment_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub id: i64,
    pub feedback_text: String,
    pub hint: String,
    pub is_correct: bool,
    pub source: GenerationSource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HintRequest {
    pub student_id: i64,
    pub question_id: i64,
    pub question_text: Option<String>,
    pub correct_answer: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub subject: Option<String>,
    /// Course whose materials are offered to the prompt.
    pub course_id: Option<i64>,
    pub assessment_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintResponse {
    pub hint: String,
    /// 1-based position of this hint for the (student, question) pair.
    pub hint_count: u64,
    pub level: HintLevel,
    pub created_at: DateTime<Utc>,
    pub source: GenerationSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintHistoryEntry {
    pub hint: String,
    pub hint_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub student_id: i64,
    pub material_id: i64,
    pub student_question: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationResponse {
    pub id: i64,
    pub explanation: String,
    pub source: GenerationSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub student_id: i64,
    pub recommendations: Vec<LearningRecommendation>,
    pub source: GenerationSource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub student_id: i64,
    pub message: String,
    pub learning_context: Option<String>,
    /// Materials are only suggested when this is set.
    pub current_topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_materials: Option<String>,
    pub source: GenerationSource,
}
