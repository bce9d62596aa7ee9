use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use tutor_core::traits::{ExplanationStore, FeedbackStore, HintStore};
use tutor_core::types::{
    ExplanationRecord, FeedbackRecord, HintRecord, NewExplanation, NewFeedback, NewHint,
    TopicAggregate,
};
use tutor_core::utils::normalize_topic;

#[derive(Default)]
struct Records {
    next_id: i64,
    feedback: Vec<FeedbackRecord>,
    hints: Vec<HintRecord>,
    explanations: Vec<ExplanationRecord>,
}

impl Records {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local append-only record store.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Records>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedbackStore for MemoryRecordStore {
    async fn append_feedback(&self, feedback: NewFeedback) -> Result<FeedbackRecord> {
        let mut records = self.records.write().await;
        let record = FeedbackRecord {
            id: records.allocate_id(),
            student_id: feedback.student_id,
            question_id: feedback.question_id,
            feedback_text: feedback.feedback_text,
            hint: feedback.hint,
            topic: normalize_topic(feedback.topic),
            subject: feedback.subject,
            difficulty: feedback.difficulty,
            is_correct: feedback.is_correct,
            created_at: Utc::now(),
        };
        records.feedback.push(record.clone());
        Ok(record)
    }

    async fn feedback_for_student(&self, student_id: i64) -> Result<Vec<FeedbackRecord>> {
        let records = self.records.read().await;
        Ok(records
            .feedback
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn recent_feedback(&self, student_id: i64, limit: usize) -> Result<Vec<FeedbackRecord>> {
        let records = self.records.read().await;
        Ok(records
            .feedback
            .iter()
            .rev()
            .filter(|r| r.student_id == student_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn attempt_counts(&self, student_id: i64) -> Result<(u64, u64)> {
        let records = self.records.read().await;
        let (total, correct) = records
            .feedback
            .iter()
            .filter(|r| r.student_id == student_id)
            .fold((0u64, 0u64), |(total, correct), r| {
                (total + 1, correct + u64::from(r.is_correct == Some(true)))
            });
        Ok((total, correct))
    }

    async fn topic_aggregates(
        &self,
        student_id: i64,
        correct: bool,
    ) -> Result<Vec<TopicAggregate>> {
        let records = self.records.read().await;
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for record in records
            .feedback
            .iter()
            .filter(|r| r.student_id == student_id && r.is_correct == Some(correct))
        {
            if let Some(topic) = record.topic.as_deref() {
                *counts.entry(topic).or_default() += 1;
            }
        }

        let mut aggregates: Vec<TopicAggregate> = counts
            .into_iter()
            .map(|(topic, count)| TopicAggregate::new(topic, count))
            .collect();
        aggregates.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.topic.cmp(&b.topic)));
        Ok(aggregates)
    }
}

#[async_trait]
impl HintStore for MemoryRecordStore {
    async fn append_hint(&self, hint: NewHint) -> Result<HintRecord> {
        let mut records = self.records.write().await;
        let record = HintRecord {
            id: records.allocate_id(),
            student_id: hint.student_id,
            question_id: hint.question_id,
            hint: hint.hint,
            subject: hint.subject,
            topic: normalize_topic(hint.topic),
            difficulty: hint.difficulty,
            created_at: Utc::now(),
        };
        records.hints.push(record.clone());
        Ok(record)
    }

    async fn hints_for(&self, student_id: i64, question_id: i64) -> Result<Vec<HintRecord>> {
        let records = self.records.read().await;
        Ok(records
            .hints
            .iter()
            .filter(|r| r.student_id == student_id && r.question_id == question_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ExplanationStore for MemoryRecordStore {
    async fn append_explanation(&self, explanation: NewExplanation) -> Result<ExplanationRecord> {
        let mut records = self.records.write().await;
        let record = ExplanationRecord {
            id: records.allocate_id(),
            student_id: explanation.student_id,
            material_id: explanation.material_id,
            student_question: explanation.student_question,
            explanation: explanation.explanation,
            created_at: Utc::now(),
        };
        records.explanations.push(record.clone());
        Ok(record)
    }

    async fn explanations_for(
        &self,
        student_id: i64,
        material_id: i64,
    ) -> Result<Vec<ExplanationRecord>> {
        let records = self.records.read().await;
        Ok(records
            .explanations
            .iter()
            .filter(|r| r.student_id == student_id && r.material_id == material_id)
            .cloned()
            .collect())
    }
}
