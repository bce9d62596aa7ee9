use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use rusqlite::types::Type;
use rusqlite::Row;
use tokio_rusqlite::Connection as AsyncConnection;

use tutor_core::traits::{ExplanationStore, FeedbackStore, HintStore};
use tutor_core::types::{
    ExplanationRecord, FeedbackRecord, HintRecord, NewExplanation, NewFeedback, NewHint,
    TopicAggregate,
};
use tutor_core::utils::normalize_topic;

const FEEDBACK_COLUMNS: &str = "id, student_id, question_id, feedback_text, hint, topic, subject, \
                                difficulty, is_correct, created_at";
const HINT_COLUMNS: &str =
    "id, student_id, question_id, hint, subject, topic, difficulty, created_at";
const EXPLANATION_COLUMNS: &str =
    "id, student_id, material_id, student_question, explanation, created_at";

/// Append-only record store backed by SQLite.
pub struct SqliteRecordStore {
    connection: AsyncConnection,
}

impl SqliteRecordStore {
    /// Opens (or creates) the database at `database_path`; `:memory:` keeps
    /// everything in process memory.
    pub async fn open(database_path: &str) -> Result<Self> {
        let connection = if database_path == ":memory:" {
            AsyncConnection::open_in_memory().await?
        } else {
            AsyncConnection::open(database_path).await?
        };

        let store = Self { connection };
        store.create_tables().await?;
        debug!("Opened record store at {}", database_path);
        Ok(store)
    }

    async fn create_tables(&self) -> Result<()> {
        self.connection
            .call(|conn| {
                conn.execute_batch(
                    r#"
                CREATE TABLE IF NOT EXISTS feedback_records (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    student_id INTEGER NOT NULL,
                    question_id INTEGER NOT NULL,
                    feedback_text TEXT NOT NULL,
                    hint TEXT,
                    topic TEXT,
                    subject TEXT,
                    difficulty TEXT,
                    is_correct INTEGER,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_feedback_student
                    ON feedback_records(student_id, created_at);

                CREATE TABLE IF NOT EXISTS hint_records (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    student_id INTEGER NOT NULL,
                    question_id INTEGER NOT NULL,
                    hint TEXT NOT NULL,
                    subject TEXT,
                    topic TEXT,
                    difficulty TEXT,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_hint_pair
                    ON hint_records(student_id, question_id, created_at);

                CREATE TABLE IF NOT EXISTS explanation_records (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    student_id INTEGER NOT NULL,
                    material_id INTEGER NOT NULL,
                    student_question TEXT,
                    explanation TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_explanation_pair
                    ON explanation_records(student_id, material_id, created_at);
                "#,
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

// Fixed-width UTC timestamps so text ordering matches time ordering.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<FeedbackRecord> {
    Ok(FeedbackRecord {
        id: row.get(0)?,
        student_id: row.get(1)?,
        question_id: row.get(2)?,
        feedback_text: row.get(3)?,
        hint: row.get(4)?,
        topic: row.get(5)?,
        subject: row.get(6)?,
        difficulty: row.get(7)?,
        is_correct: row.get(8)?,
        created_at: parse_timestamp(row, 9)?,
    })
}

fn hint_from_row(row: &Row<'_>) -> rusqlite::Result<HintRecord> {
    Ok(HintRecord {
        id: row.get(0)?,
        student_id: row.get(1)?,
        question_id: row.get(2)?,
        hint: row.get(3)?,
        subject: row.get(4)?,
        topic: row.get(5)?,
        difficulty: row.get(6)?,
        created_at: parse_timestamp(row, 7)?,
    })
}

fn explanation_from_row(row: &Row<'_>) -> rusqlite::Result<ExplanationRecord> {
    Ok(ExplanationRecord {
        id: row.get(0)?,
        student_id: row.get(1)?,
        material_id: row.get(2)?,
        student_question: row.get(3)?,
        explanation: row.get(4)?,
        created_at: parse_timestamp(row, 5)?,
    })
}

#[async_trait]
impl FeedbackStore for SqliteRecordStore {
    async fn append_feedback(&self, mut feedback: NewFeedback) -> Result<FeedbackRecord> {
        feedback.topic = normalize_topic(feedback.topic);
        let created_at = Utc::now();
        let record = self
            .connection
            .call(move |conn| {
                conn.execute(
                    r#"
                INSERT INTO feedback_records (
                    student_id, question_id, feedback_text, hint, topic, subject,
                    difficulty, is_correct, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                    rusqlite::params![
                        feedback.student_id,
                        feedback.question_id,
                        &feedback.feedback_text,
                        &feedback.hint,
                        &feedback.topic,
                        &feedback.subject,
                        &feedback.difficulty,
                        feedback.is_correct,
                        timestamp(&created_at),
                    ],
                )?;
                Ok(FeedbackRecord {
                    id: conn.last_insert_rowid(),
                    student_id: feedback.student_id,
                    question_id: feedback.question_id,
                    feedback_text: feedback.feedback_text,
                    hint: feedback.hint,
                    topic: feedback.topic,
                    subject: feedback.subject,
                    difficulty: feedback.difficulty,
                    is_correct: feedback.is_correct,
                    created_at,
                })
            })
            .await?;
        Ok(record)
    }

    async fn feedback_for_student(&self, student_id: i64) -> Result<Vec<FeedbackRecord>> {
        let records = self
            .connection
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM feedback_records WHERE student_id = ?1 ORDER BY created_at ASC, id ASC",
                    FEEDBACK_COLUMNS
                ))?;
                let rows = stmt.query_map(rusqlite::params![student_id], feedback_from_row)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await?;
        Ok(records)
    }

    async fn recent_feedback(&self, student_id: i64, limit: usize) -> Result<Vec<FeedbackRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records = self
            .connection
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM feedback_records WHERE student_id = ?1 \
                     ORDER BY created_at DESC, id DESC LIMIT ?2",
                    FEEDBACK_COLUMNS
                ))?;
                let rows =
                    stmt.query_map(rusqlite::params![student_id, limit], feedback_from_row)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await?;
        Ok(records)
    }

    async fn attempt_counts(&self, student_id: i64) -> Result<(u64, u64)> {
        let (total, correct) = self
            .connection
            .call(move |conn| {
                let counts = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_correct = 1 THEN 1 ELSE 0 END), 0) \
                     FROM feedback_records WHERE student_id = ?1",
                    rusqlite::params![student_id],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
                )?;
                Ok(counts)
            })
            .await?;
        Ok((total.max(0) as u64, correct.max(0) as u64))
    }

    async fn topic_aggregates(
        &self,
        student_id: i64,
        correct: bool,
    ) -> Result<Vec<TopicAggregate>> {
        let aggregates = self
            .connection
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                SELECT topic, COUNT(*) AS total
                FROM feedback_records
                WHERE student_id = ?1 AND is_correct = ?2
                  AND topic IS NOT NULL AND topic <> ''
                GROUP BY topic
                ORDER BY total DESC, topic ASC
                "#,
                )?;
                let rows = stmt.query_map(rusqlite::params![student_id, correct], |row| {
                    Ok(TopicAggregate::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?.max(0) as u64,
                    ))
                })?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await?;
        Ok(aggregates)
    }
}

#[async_trait]
impl HintStore for SqliteRecordStore {
    async fn append_hint(&self, mut hint: NewHint) -> Result<HintRecord> {
        hint.topic = normalize_topic(hint.topic);
        let created_at = Utc::now();
        let record = self
            .connection
            .call(move |conn| {
                conn.execute(
                    r#"
                INSERT INTO hint_records (
                    student_id, question_id, hint, subject, topic, difficulty, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                    rusqlite::params![
                        hint.student_id,
                        hint.question_id,
                        &hint.hint,
                        &hint.subject,
                        &hint.topic,
                        &hint.difficulty,
                        timestamp(&created_at),
                    ],
                )?;
                Ok(HintRecord {
                    id: conn.last_insert_rowid(),
                    student_id: hint.student_id,
                    question_id: hint.question_id,
                    hint: hint.hint,
                    subject: hint.subject,
                    topic: hint.topic,
                    difficulty: hint.difficulty,
                    created_at,
                })
            })
            .await?;
        Ok(record)
    }

    async fn hints_for(&self, student_id: i64, question_id: i64) -> Result<Vec<HintRecord>> {
        let records = self
            .connection
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM hint_records WHERE student_id = ?1 AND question_id = ?2 \
                     ORDER BY created_at ASC, id ASC",
                    HINT_COLUMNS
                ))?;
                let rows =
                    stmt.query_map(rusqlite::params![student_id, question_id], hint_from_row)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await?;
        Ok(records)
    }
}

#[async_trait]
impl ExplanationStore for SqliteRecordStore {
    async fn append_explanation(&self, explanation: NewExplanation) -> Result<ExplanationRecord> {
        let created_at = Utc::now();
        let record = self
            .connection
            .call(move |conn| {
                conn.execute(
                    r#"
                INSERT INTO explanation_records (
                    student_id, material_id, student_question, explanation, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                    rusqlite::params![
                        explanation.student_id,
                        explanation.material_id,
                        &explanation.student_question,
                        &explanation.explanation,
                        timestamp(&created_at),
                    ],
                )?;
                Ok(ExplanationRecord {
                    id: conn.last_insert_rowid(),
                    student_id: explanation.student_id,
                    material_id: explanation.material_id,
                    student_question: explanation.student_question,
                    explanation: explanation.explanation,
                    created_at,
                })
            })
            .await?;
        Ok(record)
    }

    async fn explanations_for(
        &self,
        student_id: i64,
        material_id: i64,
    ) -> Result<Vec<ExplanationRecord>> {
        let records = self
            .connection
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM explanation_records WHERE student_id = ?1 AND material_id = ?2 \
                     ORDER BY created_at ASC, id ASC",
                    EXPLANATION_COLUMNS
                ))?;
                let rows = stmt.query_map(
                    rusqlite::params![student_id, material_id],
                    explanation_from_row,
                )?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await?;
        Ok(records)
    }
}
