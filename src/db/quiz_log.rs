use std::time::Duration;

use color_eyre::Result;

use super::models::QuizLogRecord;
use super::{retry, Db};
use crate::models::Question;
use crate::names;
use crate::services::quiz::QuizLog;

impl Db {
    /// Insert the quiz summary row, retrying transient store failures, then
    /// attach the question rows in one batch.
    ///
    /// The summary insert is at-least-once across
    /// `names::LOG_RETRY_ATTEMPTS` attempts; the question batch gets a single
    /// attempt and its failure only degrades to a warning — the summary row
    /// already exists and the caller's quiz must stay usable either way.
    /// Returns the id of the new `quizzes` row.
    pub async fn log_quiz(&self, record: &QuizLogRecord, questions: &[Question]) -> Result<i32> {
        let pause = Duration::from_millis(names::LOG_RETRY_PAUSE_MS);
        let quiz_id = retry::with_retries(names::LOG_RETRY_ATTEMPTS, pause, || async move {
            self.insert_quiz(record).await
        })
        .await?;

        if let Err(e) = self.insert_questions(quiz_id, questions).await {
            tracing::warn!("could not save questions for quiz {quiz_id}: {e}");
        }

        tracing::info!(
            "quiz logged with id {quiz_id}: topic='{}', latency={}ms",
            record.topic,
            record.latency_ms
        );
        Ok(quiz_id)
    }

    async fn insert_quiz(&self, record: &QuizLogRecord) -> Result<i32> {
        let quiz_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO quizzes (topic, num_questions, custom_instructions, latency_ms, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&record.topic)
        .bind(record.num_questions)
        .bind(&record.custom_instructions)
        .bind(record.latency_ms)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(quiz_id)
    }

    /// Batch INSERT all question rows via UNNEST to avoid N+1 round-trips.
    async fn insert_questions(&self, quiz_id: i32, questions: &[Question]) -> Result<()> {
        if questions.is_empty() {
            return Ok(());
        }

        let q_texts: Vec<String> = questions.iter().map(|q| q.prompt.clone()).collect();
        let q_options: Vec<String> = questions
            .iter()
            .map(|q| serde_json::to_string(&q.options))
            .collect::<Result<_, _>>()?;
        let q_answers: Vec<String> = questions.iter().map(|q| q.answer.clone()).collect();
        let q_quiz_ids: Vec<i32> = vec![quiz_id; questions.len()];

        sqlx::query(
            r#"
            INSERT INTO questions (question_text, options, answer, quiz_id)
            SELECT * FROM UNNEST($1::TEXT[], $2::TEXT[], $3::TEXT[], $4::INT4[])
            "#,
        )
        .bind(&q_texts)
        .bind(&q_options)
        .bind(&q_answers)
        .bind(&q_quiz_ids)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Every generation latency ever logged, for the stats panel.
    pub async fn latencies(&self) -> Result<Vec<i64>> {
        let latencies: Vec<i64> = sqlx::query_scalar("SELECT latency_ms FROM quizzes")
            .fetch_all(&self.pool)
            .await?;

        Ok(latencies)
    }
}

impl QuizLog for Db {
    async fn log_quiz(&self, record: &QuizLogRecord, questions: &[Question]) -> Result<i32> {
        Db::log_quiz(self, record, questions).await
    }

    async fn latencies(&self) -> Result<Vec<i64>> {
        Db::latencies(self).await
    }
}
