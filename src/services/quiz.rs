use chrono::Utc;
use color_eyre::Result;

use crate::db::{Db, QuizLogRecord};
use crate::llm::{GenerateError, GeneratedQuiz, Generator};
use crate::models::{Question, QuizRequest};
use crate::stats::{self, LatencySummary};

// ---------------------------------------------------------------------------
// Gateway traits (DIP: service defines the abstractions it needs)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait QuestionSource: Send + Sync {
    fn generate(
        &self,
        request: &QuizRequest,
    ) -> impl std::future::Future<Output = Result<GeneratedQuiz, GenerateError>> + Send;
}

#[cfg_attr(test, mockall::automock)]
pub trait QuizLog: Send + Sync {
    fn log_quiz(
        &self,
        record: &QuizLogRecord,
        questions: &[Question],
    ) -> impl std::future::Future<Output = Result<i32>> + Send;

    fn latencies(&self) -> impl std::future::Future<Output = Result<Vec<i64>>> + Send;
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

pub enum GenerateOutcome {
    /// Questions are ready. `log_warning` carries the degraded-persistence
    /// message when the audit row could not be written; the quiz itself is
    /// unaffected.
    Generated {
        questions: Vec<Question>,
        latency_ms: i64,
        log_warning: Option<String>,
    },
    /// The provider answered with the wrong number of questions.
    CountMismatch { requested: u32, received: usize },
    /// The provider call itself failed.
    ProviderError(String),
}

// ---------------------------------------------------------------------------
// QuizService
// ---------------------------------------------------------------------------

pub struct QuizService<S: QuestionSource = Generator, L: QuizLog = Db> {
    source: S,
    log: L,
}

impl<S: QuestionSource + Clone, L: QuizLog + Clone> Clone for QuizService<S, L> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            log: self.log.clone(),
        }
    }
}

impl<S: QuestionSource, L: QuizLog> QuizService<S, L> {
    pub fn new(source: S, log: L) -> Self {
        Self { source, log }
    }

    /// Run one generation attempt and, on success, write the audit row.
    ///
    /// Only successful generations are logged. A logging failure never
    /// discards the generated quiz.
    pub async fn generate_quiz(&self, request: &QuizRequest) -> GenerateOutcome {
        let generated = match self.source.generate(request).await {
            Ok(generated) => generated,
            Err(GenerateError::Mismatch {
                requested,
                received,
            }) => {
                tracing::warn!(
                    "generation returned {received} questions, requested {requested}"
                );
                return GenerateOutcome::CountMismatch {
                    requested,
                    received,
                };
            }
            Err(GenerateError::Provider(e)) => {
                tracing::error!("quiz generation failed: {e}");
                return GenerateOutcome::ProviderError(e.to_string());
            }
        };

        let record = QuizLogRecord {
            topic: request.topic.clone(),
            num_questions: request.question_count as i32,
            custom_instructions: request.instructions.clone(),
            latency_ms: generated.latency_ms,
            created_at: Utc::now(),
        };

        let log_warning = match self.log.log_quiz(&record, &generated.questions).await {
            Ok(_) => None,
            Err(e) => {
                tracing::error!("could not save quiz log: {e}");
                Some(
                    "Your quiz was generated but couldn't be saved to the database.".to_string(),
                )
            }
        };

        GenerateOutcome::Generated {
            questions: generated.questions,
            latency_ms: generated.latency_ms,
            log_warning,
        }
    }

    /// Aggregate every logged generation latency for the stats panel.
    /// `Ok(None)` means there is nothing to show yet.
    pub async fn latency_summary(&self) -> Result<Option<LatencySummary>> {
        let latencies = self.log.latencies().await?;
        Ok(stats::summarize(&latencies))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use color_eyre::eyre::eyre;

    use super::*;

    fn request(count: u32) -> QuizRequest {
        QuizRequest {
            topic: "Psychology".to_string(),
            question_count: count,
            instructions: "Classical Conditioning".to_string(),
        }
    }

    fn make_questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    format!("Question {}", i + 1),
                    vec![format!("Correct {}", i + 1), format!("Wrong {}", i + 1)],
                    format!("Correct {}", i + 1),
                )
                .unwrap()
            })
            .collect()
    }

    fn source_returning(n: usize, latency_ms: i64) -> MockQuestionSource {
        let mut mock = MockQuestionSource::new();
        mock.expect_generate().returning(move |_| {
            let questions = make_questions(n);
            Box::pin(async move {
                Ok(GeneratedQuiz {
                    questions,
                    latency_ms,
                })
            })
        });
        mock
    }

    fn log_ok() -> MockQuizLog {
        let mut mock = MockQuizLog::new();
        mock.expect_log_quiz()
            .returning(|_, _| Box::pin(async { Ok(1) }));
        mock
    }

    fn log_failing() -> MockQuizLog {
        let mut mock = MockQuizLog::new();
        mock.expect_log_quiz()
            .returning(|_, _| Box::pin(async { Err(eyre!("store unavailable")) }));
        mock
    }

    #[tokio::test]
    async fn successful_generation_returns_requested_count() {
        let svc = QuizService::new(source_returning(5, 1234), log_ok());

        let outcome = svc.generate_quiz(&request(5)).await;

        match outcome {
            GenerateOutcome::Generated {
                questions,
                latency_ms,
                log_warning,
            } => {
                assert_eq!(questions.len(), 5);
                assert_eq!(latency_ms, 1234);
                assert!(log_warning.is_none());
            }
            _ => panic!("expected Generated outcome"),
        }
    }

    #[tokio::test]
    async fn mismatch_from_source_becomes_count_mismatch() {
        let mut source = MockQuestionSource::new();
        source.expect_generate().returning(|_| {
            Box::pin(async {
                Err(GenerateError::Mismatch {
                    requested: 9,
                    received: 8,
                })
            })
        });
        // No log expectation: failed generations write no row.
        let svc = QuizService::new(source, MockQuizLog::new());

        let outcome = svc.generate_quiz(&request(9)).await;

        assert!(matches!(
            outcome,
            GenerateOutcome::CountMismatch {
                requested: 9,
                received: 8
            }
        ));
    }

    #[tokio::test]
    async fn provider_failure_becomes_provider_error() {
        let mut source = MockQuestionSource::new();
        source.expect_generate().returning(|_| {
            Box::pin(async { Err(GenerateError::Provider(eyre!("connection refused"))) })
        });
        let svc = QuizService::new(source, MockQuizLog::new());

        let outcome = svc.generate_quiz(&request(3)).await;

        match outcome {
            GenerateOutcome::ProviderError(message) => {
                assert!(message.contains("connection refused"));
            }
            _ => panic!("expected ProviderError outcome"),
        }
    }

    #[tokio::test]
    async fn log_failure_keeps_the_quiz_and_surfaces_a_warning() {
        let svc = QuizService::new(source_returning(3, 500), log_failing());

        let outcome = svc.generate_quiz(&request(3)).await;

        match outcome {
            GenerateOutcome::Generated {
                questions,
                log_warning,
                ..
            } => {
                assert_eq!(questions.len(), 3, "quiz must not be reverted");
                assert!(log_warning.unwrap().contains("couldn't be saved"));
            }
            _ => panic!("expected Generated outcome despite log failure"),
        }
    }

    #[tokio::test]
    async fn log_record_carries_the_request_fields() {
        let mut log = MockQuizLog::new();
        log.expect_log_quiz()
            .withf(|record, questions| {
                record.topic == "Psychology"
                    && record.num_questions == 4
                    && record.custom_instructions == "Classical Conditioning"
                    && record.latency_ms == 777
                    && questions.len() == 4
            })
            .returning(|_, _| Box::pin(async { Ok(1) }));

        let svc = QuizService::new(source_returning(4, 777), log);
        let outcome = svc.generate_quiz(&request(4)).await;
        assert!(matches!(outcome, GenerateOutcome::Generated { .. }));
    }

    #[tokio::test]
    async fn latency_summary_averages_logged_rows() {
        let mut log = MockQuizLog::new();
        log.expect_latencies()
            .returning(|| Box::pin(async { Ok(vec![1000, 2000, 3000]) }));
        let svc = QuizService::new(MockQuestionSource::new(), log);

        let summary = svc.latency_summary().await.unwrap().unwrap();
        assert_eq!(summary.average_ms, 2000.0);
        assert_eq!(summary.total, 3);
    }

    #[tokio::test]
    async fn latency_summary_empty_log_is_none() {
        let mut log = MockQuizLog::new();
        log.expect_latencies()
            .returning(|| Box::pin(async { Ok(Vec::new()) }));
        let svc = QuizService::new(MockQuestionSource::new(), log);

        assert!(svc.latency_summary().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latency_summary_propagates_read_failure() {
        let mut log = MockQuizLog::new();
        log.expect_latencies()
            .returning(|| Box::pin(async { Err(eyre!("read timed out")) }));
        let svc = QuizService::new(MockQuestionSource::new(), log);

        assert!(svc.latency_summary().await.is_err());
    }
}
