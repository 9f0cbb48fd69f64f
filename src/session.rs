use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ulid::Ulid;

use crate::models::Question;
use crate::names;

/// Where a quiz session is in its lifecycle.
///
/// `Generated` self-loops on answer selection; `Submitted` is only left via
/// `reset`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Phase {
    #[default]
    Idle,
    Generated,
    Submitted,
}

#[derive(Debug, PartialEq)]
pub enum AnswerError {
    /// The session is not currently accepting answers (no quiz, or already
    /// submitted).
    NotAccepting,
    OutOfRange {
        index: usize,
        count: usize,
    },
}

impl std::fmt::Display for AnswerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerError::NotAccepting => write!(f, "session is not accepting answers"),
            AnswerError::OutOfRange { index, count } => {
                write!(f, "question index {index} out of range for {count} questions")
            }
        }
    }
}

impl std::error::Error for AnswerError {}

#[derive(Debug, PartialEq)]
pub enum SubmitError {
    /// No quiz has been generated yet.
    NothingToSubmit,
    /// Indices of questions with no real answer recorded.
    Unanswered(Vec<usize>),
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::NothingToSubmit => write!(f, "no quiz to submit"),
            SubmitError::Unanswered(indices) => {
                write!(f, "{} questions are unanswered", indices.len())
            }
        }
    }
}

impl std::error::Error for SubmitError {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl Score {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 * 100.0 / self.total as f64
        }
    }
}

/// One user's quiz, from generation through scoring.
///
/// Owned exclusively by the current browser session; nothing here outlives
/// it except the latency row the persistence gateway writes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuizSession {
    phase: Phase,
    questions: Vec<Question>,
    answers: HashMap<usize, String>,
    generation_latency_ms: i64,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &HashMap<usize, String> {
        &self.answers
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn generation_latency_ms(&self) -> i64 {
        self.generation_latency_ms
    }

    /// Install a freshly generated question set and move to `Generated`.
    ///
    /// Allowed from any phase: regenerating replaces the previous quiz and
    /// clears all recorded answers.
    pub fn begin(&mut self, questions: Vec<Question>, latency_ms: i64) {
        self.phase = Phase::Generated;
        self.questions = questions;
        self.answers = HashMap::new();
        self.generation_latency_ms = latency_ms;
    }

    /// Record the selected option for one question.
    ///
    /// The placeholder value is recordable like any other option; `submit`
    /// is where it counts as missing.
    pub fn select_answer(&mut self, index: usize, choice: String) -> Result<(), AnswerError> {
        if self.phase != Phase::Generated {
            return Err(AnswerError::NotAccepting);
        }
        if index >= self.questions.len() {
            return Err(AnswerError::OutOfRange {
                index,
                count: self.questions.len(),
            });
        }
        self.answers.insert(index, choice);
        Ok(())
    }

    /// Indices of questions whose answer is absent or still the placeholder.
    pub fn unanswered(&self) -> Vec<usize> {
        (0..self.questions.len())
            .filter(|i| match self.answers.get(i) {
                None => true,
                Some(a) => a == names::ANSWER_PLACEHOLDER,
            })
            .collect()
    }

    /// Move to `Submitted` and return the score, or report which questions
    /// still need an answer. Re-submitting an already submitted quiz just
    /// returns the score again.
    pub fn submit(&mut self) -> Result<Score, SubmitError> {
        match self.phase {
            Phase::Idle => Err(SubmitError::NothingToSubmit),
            Phase::Submitted => Ok(self.score()),
            Phase::Generated => {
                let unanswered = self.unanswered();
                if !unanswered.is_empty() {
                    return Err(SubmitError::Unanswered(unanswered));
                }
                self.phase = Phase::Submitted;
                Ok(self.score())
            }
        }
    }

    /// Pure function of the current questions and answers.
    pub fn score(&self) -> Score {
        let correct = self
            .questions
            .iter()
            .enumerate()
            .filter(|(i, q)| self.answers.get(i).is_some_and(|a| q.is_correct(a)))
            .count();
        Score {
            correct,
            total: self.questions.len(),
        }
    }

    /// Back to a state indistinguishable from a freshly constructed session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Server-side home for quiz sessions, keyed by the `quiz_session` cookie.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, QuizSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session and return its token.
    pub fn create(&self) -> String {
        let token = Ulid::new().to_string();
        self.sessions
            .lock()
            .expect("session store lock poisoned")
            .insert(token.clone(), QuizSession::new());
        token
    }

    /// Clone the session out for rendering.
    pub fn snapshot(&self, token: &str) -> Option<QuizSession> {
        self.sessions
            .lock()
            .expect("session store lock poisoned")
            .get(token)
            .cloned()
    }

    /// Run a mutation under the lock. Returns `None` for an unknown token.
    pub fn update<R>(&self, token: &str, f: impl FnOnce(&mut QuizSession) -> R) -> Option<R> {
        self.sessions
            .lock()
            .expect("session store lock poisoned")
            .get_mut(token)
            .map(f)
    }
}
