use serde::{Deserialize, Serialize};

/// A single multiple-choice question as produced by the generation provider.
///
/// Invariant: `answer` is one of `options` and there are at least two
/// options. Use [`Question::new`] to construct one from untrusted input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, PartialEq)]
pub enum QuestionError {
    TooFewOptions { count: usize },
    AnswerNotInOptions,
}

impl std::fmt::Display for QuestionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionError::TooFewOptions { count } => {
                write!(f, "question has {count} options, need at least 2")
            }
            QuestionError::AnswerNotInOptions => {
                write!(f, "designated answer is not among the options")
            }
        }
    }
}

impl std::error::Error for QuestionError {}

impl Question {
    pub fn new(
        prompt: String,
        options: Vec<String>,
        answer: String,
    ) -> Result<Self, QuestionError> {
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                count: options.len(),
            });
        }
        if !options.contains(&answer) {
            return Err(QuestionError::AnswerNotInOptions);
        }
        Ok(Self {
            prompt,
            options,
            answer,
        })
    }

    pub fn is_correct(&self, choice: &str) -> bool {
        self.answer == choice
    }
}

/// What the user asked for on the setup form.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizRequest {
    pub topic: String,
    pub question_count: u32,
    pub instructions: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_enforces_answer_membership() {
        let err = Question::new(
            "Q".to_string(),
            vec!["a".to_string(), "b".to_string()],
            "c".to_string(),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::AnswerNotInOptions);
    }

    #[test]
    fn constructor_rejects_single_option() {
        let err =
            Question::new("Q".to_string(), vec!["a".to_string()], "a".to_string()).unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions { count: 1 });
    }

    #[test]
    fn is_correct_matches_exactly() {
        let q = Question::new(
            "Q".to_string(),
            vec!["a".to_string(), "b".to_string()],
            "a".to_string(),
        )
        .unwrap();
        assert!(q.is_correct("a"));
        assert!(!q.is_correct("b"));
        assert!(!q.is_correct("A"));
    }
}
