use std::time::Instant;

use color_eyre::eyre::eyre;
use serde::{Deserialize, Serialize};

use crate::models::{Question, QuizRequest};
use crate::names;

// ---------------------------------------------------------------------------
// Provider wire types (OpenAI-compatible chat completions)
// ---------------------------------------------------------------------------

#[derive(Serialize, Debug, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize, Debug)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
    content: String,
}

/// The question shape the prompt asks the model to emit.
#[derive(Deserialize, Debug)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    answer: String,
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// A validated question set plus how long the provider took to produce it.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedQuiz {
    pub questions: Vec<Question>,
    pub latency_ms: i64,
}

#[derive(Debug)]
pub enum GenerateError {
    /// The provider answered, but not with the requested number of questions.
    Mismatch { requested: u32, received: usize },
    /// Transport, status, or malformed-output failure from the provider.
    Provider(color_eyre::Report),
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::Mismatch {
                requested,
                received,
            } => write!(
                f,
                "provider returned {received} questions, requested {requested}"
            ),
            GenerateError::Provider(report) => write!(f, "provider call failed: {report}"),
        }
    }
}

impl std::error::Error for GenerateError {}

/// Wraps the hosted LLM provider behind a single `generate` call.
///
/// One attempt per call; retrying is left to the user pressing the button
/// again.
#[derive(Clone)]
pub struct Generator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl Generator {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }

    pub async fn generate(&self, request: &QuizRequest) -> Result<GeneratedQuiz, GenerateError> {
        let started = Instant::now();

        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: build_messages(request),
            temperature: 0.7,
            max_tokens: 4096,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateError::Provider(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GenerateError::Provider(eyre!(
                "provider returned {status}: {detail}"
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Provider(e.into()))?;

        // No completion at all counts as a mismatch, like an empty list.
        let Some(content) = completion.choices.first().map(|c| c.message.content.as_str())
        else {
            return Err(GenerateError::Mismatch {
                requested: request.question_count,
                received: 0,
            });
        };

        let questions = parse_questions(content).map_err(GenerateError::Provider)?;

        // Latency covers request start through parsed-response availability.
        let latency_ms = started.elapsed().as_millis() as i64;

        validate_count(request.question_count, &questions)?;

        Ok(GeneratedQuiz {
            questions,
            latency_ms,
        })
    }
}

impl crate::services::quiz::QuestionSource for Generator {
    async fn generate(&self, request: &QuizRequest) -> Result<GeneratedQuiz, GenerateError> {
        Generator::generate(self, request).await
    }
}

/// The count sent to the provider is capped at PROVIDER_QUESTION_CAP while the
/// appended instruction text demands the full requested count; requests above
/// the cap therefore fail validation every time. Deliberately kept that way.
fn build_messages(request: &QuizRequest) -> Vec<ChatMessage> {
    let capped = request.question_count.min(names::PROVIDER_QUESTION_CAP);

    let system = "You are a quiz generator. Respond with a JSON array only, no prose. \
                  Each element must be an object with keys \"question\" (string), \
                  \"options\" (array of at least 2 strings) and \"answer\" (string, \
                  one of the options)."
        .to_string();

    let user = format!(
        "Write {capped} multiple-choice questions about the topic: {topic}. \
         {instructions}. Generate exactly {requested} questions.",
        topic = request.topic,
        instructions = request.instructions,
        requested = request.question_count,
    );

    vec![
        ChatMessage {
            role: "system".to_string(),
            content: system,
        },
        ChatMessage {
            role: "user".to_string(),
            content: user,
        },
    ]
}

/// Parse the model's reply into validated questions. Tolerates the reply
/// being wrapped in a Markdown code fence.
fn parse_questions(content: &str) -> color_eyre::Result<Vec<Question>> {
    let json = strip_code_fence(content);
    let raw: Vec<RawQuestion> =
        serde_json::from_str(json).map_err(|e| eyre!("could not parse provider output: {e}"))?;

    raw.into_iter()
        .map(|q| {
            Question::new(q.question, q.options, q.answer)
                .map_err(|e| eyre!("malformed question from provider: {e}"))
        })
        .collect()
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag after the opening fence.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

fn validate_count(requested: u32, questions: &[Question]) -> Result<(), GenerateError> {
    if questions.is_empty() || questions.len() != requested as usize {
        return Err(GenerateError::Mismatch {
            requested,
            received: questions.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(count: u32) -> QuizRequest {
        QuizRequest {
            topic: "Psychology".to_string(),
            question_count: count,
            instructions: "Classical Conditioning".to_string(),
        }
    }

    fn question(n: usize) -> Question {
        Question::new(
            format!("Q{n}"),
            vec!["a".to_string(), "b".to_string()],
            "a".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn prompt_caps_provider_count_but_demands_full_count() {
        let messages = build_messages(&request(20));
        let user = &messages[1].content;
        assert!(user.starts_with("Write 8 multiple-choice questions"));
        assert!(user.contains("Generate exactly 20 questions."));
    }

    #[test]
    fn prompt_below_cap_uses_requested_count() {
        let messages = build_messages(&request(5));
        let user = &messages[1].content;
        assert!(user.starts_with("Write 5 multiple-choice questions"));
        assert!(user.contains("Generate exactly 5 questions."));
    }

    #[test]
    fn count_above_cap_always_mismatches() {
        // The provider honors the cap, so a request for 9..=50 gets 8 back.
        for requested in [9u32, 10, 50] {
            let questions: Vec<Question> = (0..8).map(question).collect();
            let err = validate_count(requested, &questions).unwrap_err();
            match err {
                GenerateError::Mismatch {
                    requested: r,
                    received,
                } => {
                    assert_eq!(r, requested);
                    assert_eq!(received, 8);
                }
                other => panic!("expected mismatch, got {other}"),
            }
        }
    }

    #[test]
    fn empty_question_list_is_a_mismatch() {
        assert!(matches!(
            validate_count(3, &[]),
            Err(GenerateError::Mismatch {
                requested: 3,
                received: 0
            })
        ));
    }

    #[test]
    fn exact_count_validates() {
        let questions: Vec<Question> = (0..4).map(question).collect();
        assert!(validate_count(4, &questions).is_ok());
    }

    #[test]
    fn parses_plain_json_array() {
        let content = r#"[{"question":"Q1","options":["a","b"],"answer":"a"}]"#;
        let questions = parse_questions(content).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].prompt, "Q1");
        assert_eq!(questions[0].answer, "a");
    }

    #[test]
    fn parses_fenced_json_array() {
        let content = "```json\n[{\"question\":\"Q1\",\"options\":[\"a\",\"b\"],\"answer\":\"b\"}]\n```";
        let questions = parse_questions(content).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].answer, "b");
    }

    #[test]
    fn rejects_answer_outside_options() {
        let content = r#"[{"question":"Q1","options":["a","b"],"answer":"c"}]"#;
        assert!(parse_questions(content).is_err());
    }

    #[test]
    fn rejects_non_json_output() {
        assert!(parse_questions("Sure! Here are your questions:").is_err());
    }
}
