use std::collections::HashMap;

use maud::{html, Markup};

use crate::models::Question;
use crate::names;
use crate::session::Score;
use crate::stats::LatencySummary;

/// The topic / count / instructions form.
pub fn setup_form() -> Markup {
    html! {
        article style="width: fit-content;" {
            header {
                h2 { "Configure Your Quiz" }
            }
            form hx-post=(names::GENERATE_URL)
                 hx-ext="json-enc"
                 hx-target="main"
                 hx-swap="innerHTML" {
                label {
                    "Quiz Topic"
                    input name="topic"
                          type="text"
                          value=(names::DEFAULT_TOPIC)
                          autocomplete="off"
                          required;
                }
                label {
                    "Number of Questions"
                    input name="question_count"
                          type="number"
                          min=(names::MIN_QUESTION_COUNT)
                          max=(names::MAX_QUESTION_COUNT)
                          value=(names::DEFAULT_QUESTION_COUNT)
                          required;
                }
                label {
                    "Custom Instructions"
                    textarea name="instructions" rows="3" {
                        (names::DEFAULT_INSTRUCTIONS)
                    }
                }
                input type="submit" value="Generate Quiz";
            }
        }
    }
}

/// Success line shown above a freshly generated quiz, with the optional
/// degraded-persistence warning under it.
pub fn generated_banner(latency_ms: i64, log_warning: Option<&str>) -> Markup {
    html! {
        p."banner-success" {
            "Quiz generated in " (latency_ms) " ms"
            " (\u{23F1} " (format!("{:.2}", latency_ms as f64 / 1000.0)) " seconds)."
        }
        @if let Some(warning) = log_warning {
            p."banner-warning" { (warning) }
        }
    }
}

pub fn error_banner(message: &str) -> Markup {
    html! {
        p."banner-error" { (message) }
    }
}

pub fn mismatch_banner(requested: u32) -> Markup {
    error_banner(&format!(
        "Failed to generate {requested} questions. Please try again."
    ))
}

/// Lists the 1-based numbers of questions that still need an answer.
pub fn unanswered_banner(indices: &[usize]) -> Markup {
    let numbers = indices
        .iter()
        .map(|i| (i + 1).to_string())
        .collect::<Vec<_>>()
        .join(", ");
    error_banner(&format!(
        "Please answer all questions before submitting! Unanswered questions: {numbers}"
    ))
}

/// The interactive question list. Every radio posts its selection as soon as
/// it changes; the placeholder option is selectable and counts as unanswered.
pub fn questions(questions: &[Question], answers: &HashMap<usize, String>) -> Markup {
    html! {
        h2 { "Your Quiz" }
        @for (idx, question) in questions.iter().enumerate() {
            article {
                p { strong { "Q" (idx + 1) ": " (question.prompt) } }
                fieldset {
                    (choice(idx, names::ANSWER_PLACEHOLDER, answers))
                    @for option in &question.options {
                        (choice(idx, option, answers))
                    }
                }
            }
        }
        button hx-post=(names::SUBMIT_QUIZ_URL)
               hx-target="main"
               hx-swap="innerHTML" {
            "Submit Quiz"
        }
    }
}

fn choice(idx: usize, option: &str, answers: &HashMap<usize, String>) -> Markup {
    let selected = match answers.get(&idx) {
        Some(answer) => answer == option,
        // Nothing recorded yet: the placeholder is what the control sits on.
        None => option == names::ANSWER_PLACEHOLDER,
    };
    let vals = serde_json::json!({ "question_idx": idx, "option": option }).to_string();

    html! {
        label {
            input type="radio"
                  name=(format!("q_{idx}"))
                  value=(option)
                  checked[selected]
                  hx-post=(names::SELECT_ANSWER_URL)
                  hx-ext="json-enc"
                  hx-vals=(vals)
                  hx-trigger="change"
                  hx-swap="none";
            (option)
        }
    }
}

/// Display-only rendering: questions with their answers inline, no
/// answering flow.
pub fn display_list(questions: &[Question]) -> Markup {
    html! {
        h2 { "Your Quiz" }
        @for (idx, question) in questions.iter().enumerate() {
            article {
                p { strong { "Q" (idx + 1) ": " (question.prompt) } }
                ul {
                    @for option in &question.options {
                        @if question.is_correct(option) {
                            li."option-correct" { (option) " \u{2705}" }
                        } @else {
                            li { (option) }
                        }
                    }
                }
            }
        }
    }
}

pub fn results(
    questions: &[Question],
    answers: &HashMap<usize, String>,
    score: &Score,
) -> Markup {
    html! {
        h2 { "Quiz Results" }
        @for (idx, question) in questions.iter().enumerate() {
            @let user_answer = answers.get(&idx).map(String::as_str).unwrap_or("");
            article {
                p { strong { "Q" (idx + 1) ": " (question.prompt) } }
                @if question.is_correct(user_answer) {
                    p."option-correct" { "\u{2705} Your answer: " strong { (user_answer) } " (Correct!)" }
                } @else {
                    p."option-incorrect" { "\u{274C} Your answer: " strong { (user_answer) } }
                    p { "\u{1F4DD} Correct answer: " strong { (question.answer) } }
                }
            }
        }
        p."banner-success" {
            "Final Score: " (score.correct) "/" (score.total)
            " (" (format!("{:.1}", score.percent())) "%)"
        }
        button hx-post=(names::RESET_URL)
               hx-target="main"
               hx-swap="innerHTML" {
            "Take Another Quiz"
        }
    }
}

/// The header renders even with nothing to show; the metrics only when at
/// least one row exists.
pub fn stats_panel(summary: Option<&LatencySummary>) -> Markup {
    html! {
        h2 { "\u{1F4CA} Quiz Generation Stats" }
        @if let Some(summary) = summary {
            article {
                table {
                    tbody {
                        tr {
                            td { "Average Generation Time" }
                            td { strong { (format!("{:.2}", summary.average_secs())) " seconds" } }
                        }
                        tr {
                            td { "Total Quizzes Generated" }
                            td { strong { (summary.total) } }
                        }
                    }
                }
            }
        }
    }
}

pub fn stats_error() -> Markup {
    html! {
        h2 { "\u{1F4CA} Quiz Generation Stats" }
        p."banner-error" { "Failed to load quiz statistics." }
    }
}
