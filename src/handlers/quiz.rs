use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use maud::{html, Markup};
use serde::Deserialize;

use crate::{
    extractors::{IsHtmx, QuizToken},
    models::QuizRequest,
    names,
    rejections::{AppError, ResultExt},
    services::quiz::GenerateOutcome,
    session::{AnswerError, Phase, QuizSession, SubmitError},
    utils, views,
    views::quiz as quiz_views,
    AppState,
};

/// Deserialize a value that may be either a JSON number or a string
/// containing a number. HTML forms via htmx json-enc always send values as
/// strings.
fn deserialize_string_or_u32<'de, D: serde::Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    struct Vis;
    impl serde::de::Visitor<'_> for Vis {
        type Value = u32;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("number or numeric string")
        }
        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<u32, E> {
            u32::try_from(v).map_err(E::custom)
        }
        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<u32, E> {
            u32::try_from(v).map_err(E::custom)
        }
        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<u32, E> {
            v.parse().map_err(E::custom)
        }
    }
    d.deserialize_any(Vis)
}

#[derive(Deserialize)]
struct GenerateBody {
    topic: String,
    #[serde(
        default = "default_question_count",
        deserialize_with = "deserialize_string_or_u32"
    )]
    question_count: u32,
    #[serde(default)]
    instructions: String,
}

fn default_question_count() -> u32 {
    names::DEFAULT_QUESTION_COUNT
}

#[derive(Deserialize)]
struct SelectAnswerBody {
    #[serde(deserialize_with = "deserialize_string_or_u32")]
    question_idx: u32,
    option: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route(names::GENERATE_URL, post(generate))
        .route(names::SELECT_ANSWER_URL, post(select_answer))
        .route(names::SUBMIT_QUIZ_URL, post(submit))
        .route(names::RESET_URL, post(reset))
}

/// Compose the whole page body: flash banner, setup form, the current
/// session's quiz or results, and the stats panel at the bottom.
async fn page_body(state: &AppState, session: Option<&QuizSession>, flash: Markup) -> Markup {
    let session_section = match session {
        Some(s) => match s.phase() {
            Phase::Generated if state.display_only => quiz_views::display_list(s.questions()),
            Phase::Generated => quiz_views::questions(s.questions(), s.answers()),
            Phase::Submitted => quiz_views::results(s.questions(), s.answers(), &s.score()),
            Phase::Idle => html! {},
        },
        None => html! {},
    };

    // The stats read is best-effort; a failed panel never takes the quiz
    // flow down with it.
    let stats_section = match state.quiz.latency_summary().await {
        Ok(summary) => quiz_views::stats_panel(summary.as_ref()),
        Err(e) => {
            tracing::error!("could not load quiz statistics: {e}");
            quiz_views::stats_error()
        }
    };

    html! {
        (flash)
        (quiz_views::setup_form())
        (session_section)
        (stats_section)
    }
}

async fn home(
    State(state): State<AppState>,
    IsHtmx(is_htmx): IsHtmx,
    QuizToken(token): QuizToken,
) -> Markup {
    let session = token.and_then(|t| state.sessions.snapshot(&t));
    let body = page_body(&state, session.as_ref(), html! {}).await;

    views::render(is_htmx, "Quiz", body)
}

async fn generate(
    State(state): State<AppState>,
    QuizToken(token): QuizToken,
    Json(body): Json<GenerateBody>,
) -> Result<axum::response::Response, AppError> {
    let topic = body.topic.trim();
    if topic.is_empty() {
        return Err(AppError::Input("quiz topic must not be empty"));
    }

    let question_count = body
        .question_count
        .clamp(names::MIN_QUESTION_COUNT, names::MAX_QUESTION_COUNT);

    let request = QuizRequest {
        topic: topic.to_string(),
        question_count,
        instructions: body.instructions.trim().to_string(),
    };

    // Reuse the browser's session if it still exists, otherwise start one.
    let token = match token {
        Some(t) if state.sessions.snapshot(&t).is_some() => t,
        _ => state.sessions.create(),
    };

    let outcome = state.quiz.generate_quiz(&request).await;

    let (flash, session) = match outcome {
        GenerateOutcome::Generated {
            questions,
            latency_ms,
            log_warning,
        } => {
            state
                .sessions
                .update(&token, |s| s.begin(questions, latency_ms))
                .ok_or(AppError::Internal("quiz session disappeared"))?;
            tracing::info!("quiz generated for topic '{}' in {latency_ms}ms", request.topic);
            (
                quiz_views::generated_banner(latency_ms, log_warning.as_deref()),
                state.sessions.snapshot(&token),
            )
        }
        GenerateOutcome::CountMismatch { requested, .. } => {
            // Generation failed: the session keeps whatever it had before.
            (
                quiz_views::mismatch_banner(requested),
                state.sessions.snapshot(&token),
            )
        }
        GenerateOutcome::ProviderError(message) => (
            html! {
                (quiz_views::error_banner("Failed to generate quiz."))
                (quiz_views::error_banner(&format!("Error: {message}")))
            },
            state.sessions.snapshot(&token),
        ),
    };

    let page = views::titled("Quiz", page_body(&state, session.as_ref(), flash).await);

    let cookie = utils::cookie(
        names::QUIZ_SESSION_COOKIE_NAME,
        &token,
        state.secure_cookies,
    )
    .reject("could not build session cookie")?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    Ok((headers, page).into_response())
}

async fn select_answer(
    State(state): State<AppState>,
    QuizToken(token): QuizToken,
    Json(body): Json<SelectAnswerBody>,
) -> Result<StatusCode, AppError> {
    let token = token.ok_or(AppError::Input("no active quiz session"))?;

    let result = state
        .sessions
        .update(&token, |s| {
            s.select_answer(body.question_idx as usize, body.option)
        })
        .ok_or(AppError::Input("no active quiz session"))?;

    match result {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(AnswerError::NotAccepting) => {
            Err(AppError::Input("quiz is not accepting answers"))
        }
        Err(AnswerError::OutOfRange { index, count }) => {
            tracing::warn!("answer index {index} out of range for {count} questions");
            Err(AppError::Input("question index out of range"))
        }
    }
}

async fn submit(
    State(state): State<AppState>,
    QuizToken(token): QuizToken,
) -> Result<Markup, AppError> {
    let token = token.ok_or(AppError::Input("no active quiz session"))?;

    let result = state
        .sessions
        .update(&token, |s| s.submit())
        .ok_or(AppError::Input("no active quiz session"))?;

    let flash = match result {
        Ok(score) => {
            tracing::info!(
                "quiz submitted: {}/{} ({:.1}%)",
                score.correct,
                score.total,
                score.percent()
            );
            html! {}
        }
        Err(SubmitError::Unanswered(indices)) => quiz_views::unanswered_banner(&indices),
        Err(SubmitError::NothingToSubmit) => {
            return Err(AppError::Input("no quiz to submit"));
        }
    };

    let session = state.sessions.snapshot(&token);
    Ok(views::titled(
        "Quiz",
        page_body(&state, session.as_ref(), flash).await,
    ))
}

async fn reset(
    State(state): State<AppState>,
    QuizToken(token): QuizToken,
) -> Result<Markup, AppError> {
    if let Some(token) = token {
        state.sessions.update(&token, |s| s.reset());
    }

    Ok(views::titled("Quiz", page_body(&state, None, html! {}).await))
}
