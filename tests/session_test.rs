use std::collections::HashSet;

use blitzquiz::models::Question;
use blitzquiz::names;
use blitzquiz::session::{Phase, QuizSession, SessionStore, SubmitError};

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

#[test]
fn full_lifecycle_generate_answer_submit_reset() {
    let mut session = QuizSession::new();
    assert_eq!(*session.phase(), Phase::Idle);

    session.begin(make_questions(4), 850);
    assert_eq!(*session.phase(), Phase::Generated);
    assert_eq!(session.questions().len(), 4);
    assert_eq!(session.generation_latency_ms(), 850);

    // Answer everything, one wrong.
    session.select_answer(0, "Correct 1".to_string()).unwrap();
    session.select_answer(1, "Correct 2".to_string()).unwrap();
    session.select_answer(2, "Wrong 3".to_string()).unwrap();
    session.select_answer(3, "Correct 4".to_string()).unwrap();

    let score = session.submit().unwrap();
    assert_eq!(*session.phase(), Phase::Submitted);
    assert_eq!(score.correct, 3);
    assert_eq!(score.total, 4);
    assert_eq!(score.percent(), 75.0);

    session.reset();
    assert_eq!(session, QuizSession::new());
}

#[test]
fn submit_is_gated_on_every_question_being_answered() {
    let mut session = QuizSession::new();
    session.begin(make_questions(3), 0);

    session.select_answer(0, "Correct 1".to_string()).unwrap();
    session
        .select_answer(1, names::ANSWER_PLACEHOLDER.to_string())
        .unwrap();
    session.select_answer(2, "Wrong 3".to_string()).unwrap();

    // Index 1 still holds the placeholder value.
    assert_eq!(session.submit(), Err(SubmitError::Unanswered(vec![1])));
    assert_eq!(*session.phase(), Phase::Generated);

    session.select_answer(1, "Correct 2".to_string()).unwrap();
    assert!(session.submit().is_ok());
}

#[test]
fn unanswered_covers_missing_and_placeholder_answers() {
    let mut session = QuizSession::new();
    session.begin(make_questions(5), 0);

    session.select_answer(1, "Correct 2".to_string()).unwrap();
    session
        .select_answer(3, names::ANSWER_PLACEHOLDER.to_string())
        .unwrap();

    assert_eq!(session.unanswered(), vec![0, 2, 3, 4]);
}

#[test]
fn changing_an_answer_overwrites_the_previous_selection() {
    let mut session = QuizSession::new();
    session.begin(make_questions(1), 0);

    session.select_answer(0, "Wrong 1".to_string()).unwrap();
    session.select_answer(0, "Correct 1".to_string()).unwrap();

    let score = session.submit().unwrap();
    assert_eq!(score.correct, 1);
}

#[test]
fn regeneration_replaces_the_quiz_and_clears_answers() {
    let mut session = QuizSession::new();
    session.begin(make_questions(2), 100);
    session.select_answer(0, "Correct 1".to_string()).unwrap();

    session.begin(make_questions(3), 200);
    assert_eq!(*session.phase(), Phase::Generated);
    assert_eq!(session.questions().len(), 3);
    assert!(session.answers().is_empty());
    assert_eq!(session.generation_latency_ms(), 200);
}

#[test]
fn store_keeps_sessions_independent() {
    let store = SessionStore::new();
    let token_a = store.create();
    let token_b = store.create();
    assert_ne!(token_a, token_b);

    store
        .update(&token_a, |s| s.begin(make_questions(2), 10))
        .unwrap();

    let a = store.snapshot(&token_a).unwrap();
    let b = store.snapshot(&token_b).unwrap();
    assert_eq!(*a.phase(), Phase::Generated);
    assert_eq!(*b.phase(), Phase::Idle);
}

#[test]
fn store_tokens_are_unique() {
    let store = SessionStore::new();
    let tokens: HashSet<String> = (0..100).map(|_| store.create()).collect();
    assert_eq!(tokens.len(), 100);
}
