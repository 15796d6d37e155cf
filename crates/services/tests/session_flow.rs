use std::collections::BTreeMap;
use std::sync::Arc;

use quiz_core::model::{
    Catalog, OptionId, QuestionId, QuestionStatus, SessionSnapshot, WrongAnswerRecord,
};
use quiz_core::time::fixed_clock;
use services::{QuizSession, SessionError, View};

const CATALOG: &str = r#"[
    {"id": 1, "category": "Cloud Concepts", "question": "Q1", "type": "single",
     "options": [{"id": "a", "text": "A"}, {"id": "b", "text": "B"}], "correctAnswers": ["a"]},
    {"id": 2, "category": "Cloud Concepts", "question": "Q2", "type": "single",
     "options": [{"id": "a", "text": "A"}, {"id": "b", "text": "B"}], "correctAnswers": ["b"]},
    {"id": 3, "category": "Billing, Pricing, and Support", "question": "Q3", "type": "multiple",
     "options": [{"id": "a", "text": "A"}, {"id": "b", "text": "B"}, {"id": "c", "text": "C"}],
     "correctAnswers": ["a", "c"]},
    {"id": 4, "category": "Cloud Concepts", "question": "Q4", "type": "single",
     "options": [{"id": "a", "text": "A"}, {"id": "b", "text": "B"}], "correctAnswers": ["a"]},
    {"id": 5, "question": "Q5", "type": "single",
     "options": [{"id": "a", "text": "A"}, {"id": "b", "text": "B"}], "correctAnswers": ["a"],
     "explanation": "Because."}
]"#;

fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_json(CATALOG).expect("catalog"))
}

fn ids(raw: &[u64]) -> Vec<QuestionId> {
    raw.iter().copied().map(QuestionId::new).collect()
}

/// Session positioned on a known order via restore.
fn session_in_order(order: &[u64]) -> QuizSession {
    let mut session = QuizSession::with_seed(catalog(), 7);
    session
        .restore(&SessionSnapshot {
            question_order: ids(order),
            current_index: 0,
            answered_count: 0,
            correct_count: 0,
            wrong_count: 0,
            question_status_map: BTreeMap::new(),
            wrong_answers: Vec::new(),
            flagged_questions: Vec::new(),
            saved_at: None,
        })
        .expect("restore");
    session
}

fn answer(session: &mut QuizSession, options: &[&str]) -> bool {
    for option in options {
        session.select_option(&OptionId::new(*option));
    }
    session.check_answer().expect("evaluation").is_correct
}

fn current_id(session: &QuizSession) -> u64 {
    session.current_question().expect("current").id().value()
}

#[test]
fn full_pass_keeps_tallies_consistent() {
    let mut session = QuizSession::with_seed(catalog(), 3);
    session.start_session().unwrap();

    // Categories arrive grouped: billing, then cloud concepts, then uncategorized.
    let labels: Vec<_> = session.questions().iter().map(|q| q.group_label()).collect();
    assert_eq!(labels[0], "Billing, Pricing, and Support");
    assert_eq!(labels[4], "Uncategorized");

    for _ in 0..5 {
        answer(&mut session, &["a"]);
        assert_eq!(
            session.answered_count(),
            session.correct_count() + session.wrong_count()
        );
        session.next_question();
    }

    let progress = session.progress();
    assert!(progress.all_answered);
    // Q1, Q4, Q5 are "a"; Q2 is "b"; Q3 needs a and c.
    assert_eq!(progress.correct, 3);
    assert_eq!(progress.wrong, 2);
    assert_eq!(progress.accuracy_percent, 60);
    assert_eq!(session.current_index(), 0);
}

#[test]
fn navigation_stays_in_category_then_moves_on() {
    let mut session = session_in_order(&[1, 3, 2, 5, 4]);

    assert!(answer(&mut session, &["a"]));
    session.next_question();
    assert_eq!(current_id(&session), 2);

    answer(&mut session, &["b"]);
    session.next_question();
    assert_eq!(current_id(&session), 4);

    answer(&mut session, &["a"]);
    session.next_question();
    // No cloud concepts left; first unanswered scanning forward wraps to index 1.
    assert_eq!(current_id(&session), 3);
}

#[test]
fn retry_wrong_flips_question_to_correct() {
    let mut session = session_in_order(&[1, 2, 3]);
    assert!(!answer(&mut session, &["b"]));
    session.next_question();
    assert!(answer(&mut session, &["b"]));
    session.stop_and_review();

    session.retry_wrong_answers().unwrap();
    assert_eq!(session.view(), View::Quiz);
    assert_eq!(current_id(&session), 1);
    assert!(answer(&mut session, &["a"]));

    assert_eq!(session.answered_count(), 2);
    assert_eq!(session.correct_count(), 2);
    assert_eq!(session.wrong_count(), 0);
    assert!(session.wrong_answers().is_empty());
    assert_eq!(session.retry_wrong_answers(), Err(SessionError::Empty));
}

#[test]
fn clearing_a_wrong_answer_allows_another_attempt() {
    let mut session = session_in_order(&[3, 1]);
    assert!(!answer(&mut session, &["a"]));

    session.clear_answer();
    assert!(!session.is_checked());
    assert!(session.selection().is_empty());
    assert_eq!(session.wrong_count(), 1);

    assert!(answer(&mut session, &["a", "c"]));
    assert_eq!(session.wrong_count(), 0);
    assert_eq!(session.status_of(QuestionId::new(3)), Some(QuestionStatus::Correct));
}

#[test]
fn jumping_back_shows_the_recorded_attempt() {
    let mut session = session_in_order(&[3, 1, 2]);
    answer(&mut session, &["b"]);
    session.jump_to(2);
    assert!(!session.is_checked());

    session.jump_to(0);
    assert!(session.is_checked());
    assert!(!session.is_correct());
    assert_eq!(session.selection(), &[OptionId::new("b")]);
}

#[test]
fn flagged_retry_and_review_list() {
    let mut session = session_in_order(&[1, 2, 5]);
    session.toggle_current_flag();
    session.jump_to(2);
    session.toggle_current_flag();

    let list = session.question_list();
    assert!(list[0].flagged);
    assert!(!list[1].flagged);
    assert!(list[2].is_current);

    session.retry_flagged_questions().unwrap();
    let mut retried: Vec<_> = session.questions().iter().map(|q| q.id().value()).collect();
    retried.sort_unstable();
    assert_eq!(retried, vec![1, 5]);
}

#[test]
fn snapshot_restores_into_fresh_session() {
    let mut session = session_in_order(&[2, 1, 4]);
    answer(&mut session, &["a"]);
    session.toggle_current_flag();
    session.next_question();

    let snapshot = session.snapshot(&fixed_clock());
    assert_eq!(
        snapshot.wrong_answers,
        vec![WrongAnswerRecord {
            question_id: QuestionId::new(2),
            selected_answers: vec![OptionId::new("a")],
        }]
    );

    let json = snapshot.to_json().unwrap();
    let decoded = SessionSnapshot::from_json(&json).unwrap();

    let mut resumed = QuizSession::with_seed(catalog(), 99);
    resumed.restore(&decoded).unwrap();
    assert_eq!(resumed.snapshot(&fixed_clock()), snapshot);
    assert_eq!(current_id(&resumed), 1);
    assert!(resumed.is_flagged(QuestionId::new(2)));
}
