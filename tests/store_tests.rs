// tests/store_tests.rs

//! Store-level behaviour shared by both adapters.
//!
//! Every scenario runs against a throw-away SQLite file and, when
//! `TEST_POSTGRES_URL` points at a live database, against Postgres too.

mod common;

use std::sync::Arc;

use chrono::Utc;
use common::{postgres_store, temp_sqlite, unique_name};
use quiz_service::{
    db::{ProfileRepository, QuestionRepository, Store, SubmissionLedger},
    models::{
        question::NewQuestion,
        submission::{AnswerInput, AnswerResult, NewSubmission},
        user::Identity,
    },
    services,
};

/// Answers with this question id fail to insert once the failure trigger is installed.
const POISONED_QUESTION_ID: i64 = -666;

async fn seed_question<S: Store + ?Sized>(store: &S, correct: &str) -> i64 {
    store
        .create_question(&NewQuestion {
            question_text: "Capital of France?".to_string(),
            option_a: "Lyon".to_string(),
            option_b: "Nice".to_string(),
            option_c: "Paris".to_string(),
            option_d: "Lille".to_string(),
            correct_option: correct.to_string(),
        })
        .await
        .expect("Failed to seed question")
}

fn identity(username: &str) -> Identity {
    Identity {
        username: username.to_string(),
        email: None,
        first_name: None,
        last_name: None,
        is_staff: false,
    }
}

async fn concurrent_adjustments_sum_exactly<S: Store + 'static>(store: Arc<S>) {
    let username = unique_name("ledger");
    store.adjust_score(&username, 100).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..50 {
        let store = store.clone();
        let username = username.clone();
        let delta = if i % 5 == 0 { -2 } else { 3 };
        handles.push(tokio::spawn(async move {
            store.adjust_score(&username, delta).await.unwrap()
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_some());
    }

    // 10 decrements of 2, 40 increments of 3
    let profile = store.get_profile(&username).await.unwrap().unwrap();
    assert_eq!(profile.score, 100 - 20 + 120);
}

async fn overflowing_adjustment_changes_nothing<S: Store + ?Sized>(store: &S) {
    let username = unique_name("ovf");

    assert_eq!(store.adjust_score(&username, i32::MAX).await.unwrap(), Some(i32::MAX));
    assert_eq!(store.adjust_score(&username, 1).await.unwrap(), None);
    assert_eq!(store.adjust_score(&username, -1).await.unwrap(), Some(i32::MAX - 1));

    let low = unique_name("ovf_low");
    assert_eq!(store.adjust_score(&low, i32::MIN).await.unwrap(), Some(i32::MIN));
    assert_eq!(store.adjust_score(&low, -1).await.unwrap(), None);

    let profile = store.get_profile(&low).await.unwrap().unwrap();
    assert_eq!(profile.score, i32::MIN);
}

async fn profile_lookup_ignores_case<S: Store + ?Sized>(store: &S) {
    let username = unique_name("Scorer");
    store.adjust_score(&username, 5).await.unwrap();

    let profile = store
        .get_profile(&username.to_lowercase())
        .await
        .unwrap()
        .expect("profile should be found case-insensitively");
    assert_eq!(profile.username, username);
    assert_eq!(profile.score, 5);
}

async fn lookup_beyond_bind_limit<S: Store + ?Sized>(store: &S) {
    let known = seed_question(store, "C").await;

    // More distinct ids than SQLite accepts as bound variables in one statement.
    let mut ids: Vec<i64> = (1..=33_000).map(|i| -i).collect();
    ids.push(known);

    let questions = store.get_questions(&ids).await.unwrap();
    assert_eq!(questions.len(), 1);
    assert!(questions.contains_key(&known));
}

async fn unknown_ids_are_recorded_as_wrong<S: Store + ?Sized>(store: &S) {
    let known = seed_question(store, "C").await;
    let username = unique_name("unknown");

    let answers = [
        AnswerInput {
            question_id: known,
            selected_option: "c".to_string(),
        },
        AnswerInput {
            question_id: -1,
            selected_option: "B".to_string(),
        },
    ];
    let response = services::scoring::submit(store, Some(&identity(&username)), &answers)
        .await
        .unwrap();
    assert_eq!(response.total_questions, 2);
    assert_eq!(response.correct_answers, 1);
    assert_eq!(response.score_percent, 50);

    let record = store.latest_submission(&username).await.unwrap().unwrap();
    assert_eq!(record.submission.id, response.submission_id);
    assert_eq!(record.answers.len(), 2);
    assert_eq!(record.answers[0].question_id, known);
    assert!(record.answers[0].is_correct);
    assert_eq!(record.answers[1].question_id, -1);
    assert!(!record.answers[1].is_correct);
}

/// Expects the failure trigger for `POISONED_QUESTION_ID` to be installed.
async fn failed_detail_insert_leaves_no_rows<S: Store + ?Sized>(store: &S) {
    let known = seed_question(store, "C").await;
    let username = unique_name("rollback");

    let details = [
        AnswerResult {
            question_id: known,
            question_text: None,
            selected_option: "C".to_string(),
            is_correct: true,
            correct_option: Some("C".to_string()),
        },
        AnswerResult {
            question_id: POISONED_QUESTION_ID,
            question_text: None,
            selected_option: "A".to_string(),
            is_correct: false,
            correct_option: None,
        },
    ];

    let result = store
        .record_submission(&NewSubmission {
            username: &username,
            total_questions: 2,
            correct_answers: 1,
            answers: &details,
            created_at: Utc::now(),
        })
        .await;
    assert!(result.is_err());

    assert!(store.latest_submission(&username).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_concurrent_adjustments_sum_exactly() {
    let db = temp_sqlite().await;
    concurrent_adjustments_sum_exactly(db.store.clone()).await;
}

#[tokio::test]
async fn sqlite_overflowing_adjustment_changes_nothing() {
    let db = temp_sqlite().await;
    overflowing_adjustment_changes_nothing(db.store.as_ref()).await;
}

#[tokio::test]
async fn sqlite_profile_lookup_ignores_case() {
    let db = temp_sqlite().await;
    profile_lookup_ignores_case(db.store.as_ref()).await;
}

#[tokio::test]
async fn sqlite_lookup_beyond_bind_limit() {
    let db = temp_sqlite().await;
    lookup_beyond_bind_limit(db.store.as_ref()).await;
}

#[tokio::test]
async fn sqlite_unknown_ids_are_recorded_as_wrong() {
    let db = temp_sqlite().await;
    unknown_ids_are_recorded_as_wrong(db.store.as_ref()).await;
}

#[tokio::test]
async fn sqlite_failed_detail_insert_leaves_no_rows() {
    let db = temp_sqlite().await;

    sqlx::query(&format!(
        r#"
        CREATE TRIGGER fail_detail BEFORE INSERT ON submission_answers
        WHEN NEW.question_id = {}
        BEGIN
            SELECT RAISE(ABORT, 'injected');
        END;
        "#,
        POISONED_QUESTION_ID
    ))
    .execute(db.store.pool())
    .await
    .unwrap();

    failed_detail_insert_leaves_no_rows(db.store.as_ref()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn postgres_concurrent_adjustments_sum_exactly() {
    let Some(store) = postgres_store().await else {
        return;
    };
    concurrent_adjustments_sum_exactly(store).await;
}

#[tokio::test]
async fn postgres_overflowing_adjustment_changes_nothing() {
    let Some(store) = postgres_store().await else {
        return;
    };
    overflowing_adjustment_changes_nothing(store.as_ref()).await;
}

#[tokio::test]
async fn postgres_profile_lookup_ignores_case() {
    let Some(store) = postgres_store().await else {
        return;
    };
    profile_lookup_ignores_case(store.as_ref()).await;
}

#[tokio::test]
async fn postgres_lookup_beyond_bind_limit() {
    let Some(store) = postgres_store().await else {
        return;
    };
    lookup_beyond_bind_limit(store.as_ref()).await;
}

#[tokio::test]
async fn postgres_unknown_ids_are_recorded_as_wrong() {
    let Some(store) = postgres_store().await else {
        return;
    };
    unknown_ids_are_recorded_as_wrong(store.as_ref()).await;
}

#[tokio::test]
async fn postgres_failed_detail_insert_leaves_no_rows() {
    let Some(store) = postgres_store().await else {
        return;
    };

    sqlx::query(&format!(
        r#"
        CREATE OR REPLACE FUNCTION fail_detail() RETURNS trigger AS $$
        BEGIN
            IF NEW.question_id = {} THEN
                RAISE EXCEPTION 'injected';
            END IF;
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        "#,
        POISONED_QUESTION_ID
    ))
    .execute(store.pool())
    .await
    .unwrap();
    sqlx::query("DROP TRIGGER IF EXISTS fail_detail ON submission_answers")
        .execute(store.pool())
        .await
        .unwrap();
    sqlx::query(
        "CREATE TRIGGER fail_detail BEFORE INSERT ON submission_answers \
         FOR EACH ROW EXECUTE FUNCTION fail_detail()",
    )
    .execute(store.pool())
    .await
    .unwrap();

    failed_detail_insert_leaves_no_rows(store.as_ref()).await;
}
