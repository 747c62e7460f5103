mod common;
use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    Action, Flow, seed_teacher, setup_server, setup_test_db, signin_teacher_action, signup_action,
};

#[tokio::test]
async fn student_progress_test() {
    let pool = setup_test_db().await;
    seed_teacher(&pool, "Guru", "guru@kelasku.id", "guru12345").await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signin_teacher_action())
        .step(
            Action::new("create_module", "POST", "/api/v1/modules/")
                .with_body(json!({
                    "title": "Dasar Fotografi",
                    "description": "Pengenalan kamera",
                }))
                .with_save_as("module")
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("create_lesson_a", "POST", "/api/v1/lessons/")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": ctx.get("module")["id"],
                        "title": "Komposisi",
                        "content": "Aturan sepertiga.",
                    })
                })
                .with_save_as("lesson_a")
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("create_lesson_b", "POST", "/api/v1/lessons/")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": ctx.get("module")["id"],
                        "title": "Pencahayaan",
                        "content": "Segitiga eksposur.",
                    })
                })
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("create_quiz", "POST", "/api/v1/quizzes/")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": ctx.get("module")["id"],
                        "title": "Kuis Komposisi",
                    })
                })
                .with_save_as("quiz")
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("add_question", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/quizzes/{}/questions",
                        ctx.get("quiz")["id"].as_str().unwrap()
                    )
                })
                .with_dyn_body(|ctx| {
                    json!({
                        "quiz_id": ctx.get("quiz")["id"],
                        "question_type": "multiple_choice",
                        "text": "Apa itu aturan sepertiga?",
                        "options": ["Teknik cahaya", "Teknik komposisi"],
                        "correct_index": 1,
                    })
                })
                .with_save_as("q1")
                .with_expect(StatusCode::OK),
        )
        // drafts must not count against the student
        .step(
            Action::new("create_hidden_lesson", "POST", "/api/v1/lessons/")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": ctx.get("module")["id"],
                        "title": "Draf Pelajaran",
                        "content": "Belum selesai.",
                        "visible": false,
                    })
                })
                .with_expect(StatusCode::OK),
        )
        .step(
            signup_action("Budi", "budi@kelasku.id", "rahasia123")
                .with_clear_cookies(true)
                .with_save_cookies(true),
        )
        // nothing read, nothing submitted yet
        .step(
            Action::new("progress_empty", "GET", "/api/v1/progress/")
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("\"total_lessons\":2"));
                    assert!(body.contains("\"read_lessons\":0"));
                    assert!(body.contains("\"completed_quizzes\":0"));
                    assert!(body.contains("\"average_score\":0.0"));
                    assert!(body.contains("\"progress_percent\":0.0"));
                }),
        )
        .step(
            Action::new("mark_read", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/lessons/{}/read",
                        ctx.get("lesson_a")["id"].as_str().unwrap()
                    )
                })
                .with_body(json!({ "dwell_secs": 20 }))
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("submit", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/quizzes/{}/submit",
                        ctx.get("quiz")["id"].as_str().unwrap()
                    )
                })
                .with_dyn_body(|ctx| {
                    json!({
                        "answers": [
                            { "question_id": ctx.get("q1")["id"], "selected_index": 1 },
                        ]
                    })
                })
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("progress", "GET", "/api/v1/progress/")
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("\"total_lessons\":2"));
                    assert!(body.contains("\"read_lessons\":1"));
                    assert!(body.contains("\"total_quizzes\":1"));
                    assert!(body.contains("\"completed_quizzes\":1"));
                    assert!(body.contains("\"correct\":1"));
                    // one quiz, all answers right
                    assert!(body.contains("\"average_score\":100.0"));
                    // 1 of 2 visible lessons in the module
                    assert!(body.contains("\"percent\":50.0"));
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn analytics_access_test() {
    let pool = setup_test_db().await;
    seed_teacher(&pool, "Guru", "guru@kelasku.id", "guru12345").await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("Budi", "budi@kelasku.id", "rahasia123").with_save_cookies(true))
        // the dashboard is for teachers
        .step(
            Action::new("analytics_forbidden", "GET", "/api/v1/progress/analytics")
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_teacher_action().with_clear_cookies(true))
        .step(
            Action::new("analytics", "GET", "/api/v1/progress/analytics")
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("\"total_students\":1"));
                    assert!(body.contains("\"total_modules\":0"));
                    assert!(body.contains("\"total_submissions\":0"));
                    assert!(body.contains("\"total_completions\":0"));
                    assert!(body.contains("\"completion_rate\":0.0"));
                }),
        )
        .run(&mut server, pool)
        .await;
}
