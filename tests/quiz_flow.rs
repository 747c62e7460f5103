mod common;
use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    Action, Flow, seed_teacher, setup_server, setup_test_db, signin_action, signin_teacher_action,
    signup_action,
};

#[tokio::test]
async fn quiz_submit_flow_test() {
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
            Action::new("create_lesson", "POST", "/api/v1/lessons/")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": ctx.get("module")["id"],
                        "title": "Komposisi",
                        "content": "Aturan sepertiga dan garis utama.",
                    })
                })
                .with_save_as("lesson")
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("create_quiz", "POST", "/api/v1/quizzes/")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": ctx.get("module")["id"],
                        "lesson_id": ctx.get("lesson")["id"],
                        "title": "Kuis Komposisi",
                    })
                })
                .with_save_as("quiz")
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("add_choice_question", "POST", "dynamic")
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
                        "options": ["Teknik cahaya", "Teknik komposisi", "Jenis lensa"],
                        "correct_index": 1,
                        "order_index": 0,
                    })
                })
                .with_save_as("q1")
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("add_text_question", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/quizzes/{}/questions",
                        ctx.get("quiz")["id"].as_str().unwrap()
                    )
                })
                .with_dyn_body(|ctx| {
                    json!({
                        "quiz_id": ctx.get("quiz")["id"],
                        "question_type": "paragraph",
                        "text": "Jelaskan komposisi favoritmu.",
                        "order_index": 1,
                    })
                })
                .with_save_as("q2")
                .with_expect(StatusCode::OK),
        )
        .step(
            signup_action("Budi", "budi@kelasku.id", "rahasia123")
                .with_clear_cookies(true)
                .with_save_cookies(true)
                .with_save_as("budi"),
        )
        // the gating lesson was never read
        .step(
            Action::new("submit_unread", "POST", "dynamic")
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
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("mark_read", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/lessons/{}/read",
                        ctx.get("lesson")["id"].as_str().unwrap()
                    )
                })
                .with_body(json!({ "dwell_secs": 30 }))
                .with_expect(StatusCode::OK),
        )
        // answers must point at known questions
        .step(
            Action::new("submit_unknown_question", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/quizzes/{}/submit",
                        ctx.get("quiz")["id"].as_str().unwrap()
                    )
                })
                .with_body(json!({
                    "answers": [
                        { "question_id": "00000000-0000-0000-0000-000000000000", "selected_index": 1 },
                    ]
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        // students never see the answer key
        .step(
            Action::new("student_get_quiz", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/quizzes/{}", ctx.get("quiz")["id"].as_str().unwrap())
                })
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("Apa itu aturan sepertiga?"));
                    assert!(!body.contains("correct_index"));
                }),
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
                            { "question_id": ctx.get("q2")["id"], "text_answer": "Sepertiga bawah." },
                        ]
                    })
                })
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("\"total_questions\":2"));
                    // the text answer is left for manual grading
                    assert!(body.contains("\"correct_answers\":1"));
                }),
        )
        // no second attempt without a grant
        .step(
            Action::new("submit_again", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/quizzes/{}/submit",
                        ctx.get("quiz")["id"].as_str().unwrap()
                    )
                })
                .with_dyn_body(|ctx| {
                    json!({
                        "answers": [
                            { "question_id": ctx.get("q1")["id"], "selected_index": 0 },
                        ]
                    })
                })
                .with_expect(StatusCode::CONFLICT),
        )
        .step(signin_teacher_action().with_clear_cookies(true))
        .step(
            Action::new("grant_retake", "POST", "/api/v1/retakes/")
                .with_dyn_body(|ctx| {
                    json!({
                        "user_id": ctx.get("budi")["id"],
                        "quiz_id": ctx.get("quiz")["id"],
                        "allowed": 1,
                    })
                })
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("list_grants", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/retakes/quiz/{}",
                        ctx.get("quiz")["id"].as_str().unwrap()
                    )
                })
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("\"allowed\":1"));
                }),
        )
        .step(signin_action("budi@kelasku.id", "rahasia123").with_clear_cookies(true))
        // the retake burns the grant and replaces the answer set
        .step(
            Action::new("retake", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/quizzes/{}/submit",
                        ctx.get("quiz")["id"].as_str().unwrap()
                    )
                })
                .with_dyn_body(|ctx| {
                    json!({
                        "answers": [
                            { "question_id": ctx.get("q1")["id"], "selected_index": 0 },
                            { "question_id": ctx.get("q2")["id"], "text_answer": "Garis utama." },
                        ]
                    })
                })
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("\"correct_answers\":0"));
                }),
        )
        .step(
            Action::new("retake_exhausted", "POST", "dynamic")
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
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("own_answers", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/quizzes/{}/answers",
                        ctx.get("quiz")["id"].as_str().unwrap()
                    )
                })
                .with_expect(StatusCode::OK)
                .with_save_as("answers")
                .assert_body(|body| {
                    assert!(body.contains("Garis utama."));
                }),
        )
        .step(signin_teacher_action().with_clear_cookies(true))
        .step(
            Action::new("completions", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/quizzes/{}/completions",
                        ctx.get("quiz")["id"].as_str().unwrap()
                    )
                })
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("Budi"));
                    assert!(body.contains("\"total\":2"));
                }),
        )
        // manual grade for the text answer
        .step(
            Action::new("grade_answer", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/answers/{}/grade",
                        ctx.get("answers")[0]["id"].as_str().unwrap()
                    )
                })
                .with_body(json!({ "is_correct": true }))
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("\"is_correct\":true"));
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn rejected_resubmission_keeps_grant_test() {
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
            Action::new("create_quiz", "POST", "/api/v1/quizzes/")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": ctx.get("module")["id"],
                        "title": "Kuis Ulang",
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
                        "text": "Pilih jawaban benar.",
                        "options": ["salah", "benar"],
                        "correct_index": 1,
                    })
                })
                .with_save_as("q1")
                .with_expect(StatusCode::OK),
        )
        .step(
            signup_action("Budi", "budi@kelasku.id", "rahasia123")
                .with_clear_cookies(true)
                .with_save_cookies(true)
                .with_save_as("budi"),
        )
        .step(
            Action::new("first_submit", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/quizzes/{}/submit",
                        ctx.get("quiz")["id"].as_str().unwrap()
                    )
                })
                .with_dyn_body(|ctx| {
                    json!({
                        "answers": [
                            { "question_id": ctx.get("q1")["id"], "selected_index": 0 },
                        ]
                    })
                })
                .with_expect(StatusCode::OK),
        )
        .step(signin_teacher_action().with_clear_cookies(true))
        .step(
            Action::new("grant_retake", "POST", "/api/v1/retakes/")
                .with_dyn_body(|ctx| {
                    json!({
                        "user_id": ctx.get("budi")["id"],
                        "quiz_id": ctx.get("quiz")["id"],
                        "allowed": 1,
                    })
                })
                .with_expect(StatusCode::OK),
        )
        .step(signin_action("budi@kelasku.id", "rahasia123").with_clear_cookies(true))
        // a rejected payload must not touch the grant
        .step(
            Action::new("resubmit_unknown_question", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/quizzes/{}/submit",
                        ctx.get("quiz")["id"].as_str().unwrap()
                    )
                })
                .with_body(json!({
                    "answers": [
                        { "question_id": "00000000-0000-0000-0000-000000000000", "selected_index": 1 },
                    ]
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("retake", "POST", "dynamic")
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
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("\"correct_answers\":1"));
                }),
        )
        .step(
            Action::new("retake_exhausted", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/quizzes/{}/submit",
                        ctx.get("quiz")["id"].as_str().unwrap()
                    )
                })
                .with_dyn_body(|ctx| {
                    json!({
                        "answers": [
                            { "question_id": ctx.get("q1")["id"], "selected_index": 0 },
                        ]
                    })
                })
                .with_expect(StatusCode::CONFLICT),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn teacher_grading_view_test() {
    let pool = setup_test_db().await;
    seed_teacher(&pool, "Guru", "guru@kelasku.id", "guru12345").await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signin_teacher_action())
        .step(
            Action::new("create_quiz", "POST", "/api/v1/quizzes/")
                .with_body(json!({ "title": "Kuis Centang" }))
                .with_save_as("quiz")
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("add_checkbox_question", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/quizzes/{}/questions",
                        ctx.get("quiz")["id"].as_str().unwrap()
                    )
                })
                .with_dyn_body(|ctx| {
                    json!({
                        "quiz_id": ctx.get("quiz")["id"],
                        "question_type": "checkboxes",
                        "text": "Pilih semua teknik komposisi.",
                        "options": ["Aturan sepertiga", "Bukaan besar", "Garis utama"],
                        "correct_indexes": [0, 2],
                    })
                })
                .with_save_as("q1")
                .with_expect(StatusCode::OK),
        )
        .step(
            signup_action("Budi", "budi@kelasku.id", "rahasia123")
                .with_clear_cookies(true)
                .with_save_cookies(true)
                .with_save_as("budi"),
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
                            { "question_id": ctx.get("q1")["id"], "selected_indexes": [0, 2] },
                        ]
                    })
                })
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    // multi-select stays ungraded until a teacher marks it
                    assert!(body.contains("\"correct_answers\":0"));
                }),
        )
        .step(signin_teacher_action().with_clear_cookies(true))
        // the teacher pulls the student's rows, not their own
        .step(
            Action::new("student_answers", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/quizzes/{}/answers?user_id={}",
                        ctx.get("quiz")["id"].as_str().unwrap(),
                        ctx.get("budi")["id"].as_str().unwrap()
                    )
                })
                .with_expect(StatusCode::OK)
                .with_save_as("answers")
                .assert_body(|body| {
                    assert!(body.contains("\"selected_index\":-2"));
                    assert!(body.contains("\"is_correct\":false"));
                }),
        )
        .step(
            Action::new("grade_answer", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/answers/{}/grade",
                        ctx.get("answers")[0]["id"].as_str().unwrap()
                    )
                })
                .with_body(json!({ "is_correct": true }))
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("\"is_correct\":true"));
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn quiz_list_state_test() {
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
            Action::new("create_quiz", "POST", "/api/v1/quizzes/")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": ctx.get("module")["id"],
                        "title": "Kuis Terbuka",
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
                        "question_type": "dropdown",
                        "text": "Pilih satu.",
                        "options": ["a", "b"],
                        "correct_index": 0,
                    })
                })
                .with_save_as("q1")
                .with_expect(StatusCode::OK),
        )
        .step(
            signup_action("Budi", "budi@kelasku.id", "rahasia123")
                .with_clear_cookies(true)
                .with_save_cookies(true),
        )
        // no gating lesson, fresh quiz
        .step(
            Action::new("list_before", "GET", "/api/v1/quizzes/")
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("\"completed\":false"));
                    assert!(body.contains("\"lesson_read\":true"));
                }),
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
                            { "question_id": ctx.get("q1")["id"], "selected_index": 0 },
                        ]
                    })
                })
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("list_after", "GET", "/api/v1/quizzes/")
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("\"completed\":true"));
                }),
        )
        .run(&mut server, pool)
        .await;
}
