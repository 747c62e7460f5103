use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    Config,
    model::{
        CrudRepository, DatabaseError, ResourceTyped, check_access,
        entity::{
            Answer, AnswerCreate, CompletionRow, LessonRead, Question, QuestionCreate, Quiz,
            QuizCreate, QuizWithStateRow, RetakeGrant,
        },
    },
    utils::media::with_delivery_transforms,
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::quizzes::{
            QuestionResponse, QuizListItem, QuizWithQuestions, SubmitRequest, SubmitResponse,
        },
        error::ErrorResponse,
        middlewares,
    },
};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct QuizListQuery {
    module_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AnswersQuery {
    user_id: Option<Uuid>,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(quizzes_list_handler).post(quizzes_create_handler))
        .route(
            "/{id}",
            get(quizzes_get_handler)
                .put(quizzes_update_handler)
                .delete(quizzes_delete_handler),
        )
        .route("/{id}/submit", post(quizzes_submit_handler))
        .route("/{id}/completions", get(quizzes_completions_handler))
        .route("/{id}/answers", get(quizzes_answers_handler))
        .route("/{id}/questions", post(quizzes_add_question_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/",
    description = "List quizzes with the caller's completion state and retake balance",
    params(QuizListQuery),
    responses(
        (status = 200, description = "Quizzes collected", body = Vec<QuizListItem>),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub async fn quizzes_list_handler(
    ctx: RequestContext,
    Query(query): Query<QuizListQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quizzes = QuizWithStateRow::fetch_all(state.pool(), user, query.module_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    let quizzes: Vec<QuizListItem> = quizzes.into_iter().map(QuizListItem::from).collect();

    Ok((StatusCode::OK, Json(quizzes)))
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/{quiz_id}",
    description = "Fetch one quiz with its questions. Students never receive the answer key",
    params(
        ("quiz_id" = Uuid, Path, description = "ID of the quiz to get")
    ),
    responses(
        (status = 200, description = "Quiz found", body = QuizWithQuestions),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub async fn quizzes_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let quiz = Quiz::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    if quiz.is_none() {
        return Err(WebError::resource_not_found(Quiz::get_resource_type()));
    }
    let quiz = quiz.unwrap();

    if !user.is_teacher() {
        let visible = quiz
            .in_visible_module(state.pool())
            .await
            .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;
        if !visible {
            return Err(WebError::resource_not_found(Quiz::get_resource_type()));
        }
    }

    let questions = Question::find_all_by_quiz(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    let response = QuizWithQuestions {
        id: quiz.id(),
        module_id: quiz.module_id(),
        lesson_id: quiz.lesson_id(),
        title: quiz.title().to_string(),
        time_limit_sec: quiz.time_limit_sec(),
        questions: questions
            .into_iter()
            .map(|q| QuestionResponse::from_entity(q, user))
            .collect(),
    };

    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/v1/quizzes/",
    request_body = QuizCreate,
    responses(
        (status = 200, description = "Quiz created", body = Quiz),
        (status = 403, description = "Only teachers can create quizzes", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub async fn quizzes_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<QuizCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.is_teacher() {
        return Err(WebError::resource_forbidden(Quiz::get_resource_type()));
    }

    let created = Quiz::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/quizzes/{quiz_id}",
    request_body = QuizCreate,
    params(
        ("quiz_id" = Uuid, Path, description = "ID of the quiz to update")
    ),
    responses(
        (status = 200, description = "Quiz updated", body = Quiz),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub async fn quizzes_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuizCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Quiz::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    if found.is_none() {
        return Err(WebError::resource_not_found(Quiz::get_resource_type()));
    }
    let found = found.unwrap();

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| {
            if let DatabaseError::Forbidden = e {
                WebError::resource_forbidden(Quiz::get_resource_type())
            } else {
                WebError::resource_fetch_error(Quiz::get_resource_type(), e)
            }
        })?;

    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/quizzes/{quiz_id}",
    description = "Deletes a quiz with its questions, answers and retake grants",
    params(
        ("quiz_id" = Uuid, Path, description = "ID of the quiz to delete")
    ),
    responses(
        (status = 200, description = "Quiz deleted"),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub async fn quizzes_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Quiz::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    if found.is_none() {
        return Err(WebError::resource_not_found(Quiz::get_resource_type()));
    }
    let found = found.unwrap();

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| {
            if let DatabaseError::Forbidden = e {
                WebError::resource_forbidden(Quiz::get_resource_type())
            } else {
                WebError::resource_fetch_error(Quiz::get_resource_type(), e)
            }
        })?;

    found
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/quizzes/{quiz_id}/submit",
    description = "Submit answers for a quiz. Repeat submissions burn a retake grant \
                   and replace the stored answer set",
    request_body = SubmitRequest,
    params(
        ("quiz_id" = Uuid, Path, description = "ID of the quiz to submit")
    ),
    responses(
        (status = 200, description = "Submission graded", body = SubmitResponse),
        (status = 400, description = "Answer refers to an unknown question", body = ErrorResponse),
        (status = 403, description = "Gating lesson was not read", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 409, description = "Already completed and no retake granted", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub async fn quizzes_submit_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let quiz = Quiz::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    if quiz.is_none() {
        return Err(WebError::resource_not_found(Quiz::get_resource_type()));
    }
    let quiz = quiz.unwrap();

    if !user.is_teacher() {
        let visible = quiz
            .in_visible_module(state.pool())
            .await
            .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;
        if !visible {
            return Err(WebError::resource_not_found(Quiz::get_resource_type()));
        }
    }

    if let Some(lesson_id) = quiz.lesson_id() {
        let read = LessonRead::exists(state.pool(), user, user.user_id(), lesson_id)
            .await
            .map_err(|e| WebError::resource_fetch_error(LessonRead::get_resource_type(), e))?;

        if !read && !user.is_teacher() {
            return Err(WebError::submission_lesson_unread(id));
        }
    }

    let questions = Question::find_all_by_quiz(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    let total_questions = questions.len() as i64;
    let by_id: HashMap<Uuid, &Question> = questions.iter().map(|q| (q.id(), q)).collect();

    let mut rows = Vec::with_capacity(payload.answers.len());
    let mut correct_answers = 0i64;
    for submitted in &payload.answers {
        let question = by_id
            .get(&submitted.question_id)
            .ok_or(WebError::submission_unknown_question(submitted.question_id))?;

        let graded = question.grade(submitted);
        if graded.is_correct {
            correct_answers += 1;
        }

        rows.push(AnswerCreate {
            user_id: user.user_id(),
            quiz_id: id,
            question_id: submitted.question_id,
            selected_index: graded.selected_index,
            text_answer: graded.text_answer,
            is_correct: graded.is_correct,
        });
    }

    // the payload is valid at this point, only now may a retake grant be burned
    let previous = Answer::all_by_user_quiz(state.pool(), user, user.user_id(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Answer::get_resource_type(), e))?;

    if !previous.is_empty() {
        let remaining = RetakeGrant::consume(state.pool(), user, user.user_id(), id)
            .await
            .map_err(|e| WebError::resource_fetch_error(RetakeGrant::get_resource_type(), e))?;

        if remaining.is_none() {
            return Err(WebError::submission_already_completed(id));
        }
    }

    Answer::replace_for_quiz(state.pool(), user, user.user_id(), id, rows)
        .await
        .map_err(|e| WebError::resource_fetch_error(Answer::get_resource_type(), e))?;

    let score_percent = if total_questions > 0 {
        correct_answers as f64 / total_questions as f64 * 100.0
    } else {
        0.0
    };

    Ok((
        StatusCode::OK,
        Json(SubmitResponse {
            total_questions,
            correct_answers,
            score_percent,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/{quiz_id}/completions",
    description = "Per-student results on a quiz, for the retake manager",
    params(
        ("quiz_id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Completions collected", body = Vec<CompletionRow>),
        (status = 403, description = "Only teachers can view completions", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub async fn quizzes_completions_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.is_teacher() {
        return Err(WebError::resource_forbidden(Quiz::get_resource_type()));
    }

    let completions = CompletionRow::fetch_by_quiz(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Answer::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(completions)))
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/{quiz_id}/answers",
    description = "Stored answers for a quiz. Teachers may pass user_id to read \
                   a student's answers for manual grading",
    params(
        AnswersQuery,
        ("quiz_id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Answers collected", body = Vec<Answer>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub async fn quizzes_answers_handler(
    ctx: RequestContext,
    Query(query): Query<AnswersQuery>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    // students only ever see their own rows
    let target = match query.user_id {
        Some(user_id) if user.is_teacher() => user_id,
        _ => user.user_id(),
    };

    let answers = Answer::all_by_user_quiz(state.pool(), user, target, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Answer::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(answers)))
}

#[utoipa::path(
    post,
    path = "/api/v1/quizzes/{quiz_id}/questions",
    request_body = QuestionCreate,
    params(
        ("quiz_id" = Uuid, Path, description = "ID of the quiz to extend")
    ),
    responses(
        (status = 200, description = "Question added", body = Question),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub async fn quizzes_add_question_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<QuestionCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let quiz = Quiz::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    if quiz.is_none() {
        return Err(WebError::resource_not_found(Quiz::get_resource_type()));
    }
    let quiz = quiz.unwrap();

    check_access(state.pool(), user, &quiz, user.user_id())
        .await
        .map_err(|e| {
            if let DatabaseError::Forbidden = e {
                WebError::resource_forbidden(Question::get_resource_type())
            } else {
                WebError::resource_fetch_error(Question::get_resource_type(), e)
            }
        })?;

    let max_width = Config::get_or_init(false).await.media().max_width();
    payload.quiz_id = id;
    payload.image_url = payload
        .image_url
        .map(|url| with_delivery_transforms(&url, max_width));

    let created = Question::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}
