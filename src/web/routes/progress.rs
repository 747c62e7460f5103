use axum::{
    Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse,
    routing::get,
};

use crate::{
    model::{
        CrudRepository, ResourceTyped,
        entity::{
            Answer, Lesson, LessonRead, Module, ModuleProgressRow, Quiz, QuizScoreRow, UserEntity,
        },
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::progress::{AnalyticsResponse, ModuleProgress, QuizScore, StudentProgressResponse},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(progress_get_handler))
        .route("/analytics", get(progress_analytics_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/progress/",
    description = "Get current user's progress",
    responses(
        (status = 200, description = "Progress found", body = StudentProgressResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "progress",
    security(
        ("cookie" = [])
    )
)]
pub async fn progress_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let (total_lessons, read_lessons, total_quizzes, completed_quizzes, scores, per_module) =
        tokio::try_join!(
            Lesson::count_visible(state.pool(), user),
            LessonRead::count(state.pool(), user),
            Quiz::count_visible(state.pool(), user),
            Answer::count_completed_quizzes(state.pool(), user),
            QuizScoreRow::fetch_for_user(state.pool(), user),
            ModuleProgressRow::fetch_for_user(state.pool(), user),
        )
        .map_err(|e| WebError::resource_fetch_error(LessonRead::get_resource_type(), e))?;

    let average_score = if scores.is_empty() {
        0.0
    } else {
        let sum: f64 = scores
            .iter()
            .map(|s| {
                if s.total > 0 {
                    s.correct as f64 / s.total as f64 * 100.0
                } else {
                    0.0
                }
            })
            .sum();
        sum / scores.len() as f64
    };

    let assigned = total_lessons + total_quizzes;
    let progress_percent = if assigned > 0 {
        (read_lessons + completed_quizzes) as f64 / assigned as f64 * 100.0
    } else {
        0.0
    };

    let quiz_scores = scores
        .into_iter()
        .map(|s| QuizScore {
            quiz_id: s.quiz_id,
            correct: s.correct,
            total: s.total,
        })
        .collect();

    let module_progress = per_module
        .into_iter()
        .map(|m| ModuleProgress {
            percent: if m.total_lessons > 0 {
                m.read_lessons as f64 / m.total_lessons as f64 * 100.0
            } else {
                0.0
            },
            module_id: m.module_id,
            title: m.title,
            total_lessons: m.total_lessons,
            read_lessons: m.read_lessons,
        })
        .collect();

    let res = StudentProgressResponse {
        total_lessons,
        read_lessons,
        total_quizzes,
        completed_quizzes,
        average_score,
        progress_percent,
        quiz_scores,
        module_progress,
    };

    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    get,
    path = "/api/v1/progress/analytics",
    description = "Platform-wide numbers for the teacher dashboard",
    responses(
        (status = 200, description = "Analytics collected", body = AnalyticsResponse),
        (status = 403, description = "Only teachers can view analytics", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "progress",
    security(
        ("cookie" = [])
    )
)]
pub async fn progress_analytics_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.is_teacher() {
        return Err(WebError::resource_forbidden(Answer::get_resource_type()));
    }

    let (
        total_students,
        total_modules,
        total_quizzes,
        total_submissions,
        total_completions,
        average_score,
    ) = tokio::try_join!(
        UserEntity::count_students(state.pool(), user),
        Module::count(state.pool(), user),
        Quiz::count(state.pool(), user),
        Answer::count(state.pool(), user),
        Answer::count_distinct_completions(state.pool(), user),
        Answer::average_score(state.pool(), user),
    )
    .map_err(|e| WebError::resource_fetch_error(Answer::get_resource_type(), e))?;

    let possible = total_students * total_quizzes;
    let completion_rate = if possible > 0 {
        total_completions as f64 / possible as f64 * 100.0
    } else {
        0.0
    };

    Ok((
        StatusCode::OK,
        Json(AnalyticsResponse {
            total_students,
            total_modules,
            total_quizzes,
            total_submissions,
            total_completions,
            completion_rate,
            average_score,
        }),
    ))
}
