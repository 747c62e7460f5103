use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::put,
};
use uuid::Uuid;

use crate::{
    model::{CrudRepository, ResourceTyped, entity::Answer},
    web::{
        AppState, RequestContext, WebError, WebResult, dto::quizzes::GradeBody,
        error::ErrorResponse, middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/{id}/grade", put(answers_grade_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    put,
    path = "/api/v1/answers/{answer_id}/grade",
    description = "Manually grade a stored answer, e.g. a text or checkbox one",
    request_body = GradeBody,
    params(
        ("answer_id" = Uuid, Path, description = "ID of the answer to grade")
    ),
    responses(
        (status = 200, description = "Answer graded", body = Answer),
        (status = 403, description = "Only teachers can grade answers", body = ErrorResponse),
        (status = 404, description = "Answer not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "answers",
    security(
        ("cookie" = [])
    )
)]
pub async fn answers_grade_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GradeBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.is_teacher() {
        return Err(WebError::resource_forbidden(Answer::get_resource_type()));
    }

    let found = Answer::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Answer::get_resource_type(), e))?;

    if found.is_none() {
        return Err(WebError::resource_not_found(Answer::get_resource_type()));
    }
    let found = found.unwrap();

    let graded = found
        .set_grade(state.pool(), user, payload.is_correct)
        .await
        .map_err(|e| WebError::resource_fetch_error(Answer::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(graded)))
}
