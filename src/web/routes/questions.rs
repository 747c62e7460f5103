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
    Config,
    model::{
        CrudRepository, DatabaseError, ResourceTyped, check_access,
        entity::{Question, QuestionCreate},
    },
    utils::media::with_delivery_transforms,
    web::{AppState, RequestContext, WebError, WebResult, error::ErrorResponse, middlewares},
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}",
            put(questions_update_handler).delete(questions_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    put,
    path = "/api/v1/questions/{question_id}",
    request_body = QuestionCreate,
    params(
        ("question_id" = Uuid, Path, description = "ID of the question to update")
    ),
    responses(
        (status = 200, description = "Question updated", body = Question),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "questions",
    security(
        ("cookie" = [])
    )
)]
pub async fn questions_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<QuestionCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Question::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    if found.is_none() {
        return Err(WebError::resource_not_found(Question::get_resource_type()));
    }
    let found = found.unwrap();

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| {
            if let DatabaseError::Forbidden = e {
                WebError::resource_forbidden(Question::get_resource_type())
            } else {
                WebError::resource_fetch_error(Question::get_resource_type(), e)
            }
        })?;

    let max_width = Config::get_or_init(false).await.media().max_width();
    payload.quiz_id = found.quiz_id();
    payload.image_url = payload
        .image_url
        .map(|url| with_delivery_transforms(&url, max_width));

    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/questions/{question_id}",
    params(
        ("question_id" = Uuid, Path, description = "ID of the question to delete")
    ),
    responses(
        (status = 200, description = "Question deleted"),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "questions",
    security(
        ("cookie" = [])
    )
)]
pub async fn questions_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Question::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    if found.is_none() {
        return Err(WebError::resource_not_found(Question::get_resource_type()));
    }
    let found = found.unwrap();

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| {
            if let DatabaseError::Forbidden = e {
                WebError::resource_forbidden(Question::get_resource_type())
            } else {
                WebError::resource_fetch_error(Question::get_resource_type(), e)
            }
        })?;

    found
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
