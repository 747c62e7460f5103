use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped,
        entity::{RetakeGrant, RetakeGrantCreate},
    },
    web::{AppState, RequestContext, WebError, WebResult, error::ErrorResponse, middlewares},
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(retakes_grant_handler))
        .route("/{quiz_id}/{user_id}", delete(retakes_revoke_handler))
        .route("/quiz/{quiz_id}", get(retakes_by_quiz_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/retakes/",
    description = "Grant a student a number of retakes on a quiz. Re-granting overwrites the counter",
    request_body = RetakeGrantCreate,
    responses(
        (status = 200, description = "Retake granted", body = RetakeGrant),
        (status = 403, description = "Only teachers can grant retakes", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "retakes",
    security(
        ("cookie" = [])
    )
)]
pub async fn retakes_grant_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<RetakeGrantCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.is_teacher() {
        return Err(WebError::resource_forbidden(
            RetakeGrant::get_resource_type(),
        ));
    }

    if payload.allowed <= 0 {
        return Err(WebError::resource_bad_request(
            RetakeGrant::get_resource_type(),
        ));
    }

    let granted = RetakeGrant::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(RetakeGrant::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(granted)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/retakes/{quiz_id}/{user_id}",
    params(
        ("quiz_id" = Uuid, Path, description = "Quiz the grant is attached to"),
        ("user_id" = Uuid, Path, description = "Student the grant belongs to"),
    ),
    responses(
        (status = 200, description = "Retake grant revoked"),
        (status = 403, description = "Only teachers can revoke retakes", body = ErrorResponse),
        (status = 404, description = "Grant not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "retakes",
    security(
        ("cookie" = [])
    )
)]
pub async fn retakes_revoke_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((quiz_id, user_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.is_teacher() {
        return Err(WebError::resource_forbidden(
            RetakeGrant::get_resource_type(),
        ));
    }

    let removed = RetakeGrant::revoke(state.pool(), user, user_id, quiz_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(RetakeGrant::get_resource_type(), e))?;

    if removed == 0 {
        return Err(WebError::resource_not_found(
            RetakeGrant::get_resource_type(),
        ));
    }

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/retakes/quiz/{quiz_id}",
    description = "Every outstanding grant on a quiz",
    params(
        ("quiz_id" = Uuid, Path, description = "Quiz to inspect"),
    ),
    responses(
        (status = 200, description = "Grants collected", body = Vec<RetakeGrant>),
        (status = 403, description = "Only teachers can list grants", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "retakes",
    security(
        ("cookie" = [])
    )
)]
pub async fn retakes_by_quiz_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(quiz_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.is_teacher() {
        return Err(WebError::resource_forbidden(
            RetakeGrant::get_resource_type(),
        ));
    }

    let grants = RetakeGrant::all_by_quiz(state.pool(), user, quiz_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(RetakeGrant::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(grants)))
}
