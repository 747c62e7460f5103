use axum::Json;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Router, extract::State, middleware, response::IntoResponse, routing::get};
use uuid::Uuid;

use crate::Config;
use crate::model::entity::{Lesson, LessonCreate, LessonRead, LessonReadCreate, LessonWithStatusRow};
use crate::model::{CrudRepository, DatabaseError, ResourceTyped, check_access};
use crate::utils::media::with_delivery_transforms;
use crate::web::dto::lessons::{LessonReadBody, LessonResponse};
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, WebError, WebResult, middlewares};

/// Minimum seconds a lesson has to stay open before a read mark is accepted.
pub const MIN_DWELL_SECS: i64 = 10;

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(lessons_create_handler))
        .route(
            "/{id}",
            get(lessons_get_handler)
                .put(lessons_update_handler)
                .delete(lessons_delete_handler),
        )
        .route("/{id}/read", post(lessons_mark_read_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/lessons/{lesson_id}",
    description = "Fetch comprehensive info about lesson including its content",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to get")
    ),
    responses(
        (status = 200, description = "Lesson found", body = LessonResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = LessonWithStatusRow::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    if lesson.is_none() {
        return Err(WebError::resource_not_found(Lesson::get_resource_type()));
    }
    let lesson = lesson.unwrap();

    if !lesson.visible && !user.is_teacher() {
        return Err(WebError::resource_not_found(Lesson::get_resource_type()));
    }

    Ok((StatusCode::OK, Json(LessonResponse::from(lesson))))
}

#[utoipa::path(
    post,
    path = "/api/v1/lessons/",
    request_body = LessonCreate,
    responses(
        (status = 200, description = "Lesson created", body = Lesson),
        (status = 403, description = "Only teachers can create lessons", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(mut payload): Json<LessonCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.is_teacher() {
        return Err(WebError::resource_forbidden(Lesson::get_resource_type()));
    }

    let max_width = Config::get_or_init(false).await.media().max_width();
    payload.attachment_url = payload
        .attachment_url
        .map(|url| with_delivery_transforms(&url, max_width));

    let created = Lesson::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/lessons/{lesson_id}",
    request_body = LessonCreate,
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to update")
    ),
    responses(
        (status = 200, description = "Lesson updated", body = Lesson),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_update_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<LessonCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    if found.is_none() {
        return Err(WebError::resource_not_found(Lesson::get_resource_type()));
    }
    let found = found.unwrap();

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| {
            if let DatabaseError::Forbidden = e {
                WebError::resource_forbidden(Lesson::get_resource_type())
            } else {
                WebError::resource_fetch_error(Lesson::get_resource_type(), e)
            }
        })?;

    let max_width = Config::get_or_init(false).await.media().max_width();
    payload.attachment_url = payload
        .attachment_url
        .map(|url| with_delivery_transforms(&url, max_width));

    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/lessons/{lesson_id}",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to delete")
    ),
    responses(
        (status = 200, description = "Lesson deleted"),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_delete_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    if found.is_none() {
        return Err(WebError::resource_not_found(Lesson::get_resource_type()));
    }
    let found = found.unwrap();

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| {
            if let DatabaseError::Forbidden = e {
                WebError::resource_forbidden(Lesson::get_resource_type())
            } else {
                WebError::resource_fetch_error(Lesson::get_resource_type(), e)
            }
        })?;

    found
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/lessons/{lesson_id}/read",
    description = "Mark lesson as read. Rejected when the reported dwell time is too short",
    request_body = LessonReadBody,
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to mark")
    ),
    responses(
        (status = 200, description = "Lesson marked", body = LessonRead),
        (status = 400, description = "Dwell time too short", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 401, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_mark_read_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<LessonReadBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    if payload.dwell_secs < MIN_DWELL_SECS {
        return Err(WebError::resource_bad_request(
            LessonRead::get_resource_type(),
        ));
    }

    let exists = Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .is_some();

    if !exists {
        return Err(WebError::resource_not_found(Lesson::get_resource_type()));
    }

    let read = LessonRead::create(
        state.pool(),
        user,
        LessonReadCreate {
            user_id: user.user_id(),
            lesson_id: id,
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(LessonRead::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(read)))
}
