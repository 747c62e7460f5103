use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, ResourceTyped, check_access,
        entity::{Module, ModuleCreate, ModuleWithLessonsRow},
    },
    web::{
        AppState, RequestContext, WebError, WebResult, dto::modules::ModuleWithLessons,
        error::ErrorResponse, middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(modules_list_handler).post(modules_create_handler))
        .route(
            "/{id}",
            get(modules_get_handler)
                .put(modules_update_handler)
                .delete(modules_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/modules/",
    description = "List modules with their lesson summaries. Students only get visible ones",
    responses(
        (status = 200, description = "Successfully collected modules", body = Vec<ModuleWithLessons>),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
pub async fn modules_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let modules = ModuleWithLessonsRow::fetch_all(state.pool(), user)
        .await
        .and_then(ModuleWithLessons::from_rows)
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(modules)))
}

#[utoipa::path(
    get,
    path = "/api/v1/modules/{module_id}",
    params(
        ("module_id" = Uuid, Path, description = "ID of the module to get")
    ),
    responses(
        (status = 200, description = "Module found", body = ModuleWithLessons),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
pub async fn modules_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let row = ModuleWithLessonsRow::fetch_one(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    if row.is_none() {
        return Err(WebError::resource_not_found(Module::get_resource_type()));
    }

    let module = ModuleWithLessons::try_from(row.unwrap())
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e.into()))?;

    Ok((StatusCode::OK, Json(module)))
}

#[utoipa::path(
    post,
    path = "/api/v1/modules/",
    request_body = ModuleCreate,
    responses(
        (status = 200, description = "Module created", body = Module),
        (status = 403, description = "Only teachers can create modules", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
pub async fn modules_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<ModuleCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.is_teacher() {
        return Err(WebError::resource_forbidden(Module::get_resource_type()));
    }

    let created = Module::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/modules/{module_id}",
    request_body = ModuleCreate,
    params(
        ("module_id" = Uuid, Path, description = "ID of the module to update")
    ),
    responses(
        (status = 200, description = "Module updated", body = Module),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
pub async fn modules_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModuleCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Module::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    if found.is_none() {
        return Err(WebError::resource_not_found(Module::get_resource_type()));
    }
    let found = found.unwrap();

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| {
            if let DatabaseError::Forbidden = e {
                WebError::resource_forbidden(Module::get_resource_type())
            } else {
                WebError::resource_fetch_error(Module::get_resource_type(), e)
            }
        })?;

    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/modules/{module_id}",
    description = "Deletes a module and its lessons",
    params(
        ("module_id" = Uuid, Path, description = "ID of the module to delete")
    ),
    responses(
        (status = 200, description = "Module deleted"),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
pub async fn modules_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Module::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    if found.is_none() {
        return Err(WebError::resource_not_found(Module::get_resource_type()));
    }
    let found = found.unwrap();

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| {
            if let DatabaseError::Forbidden = e {
                WebError::resource_forbidden(Module::get_resource_type())
            } else {
                WebError::resource_fetch_error(Module::get_resource_type(), e)
            }
        })?;

    found
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
