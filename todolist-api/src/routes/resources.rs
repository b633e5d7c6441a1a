/// Generic CRUD handlers for nested resources
///
/// One set of handlers serves lists, tasks and subtasks; the router picks the
/// resource type (`index::<Task>`) and the matched path supplies the ancestor
/// identifiers. All ownership checks happen in [`ResourceService`].
///
/// | Handler   | Method | Status |
/// |-----------|--------|--------|
/// | `index`   | GET    | 200    |
/// | `show`    | GET    | 200    |
/// | `create`  | POST   | 201    |
/// | `update`  | PUT    | 201    |
/// | `destroy` | DELETE | 200    |
///
/// [`ResourceService`]: todolist_shared::ownership::ResourceService

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{Pagination, Scope, ValidatedJson},
    routes::{ApiResponse, PagedResponse},
};
use axum::{extract::State, http::StatusCode, Json};
use todolist_shared::{auth::middleware::Identity, models::Resource};

/// `GET` a page of the collection
pub async fn index<R: Resource>(
    State(state): State<AppState>,
    identity: Identity,
    Scope(path): Scope,
    Pagination(query): Pagination,
) -> ApiResult<Json<PagedResponse<R>>> {
    let page = state.service.list::<R>(&identity, &path, query).await?;

    Ok(Json(PagedResponse {
        success: true,
        data: page.items,
        page_number: page.page_number,
        items_per_page: page.items_per_page,
    }))
}

/// `GET` one resource
pub async fn show<R: Resource>(
    State(state): State<AppState>,
    identity: Identity,
    Scope(path): Scope,
) -> ApiResult<Json<ApiResponse<R>>> {
    let resource = state.service.get::<R>(&identity, &path).await?;
    Ok(Json(ApiResponse::ok(resource)))
}

/// `POST` a new resource into the collection
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    identity: Identity,
    Scope(path): Scope,
    ValidatedJson(input): ValidatedJson<R::Input>,
) -> ApiResult<(StatusCode, Json<ApiResponse<R>>)> {
    let resource = state.service.create::<R>(&identity, &path, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(resource))))
}

/// `PUT` new attributes onto a resource
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    identity: Identity,
    Scope(path): Scope,
    ValidatedJson(input): ValidatedJson<R::Input>,
) -> ApiResult<(StatusCode, Json<ApiResponse<R>>)> {
    let resource = state.service.update::<R>(&identity, &path, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(resource))))
}

/// `DELETE` a resource, returning its last state
pub async fn destroy<R: Resource>(
    State(state): State<AppState>,
    identity: Identity,
    Scope(path): Scope,
) -> ApiResult<Json<ApiResponse<R>>> {
    let resource = state.service.delete::<R>(&identity, &path).await?;
    Ok(Json(ApiResponse::ok(resource)))
}
