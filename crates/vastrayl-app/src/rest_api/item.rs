use crate::{
    error::{ApiError, ApiResult},
    repository_from_request,
    rest_api::{Page, Paging},
    state::AppState,
    validate::{Garde, ValidQuery},
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json,
};
use garde::Validate;
use http::StatusCode;
use serde::Deserialize;
use tracing::debug;
use vastrayl_dal::item::{CreateItem, ItemRepository};
use vastrayl_types::UserId;

repository_from_request!(ItemRepository);

pub const DEFAULT_LEADERBOARD_SIZE: u32 = 10;

#[derive(Debug, Deserialize, Default)]
pub struct ItemFilter {
    pub contest_id: Option<i64>,
}

#[derive(Debug, Deserialize, Default, Validate)]
pub struct LeaderboardQuery {
    #[garde(range(min = 1, max = 1000))]
    pub limit: Option<u32>,
    #[garde(skip)]
    pub min_ratings: Option<u32>,
}

pub async fn create(
    repository: ItemRepository,
    owner: UserId,
    Garde(Json(payload)): Garde<Json<CreateItem>>,
) -> ApiResult<impl IntoResponse> {
    let record = repository.create(&owner, payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_item(
    Path(id): Path<i64>,
    _user: UserId,
    repository: ItemRepository,
) -> ApiResult<impl IntoResponse> {
    let record = repository.get(id).await?;
    Ok((StatusCode::OK, Json(record)))
}

pub async fn list(
    repository: ItemRepository,
    _user: UserId,
    State(state): State<AppState>,
    ValidQuery(paging): ValidQuery<Paging>,
    Query(filter): Query<ItemFilter>,
) -> ApiResult<impl IntoResponse> {
    let default_page_size = state.config().default_page_size;
    let page_size = paging.page_size(default_page_size);
    let listing_params = paging.into_listing_params(default_page_size)?;
    let batch = repository.list(listing_params, filter.contest_id).await?;
    Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
}

pub async fn delete(
    Path(id): Path<i64>,
    user: UserId,
    repository: ItemRepository,
) -> ApiResult<impl IntoResponse> {
    let record = repository.get(id).await?;
    if !record.is_owned_by(&user) {
        return Err(ApiError::NotOwner);
    }
    repository.delete(id).await?;
    debug!("Item {id} deleted by {user}");
    Ok((StatusCode::NO_CONTENT, ()))
}

pub async fn leaderboard(
    Path(contest_id): Path<i64>,
    _user: UserId,
    repository: ItemRepository,
    ValidQuery(query): ValidQuery<LeaderboardQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_SIZE);
    let min_ratings = query.min_ratings.unwrap_or(0);
    let entries = repository
        .leaderboard(contest_id, min_ratings.into(), limit.into())
        .await?;
    Ok((StatusCode::OK, Json(entries)))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_item).delete(delete))
}

pub fn contest_router() -> axum::Router<AppState> {
    axum::Router::new().route("/{contest_id}/leaderboard", get(leaderboard))
}
