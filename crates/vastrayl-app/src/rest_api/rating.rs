use crate::{
    error::{ApiError, ApiResult},
    events::RatingEvent,
    state::AppState,
    validate::Garde,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json,
};
use garde::Validate;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use vastrayl_dal::{
    item::ItemRepository,
    rating::RatingOutcome,
    submission::SubmissionRepository,
};
use vastrayl_types::UserId;

crate::repository_from_request!(SubmissionRepository);

fn is_finite(value: &f64, _ctx: &()) -> garde::Result {
    if value.is_finite() {
        Ok(())
    } else {
        Err(garde::Error::new("rating must be a finite number"))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RateItem {
    /// Upper bound is the item's own scale, checked when submitted
    #[garde(range(min = 0.0), custom(is_finite))]
    pub rating: f64,
    #[garde(skip)]
    #[serde(default)]
    pub flag: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RatingResponse {
    pub success: bool,
    pub new_average: f64,
    pub new_count: i64,
    pub new_flag_count: i64,
}

impl From<RatingOutcome> for RatingResponse {
    fn from(outcome: RatingOutcome) -> Self {
        Self {
            success: true,
            new_average: outcome.new_average,
            new_count: outcome.new_count,
            new_flag_count: outcome.new_flag_count,
        }
    }
}

pub async fn submit(
    Path(item_id): Path<i64>,
    user: UserId,
    items: ItemRepository,
    State(state): State<AppState>,
    Garde(Json(payload)): Garde<Json<RateItem>>,
) -> ApiResult<impl IntoResponse> {
    let item = items.get(item_id).await?;
    if item.is_owned_by(&user) {
        return Err(ApiError::SelfRating);
    }

    let aggregator = state.aggregator();
    let outcome = match state.config().rating_timeout {
        Some(timeout) => {
            aggregator
                .submit_rating_with_timeout(item_id, &user, payload.rating, payload.flag, timeout)
                .await?
        }
        None => {
            aggregator
                .submit_rating(item_id, &user, payload.rating, payload.flag)
                .await?
        }
    };

    state
        .events()
        .publish_rating(RatingEvent::new(&user, &outcome));

    Ok((StatusCode::OK, Json(RatingResponse::from(outcome))))
}

pub async fn mine(
    Path(item_id): Path<i64>,
    user: UserId,
    repository: SubmissionRepository,
) -> ApiResult<impl IntoResponse> {
    let record = repository.get(item_id, &user).await?;
    Ok((StatusCode::OK, Json(record)))
}

pub async fn list(
    Path(item_id): Path<i64>,
    _user: UserId,
    items: ItemRepository,
    repository: SubmissionRepository,
) -> ApiResult<impl IntoResponse> {
    // 404 for unknown items rather than an empty list
    items.get(item_id).await?;
    let records = repository.list_for_item(item_id).await?;
    Ok((StatusCode::OK, Json(records)))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/{id}/rating", get(mine).post(submit))
        .route("/{id}/ratings", get(list))
}
