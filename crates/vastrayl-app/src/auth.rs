use crate::state::AppState;
use axum::{extract::FromRequestParts, RequestPartsExt};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use http::{request::Parts, StatusCode};
use tracing::{debug, warn};
use vastrayl_types::{claim::ApiClaim, UserId};

impl FromRequestParts<AppState> for ApiClaim {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| {
                debug!("No bearer token in request");
                StatusCode::UNAUTHORIZED
            })?;

        state
            .tokens()
            .validate::<ApiClaim>(token.token())
            .map_err(|e| {
                debug!("Failed to validate token: {}", e);
                StatusCode::UNAUTHORIZED
            })
    }
}

/// Authenticated caller, taken from the `sub` of a valid bearer token.
impl FromRequestParts<AppState> for UserId {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claim = ApiClaim::from_request_parts(parts, state).await?;
        claim.user_id().parse().map_err(|e| {
            warn!("Token carries invalid user id: {e}");
            StatusCode::UNAUTHORIZED
        })
    }
}
