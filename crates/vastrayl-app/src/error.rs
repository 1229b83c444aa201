use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::json;
use tracing::{debug, error};

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Data access error: {0}")]
    Dal(#[from] vastrayl_dal::Error),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("You cannot rate your own item")]
    SelfRating,

    #[error("Only the owner can do this")]
    NotOwner,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        use vastrayl_dal::Error as DalError;
        match self {
            ApiError::Dal(e) => match e {
                DalError::RecordNotFound(_) => StatusCode::NOT_FOUND,
                DalError::StorageUnavailable(sqlx_error) => match sqlx_error {
                    vastrayl_dal::SqlxError::RowNotFound => StatusCode::NOT_FOUND,
                    _ => StatusCode::SERVICE_UNAVAILABLE,
                },
                DalError::FailedUpdate { .. } | DalError::Conflict { .. } => StatusCode::CONFLICT,
                DalError::InvalidRating { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                DalError::InvalidOrderByField(_) => StatusCode::BAD_REQUEST,
                DalError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                DalError::MigrationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::SelfRating | ApiError::NotOwner => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {self}");
        } else {
            debug!("Request rejected ({status}): {self}");
        }
        let body = Json(json!({"success": false, "error": self.to_string()}));
        (status, body).into_response()
    }
}
