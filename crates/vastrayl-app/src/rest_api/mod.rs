pub mod item;
mod paging;
pub mod rating;

pub use paging::{Page, Paging};

use crate::state::AppState;

/// All authenticated REST routes, to be nested under `/api`.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .nest("/item", item::router().merge(rating::router()))
        .nest("/contest", item::contest_router())
}
