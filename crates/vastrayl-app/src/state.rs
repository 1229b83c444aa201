use std::{sync::Arc, time::Duration};

use vastrayl_auth::token::TokenManager;
use vastrayl_dal::{
    rating::{RatingAggregator, RetryPolicy},
    Pool,
};

use crate::events::EventBus;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool, tokens: TokenManager) -> Self {
        let events = EventBus::new(app_config.events_capacity);
        AppState {
            state: Arc::new(AppStateInner {
                pool,
                tokens,
                app_config,
                events,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.state.tokens
    }

    pub fn events(&self) -> &EventBus {
        &self.state.events
    }

    pub fn aggregator(&self) -> RatingAggregator {
        RatingAggregator::with_policy(self.pool().clone(), self.config().retry)
    }
}

struct AppStateInner {
    pool: Pool,
    tokens: TokenManager,
    app_config: AppConfig,
    events: EventBus,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_page_size: u32,
    /// Upper bound on one rating submission including all retries
    pub rating_timeout: Option<Duration>,
    pub retry: RetryPolicy,
    pub events_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_page_size: 100,
            rating_timeout: None,
            retry: RetryPolicy::default(),
            events_capacity: 1024,
        }
    }
}
