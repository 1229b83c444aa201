use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt::Display, time::Duration};
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, StreamExt as _};
use tracing::{debug, warn};
use vastrayl_dal::rating::RatingOutcome;
use vastrayl_types::UserId;

use crate::state::AppState;

#[derive(Clone, Debug, PartialEq)]
pub enum EventType {
    Rating,
}

impl Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Rating => write!(f, "rating"),
        }
    }
}

/// Aggregate of an item right after a rating was committed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RatingEvent {
    pub item_id: i64,
    pub user_id: String,
    pub average_rating: f64,
    pub ratings_count: i64,
    pub flags_count: i64,
}

impl RatingEvent {
    pub fn new(user: &UserId, outcome: &RatingOutcome) -> Self {
        Self {
            item_id: outcome.item_id,
            user_id: user.to_string(),
            average_rating: outcome.new_average,
            ratings_count: outcome.new_count,
            flags_count: outcome.new_flag_count,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EventMessage {
    id: String,
    kind: EventType,
    data: String,
}

impl EventMessage {
    pub fn new<T>(id: impl ToString, kind: EventType, data: &T) -> serde_json::Result<Self>
    where
        T: Serialize,
    {
        let data = serde_json::to_string(data)?;
        Ok(Self {
            id: id.to_string(),
            kind,
            data,
        })
    }

    pub fn rating(event: &RatingEvent) -> serde_json::Result<Self> {
        let id = format!("{}-{}", event.item_id, event.ratings_count);
        Self::new(id, EventType::Rating, event)
    }

    pub fn kind(&self) -> &EventType {
        &self.kind
    }

    pub fn data(&self) -> &str {
        &self.data
    }
}

/// Fan out of committed ratings to connected listeners.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishing never fails the caller, events are lost when nobody listens.
    pub fn publish_rating(&self, event: RatingEvent) {
        match EventMessage::rating(&event) {
            Ok(msg) => {
                if self.sender.send(msg).is_err() {
                    debug!("No listeners for rating event of item {}", event.item_id);
                }
            }
            Err(e) => warn!("Cannot serialize rating event: {e}"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventMessage> {
        self.sender.subscribe()
    }

    pub fn receiver_stream(&self) -> impl Stream<Item = EventMessage> + Send + 'static {
        BroadcastStream::new(self.subscribe()).filter_map(|res| match res {
            Ok(msg) => Some(msg),
            Err(e) => {
                warn!("Event listener lagging: {e}");
                None
            }
        })
    }
}

async fn sse_handler(
    _user: UserId,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state.events().receiver_stream().map(|e| {
        Ok(Event::default()
            .id(e.id)
            .data(format!(r#"{{"type":"{}","data":{} }}"#, e.kind, e.data)))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(10))
            .text("ping"),
    )
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(sse_handler))
}
