//! SSE message-turn endpoint.
//!
//! POST /api/v1/chats/messages
//!
//! Validation, ownership and the user-message write happen before the
//! response starts; their failures are ordinary JSON errors. After that the
//! turn runs in its own task and the response is an SSE stream fed by the
//! relay channel.
//!
//! SSE event types:
//! - `delta` - incremental text: `{ "text": "..." }`
//! - `error` - generation failed or timed out: `{ "message": "..." }`
//! - `done`  - always last: `{}`

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;

use parley_core::chat::relay::relay_channel;
use parley_types::relay::RelayEvent;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::state::AppState;

/// Keep-alive comment interval for idle streams.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub chat_id: String,
    #[serde(default)]
    pub prompt: String,
}

/// POST /api/v1/chats/messages - start a turn and stream the reply.
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SendMessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let turn = state
        .turns
        .begin(user_id, &body.chat_id, &body.prompt)
        .await?;

    let (relay, receiver) = relay_channel(state.relay_capacity);
    let turns = state.turns.clone();
    let shutdown = state.shutdown.child_token();
    state.tasks.spawn(async move {
        let report = turns.run(turn, relay, shutdown).await;
        tracing::debug!(
            outcome = ?report.outcome,
            error = ?report.error,
            chunks = report.chunks,
            persisted = report.persisted,
            "Turn task finished"
        );
    });

    let events = ReceiverStream::new(receiver).map(|event| Ok(to_sse(&event)));
    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)))
}

/// Render a relay event as an SSE frame.
fn to_sse(event: &RelayEvent) -> Event {
    let data = match event {
        RelayEvent::Delta { text } => json!({ "text": text }),
        RelayEvent::Error { message } => json!({ "message": message }),
        RelayEvent::Done => json!({}),
    };
    Event::default().event(event.name()).data(data.to_string())
}
