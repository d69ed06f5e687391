//! Events carried by the server-to-client relay channel.

use serde::{Deserialize, Serialize};

/// One event on a turn's relay channel.
///
/// A turn emits zero or more `Delta`s, at most one `Error`, and finishes
/// with exactly one `Done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum RelayEvent {
    Delta { text: String },
    Error { message: String },
    Done,
}

impl RelayEvent {
    /// SSE event name for this event.
    pub fn name(&self) -> &'static str {
        match self {
            RelayEvent::Delta { .. } => "delta",
            RelayEvent::Error { .. } => "error",
            RelayEvent::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RelayEvent::Done)
    }
}
