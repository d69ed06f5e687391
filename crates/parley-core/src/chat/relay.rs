//! Server-to-client relay channel for one message turn.
//!
//! A bounded tokio mpsc channel: the turn owns the sending half, the HTTP
//! layer turns the receiving half into an SSE body. Events are delivered in
//! send order. Once the receiver is gone every send fails and the sender
//! reports itself closed.

use std::time::Duration;

use parley_types::relay::RelayEvent;
use tokio::sync::mpsc;

/// Default buffer between the turn and the HTTP body.
pub const DEFAULT_RELAY_CAPACITY: usize = 32;

/// How long `error` and `finish` wait for buffer space before giving up on
/// a client that is connected but not reading.
pub const TERMINAL_SEND_GRACE: Duration = Duration::from_secs(5);

/// The client side of the relay has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("relay channel closed")]
pub struct RelayClosed;

/// Sending half held by the running turn.
///
/// `finish` consumes the sender, so nothing can be emitted after `done`.
#[derive(Debug)]
pub struct RelaySender {
    tx: mpsc::Sender<RelayEvent>,
    closed: bool,
}

/// Receiving half handed to the transport.
pub type RelayReceiver = mpsc::Receiver<RelayEvent>;

/// Create a connected relay pair.
pub fn relay_channel(capacity: usize) -> (RelaySender, RelayReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (RelaySender { tx, closed: false }, rx)
}

impl RelaySender {
    /// Forward one chunk of generated text.
    pub async fn delta(&mut self, text: impl Into<String>) -> Result<(), RelayClosed> {
        self.send(RelayEvent::Delta { text: text.into() }).await
    }

    /// Report a failure to the client. The turn still finishes normally.
    ///
    /// Waits at most [`TERMINAL_SEND_GRACE`] for buffer space; a client that
    /// never drains the buffer is treated as gone.
    pub async fn error(&mut self, message: impl Into<String>) -> Result<(), RelayClosed> {
        self.send_within(
            RelayEvent::Error {
                message: message.into(),
            },
            TERMINAL_SEND_GRACE,
        )
        .await
    }

    /// Emit `done` and release the channel. Bounded like [`Self::error`].
    pub async fn finish(mut self) {
        let _ = self.send_within(RelayEvent::Done, TERMINAL_SEND_GRACE).await;
    }

    /// Whether the receiver has been dropped or a send has failed.
    pub fn is_closed(&self) -> bool {
        self.closed || self.tx.is_closed()
    }

    /// Resolves once the receiving half is dropped.
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    async fn send(&mut self, event: RelayEvent) -> Result<(), RelayClosed> {
        if self.closed {
            return Err(RelayClosed);
        }
        match self.tx.send(event).await {
            Ok(()) => Ok(()),
            Err(_) => {
                self.closed = true;
                Err(RelayClosed)
            }
        }
    }

    async fn send_within(&mut self, event: RelayEvent, limit: Duration) -> Result<(), RelayClosed> {
        match tokio::time::timeout(limit, self.send(event)).await {
            Ok(result) => result,
            Err(_) => {
                self.closed = true;
                Err(RelayClosed)
            }
        }
    }
}
