//! Message turn orchestration.
//!
//! A turn runs in two phases:
//!
//! 1. [`TurnOrchestrator::begin`] validates the request, checks ownership and
//!    durably appends the user message. Its errors are returned to the caller
//!    before any streaming starts.
//! 2. [`TurnOrchestrator::run`] consults the retrieval gate, builds context,
//!    streams the reply through the relay, appends the model message with
//!    whatever was delivered, and emits `done`.
//!
//! Exactly two transcript writes happen per turn, whatever the chunk count.
//! The model message is written even when the stream failed, timed out, or
//! the client went away.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use parley_types::chat::{ChatMessage, ChatRole};
use parley_types::error::ChatError;
use parley_types::llm::{CompletionRequest, LlmError, StreamEvent};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::chat::context::ContextBuilder;
use crate::chat::relay::RelaySender;
use crate::chat::repository::ChatRepository;
use crate::chat::service::parse_chat_id;
use crate::deadline::bounded;
use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::instrument::StreamInSpan;
use crate::search::gate::RetrievalGate;

/// Lifecycle states of a turn, recorded on its span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Created,
    UserTurnPersisted,
    ContextReady,
    Streaming,
    Completed,
    /// `begin` failed; nothing was streamed or written.
    AbortedBeforeStream,
    AbortedDuringStream,
}

/// Why streaming stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The backend finished normally.
    Finished,
    /// The backend reported an error.
    Failed,
    /// The generation deadline passed.
    TimedOut,
    /// The client stopped listening.
    Disconnected,
    /// The server is shutting down.
    Cancelled,
}

impl StreamOutcome {
    pub fn final_state(self) -> TurnState {
        match self {
            StreamOutcome::Finished => TurnState::Completed,
            _ => TurnState::AbortedDuringStream,
        }
    }
}

/// Summary of a finished turn.
#[derive(Debug)]
pub struct TurnReport {
    pub outcome: StreamOutcome,
    /// Backend failure reported to the client, if any.
    pub error: Option<ChatError>,
    pub chunks: usize,
    /// Text delivered to the client and written as the model message.
    pub content: String,
    pub persisted: bool,
}

/// A turn whose user message is durable and whose chat is verified.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub chat_id: Uuid,
    pub owner_id: Uuid,
    pub prompt: String,
    /// Transcript as loaded before the prompt was appended.
    pub history: Vec<ChatMessage>,
}

/// Generation parameters for a turn.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub generation_timeout: Duration,
    pub store_timeout: Duration,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            max_tokens: None,
            temperature: None,
            generation_timeout: Duration::from_secs(40),
            store_timeout: Duration::from_secs(5),
        }
    }
}

pub struct TurnOrchestrator<C: ChatRepository> {
    chat_repo: C,
    provider: Arc<BoxLlmProvider>,
    gate: RetrievalGate,
    context: ContextBuilder,
    settings: TurnSettings,
}

enum Next {
    Item(Option<Result<StreamEvent, LlmError>>),
    Deadline,
    Disconnected,
    Cancelled,
}

impl<C: ChatRepository> TurnOrchestrator<C> {
    pub fn new(
        chat_repo: C,
        provider: Arc<BoxLlmProvider>,
        gate: RetrievalGate,
        context: ContextBuilder,
        settings: TurnSettings,
    ) -> Self {
        Self {
            chat_repo,
            provider,
            gate,
            context,
            settings,
        }
    }

    /// Validate, verify ownership, and persist the user message.
    ///
    /// Nothing is written when this returns an error.
    pub async fn begin(
        &self,
        owner_id: Uuid,
        chat_id: &str,
        prompt: &str,
    ) -> Result<PendingTurn, ChatError> {
        debug!(chat_id, user_id = %owner_id, state = ?TurnState::Created, "Turn requested");
        let result = self.persist_user_turn(owner_id, chat_id, prompt).await;
        if let Err(e) = &result {
            debug!(chat_id, user_id = %owner_id, state = ?TurnState::AbortedBeforeStream, error = %e, "Turn rejected");
        }
        result
    }

    async fn persist_user_turn(
        &self,
        owner_id: Uuid,
        chat_id: &str,
        prompt: &str,
    ) -> Result<PendingTurn, ChatError> {
        if chat_id.trim().is_empty() || prompt.trim().is_empty() {
            return Err(ChatError::Validation(
                "chat_id and prompt are required".to_string(),
            ));
        }
        let chat_id = parse_chat_id(chat_id)?;

        let chat = bounded(
            self.settings.store_timeout,
            ChatError::StorageTimeout,
            self.chat_repo.find_owned(&chat_id, &owner_id),
        )
        .await?
        .ok_or(ChatError::NotFound)?;

        bounded(
            self.settings.store_timeout,
            ChatError::StorageTimeout,
            self.chat_repo
                .append_message(&chat_id, &owner_id, &ChatMessage::user(prompt)),
        )
        .await?;

        debug!(chat_id = %chat_id, user_id = %owner_id, state = ?TurnState::UserTurnPersisted, "User turn persisted");

        Ok(PendingTurn {
            chat_id,
            owner_id,
            prompt: prompt.to_string(),
            history: chat.messages,
        })
    }

    /// Stream the reply for `turn` through `relay` and commit it.
    ///
    /// Never fails: every problem after `begin` is reported to the client as
    /// an `error` event and the turn still ends with `done`.
    pub async fn run(
        &self,
        turn: PendingTurn,
        mut relay: RelaySender,
        shutdown: CancellationToken,
    ) -> TurnReport {
        let span = info_span!(
            "chat.turn",
            chat_id = %turn.chat_id,
            user_id = %turn.owner_id,
            state = ?TurnState::UserTurnPersisted,
        );

        async move {
            let steering = self.gate.steer(&turn.prompt).await;
            let ctx = self
                .context
                .build(&turn.history, &turn.prompt, steering.as_deref());
            tracing::Span::current().record("state", tracing::field::debug(TurnState::ContextReady));
            debug!(turns = ctx.turns.len(), augmented = steering.is_some(), "Context ready");

            let request = CompletionRequest {
                model: self.settings.model.clone(),
                turns: ctx.turns,
                system: Some(ctx.instruction),
                max_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
                stream: true,
            };

            tracing::Span::current().record("state", tracing::field::debug(TurnState::Streaming));
            let (outcome, error, content, chunks) =
                self.relay_stream(request, &mut relay, &shutdown).await;
            tracing::Span::current().record("state", tracing::field::debug(outcome.final_state()));

            let persisted = match bounded(
                self.settings.store_timeout,
                ChatError::StorageTimeout,
                self.chat_repo.append_message(
                    &turn.chat_id,
                    &turn.owner_id,
                    &ChatMessage::model(content.clone()),
                ),
            )
            .await
            {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, role = %ChatRole::Model, "Failed to persist model turn");
                    false
                }
            };

            relay.finish().await;

            info!(?outcome, chunks, chars = content.len(), persisted, "Turn finished");
            TurnReport {
                outcome,
                error,
                chunks,
                content,
                persisted,
            }
        }
        .instrument(span)
        .await
    }

    /// Consume the generation stream until it ends, fails, times out, the
    /// client leaves, or the server shuts down. Returns the accumulated text.
    async fn relay_stream(
        &self,
        request: CompletionRequest,
        relay: &mut RelaySender,
        shutdown: &CancellationToken,
    ) -> (StreamOutcome, Option<ChatError>, String, usize) {
        let gen_span = info_span!(
            "gen_ai.stream",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = ?request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.request.stream = true,
        );
        let mut stream = StreamInSpan::new(self.provider.stream(request), gen_span);
        let deadline = Instant::now() + self.settings.generation_timeout;

        let mut content = String::new();
        let mut chunks = 0usize;
        let mut error = None;

        let outcome = loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => Next::Cancelled,
                _ = relay.closed() => Next::Disconnected,
                item = tokio::time::timeout_at(deadline, stream.next()) => match item {
                    Ok(item) => Next::Item(item),
                    Err(_) => Next::Deadline,
                },
            };

            match next {
                Next::Item(Some(Ok(StreamEvent::TextDelta { text }))) => {
                    if text.is_empty() {
                        continue;
                    }
                    // A connected client that stops reading fills the buffer;
                    // the send must not outlive the deadline or shutdown.
                    let stopped = tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => Some(StreamOutcome::Cancelled),
                        _ = tokio::time::sleep_until(deadline) => Some(StreamOutcome::TimedOut),
                        sent = relay.delta(text.as_str()) => sent.err().map(|_| StreamOutcome::Disconnected),
                    };
                    if let Some(outcome) = stopped {
                        break outcome;
                    }
                    content.push_str(&text);
                    chunks += 1;
                }
                Next::Item(Some(Ok(StreamEvent::Done))) | Next::Item(None) => {
                    break StreamOutcome::Finished;
                }
                Next::Item(Some(Ok(other))) => {
                    debug!(event = ?other, "Stream metadata");
                }
                Next::Item(Some(Err(e))) => {
                    warn!(error = %e, chunks, "Generation stream failed");
                    error = Some(ChatError::Upstream(e.to_string()));
                    break StreamOutcome::Failed;
                }
                Next::Deadline => break StreamOutcome::TimedOut,
                Next::Disconnected => break StreamOutcome::Disconnected,
                Next::Cancelled => break StreamOutcome::Cancelled,
            }
        };

        // Dropping the stream cancels the upstream call.
        drop(stream);

        match outcome {
            StreamOutcome::TimedOut => {
                warn!(
                    timeout_secs = self.settings.generation_timeout.as_secs(),
                    chunks,
                    "Generation timed out"
                );
                error = Some(ChatError::UpstreamTimeout);
            }
            StreamOutcome::Cancelled => {
                info!(chunks, "Turn cancelled by shutdown");
                let _ = relay.error("server is shutting down").await;
            }
            StreamOutcome::Disconnected => info!(chunks, "Client disconnected mid-stream"),
            StreamOutcome::Finished | StreamOutcome::Failed => {}
        }

        if let Some(err) = &error {
            let _ = relay.error(err.to_string()).await;
        }
        (outcome, error, content, chunks)
    }
}
