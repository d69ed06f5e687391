//! Retrieval gate: decides from the prompt alone whether a turn needs web
//! context and, if so, turns search hits into a steering instruction.
//!
//! The gate fails closed. Classification errors, missing credentials,
//! timeouts and unexpected replies all mean "no search", and search
//! failures mean "no snippet". A turn is never blocked by the gate.

use std::sync::Arc;
use std::time::Duration;

use parley_types::llm::{CompletionRequest, Turn};
use parley_types::search::SearchHit;
use tracing::{Instrument, debug, info_span, warn};

use crate::llm::box_provider::BoxLlmProvider;
use crate::search::backend::BoxSearchBackend;

/// Fixed instruction for the classification call.
pub const ROUTING_INSTRUCTION: &str = "\
You are a routing agent.

Decide whether answering the user's question requires searching the internet.

Choose SEARCH if:
- Depends on current, recent, or changing information
- Involves real-world events, people, companies, prices, or news
- Asks for \"latest\", \"current\", \"today\", or similar

Choose NO_SEARCH if:
- Can be answered using general knowledge
- Is about programming, math, logic, or explanations
- Does not require up-to-date information

Respond with ONLY one word: SEARCH or NO_SEARCH.
Do not add any other text.";

/// Whether a prompt should be augmented with search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalDecision {
    Search,
    NoSearch,
}

impl RetrievalDecision {
    /// Only an exact `SEARCH` (ignoring case and surrounding whitespace)
    /// selects search.
    pub fn from_reply(reply: &str) -> Self {
        if reply.trim().to_uppercase() == "SEARCH" {
            RetrievalDecision::Search
        } else {
            RetrievalDecision::NoSearch
        }
    }
}

/// Limits and models used by the gate.
#[derive(Debug, Clone)]
pub struct GateSettings {
    pub router_model: String,
    pub classify_timeout: Duration,
    pub search_timeout: Duration,
    pub max_results: usize,
    pub max_chars: usize,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            router_model: "gemini-2.5-flash-lite".to_string(),
            classify_timeout: Duration::from_secs(8),
            search_timeout: Duration::from_secs(8),
            max_results: 5,
            max_chars: 2000,
        }
    }
}

pub struct RetrievalGate {
    provider: Arc<BoxLlmProvider>,
    backend: Option<BoxSearchBackend>,
    settings: GateSettings,
}

impl RetrievalGate {
    /// A gate without a backend never searches and never classifies.
    pub fn new(
        provider: Arc<BoxLlmProvider>,
        backend: Option<BoxSearchBackend>,
        settings: GateSettings,
    ) -> Self {
        Self {
            provider,
            backend,
            settings,
        }
    }

    /// Classify `prompt` with one non-streaming call.
    pub async fn decide(&self, prompt: &str) -> RetrievalDecision {
        if self.backend.is_none() {
            return RetrievalDecision::NoSearch;
        }

        let request = CompletionRequest {
            model: self.settings.router_model.clone(),
            turns: vec![Turn::user(prompt)],
            system: Some(ROUTING_INSTRUCTION.to_string()),
            max_tokens: None,
            temperature: None,
            stream: false,
        };

        let span = info_span!(
            "gen_ai.classify",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.stream = false,
        );

        let call = self.provider.complete(&request).instrument(span);
        match tokio::time::timeout(self.settings.classify_timeout, call).await {
            Ok(Ok(response)) => {
                let decision = RetrievalDecision::from_reply(&response.content);
                debug!(reply = %response.content.trim(), ?decision, "Classified prompt");
                decision
            }
            Ok(Err(e)) => {
                debug!(error = %e, "Classification failed, skipping search");
                RetrievalDecision::NoSearch
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.settings.classify_timeout.as_millis() as u64,
                    "Classification timed out, skipping search"
                );
                RetrievalDecision::NoSearch
            }
        }
    }

    /// Fetch and format search results. Empty on any failure.
    pub async fn retrieve(&self, prompt: &str) -> String {
        let Some(backend) = &self.backend else {
            return String::new();
        };

        let call = backend.search(prompt, self.settings.max_results);
        match tokio::time::timeout(self.settings.search_timeout, call).await {
            Ok(Ok(hits)) => format_hits(&hits, self.settings.max_results, self.settings.max_chars),
            Ok(Err(e)) => {
                warn!(backend = backend.name(), error = %e, "Search failed");
                String::new()
            }
            Err(_) => {
                warn!(backend = backend.name(), "Search timed out");
                String::new()
            }
        }
    }

    /// Decide, retrieve, and wrap a non-empty snippet into an instruction.
    pub async fn steer(&self, prompt: &str) -> Option<String> {
        if self.decide(prompt).await == RetrievalDecision::NoSearch {
            return None;
        }
        let snippet = self.retrieve(prompt).await;
        if snippet.is_empty() {
            debug!("Search returned nothing usable");
            return None;
        }
        Some(steering_instruction(&snippet))
    }
}

/// Format hits as `- {title}: {snippet}` lines, then cap the joined text at
/// `max_chars` characters, appending `...` when cut.
pub fn format_hits(hits: &[SearchHit], max_results: usize, max_chars: usize) -> String {
    let joined = hits
        .iter()
        .filter(|h| !h.is_blank())
        .take(max_results)
        .map(|h| format!("- {}: {}", h.title.trim(), h.snippet.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    match joined.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &joined[..cut]),
        None => joined,
    }
}

/// Instruction that replaces the default when search results are available.
pub fn steering_instruction(snippet: &str) -> String {
    format!(
        "You are a helpful AI assistant. The following web search results were \
         retrieved for the user's question. Use them to answer, prefer them over \
         your own knowledge for current facts, and say so if they do not contain \
         the answer.\n\nSearch results:\n{snippet}"
    )
}
