//! Bounded conversation context for a generation call.
//!
//! History is a fixed recent-message window, not a token budget: empty
//! messages are dropped, the last `window` survivors are kept, and the
//! prompt being answered always goes last.

use parley_types::chat::{ChatMessage, ChatRole};
use parley_types::llm::Turn;

/// Instruction used when nothing steers the call.
pub const DEFAULT_INSTRUCTION: &str = "You are a helpful AI assistant.";

/// Number of history messages kept when no window is configured.
pub const DEFAULT_HISTORY_WINDOW: usize = 6;

/// Ordered turns plus the instruction for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnContext {
    pub turns: Vec<Turn>,
    pub instruction: String,
}

/// Builds [`TurnContext`]s with a fixed history window.
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder {
    window: usize,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl ContextBuilder {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Assemble history from `messages`, append `prompt`, and pick the
    /// instruction. A non-empty `steering` replaces the default outright.
    pub fn build(
        &self,
        messages: &[ChatMessage],
        prompt: &str,
        steering: Option<&str>,
    ) -> TurnContext {
        let kept: Vec<&ChatMessage> = messages.iter().filter(|m| !m.content.is_empty()).collect();
        let start = kept.len().saturating_sub(self.window);

        let mut turns: Vec<Turn> = kept[start..]
            .iter()
            .map(|m| match m.role {
                ChatRole::Model => Turn::assistant(m.content.clone()),
                ChatRole::User => Turn::user(m.content.clone()),
            })
            .collect();
        turns.push(Turn::user(prompt));

        let instruction = match steering {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => DEFAULT_INSTRUCTION.to_string(),
        };

        TurnContext { turns, instruction }
    }
}
