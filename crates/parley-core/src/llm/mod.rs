//! Generation backend abstractions for Parley.
//!
//! - `LlmProvider`: RPITIT trait for concrete backends
//! - `BoxLlmProvider`: object-safe wrapper for dynamic dispatch
//! - `StreamInSpan`: keeps a tracing span open across a streaming call

pub mod box_provider;
pub mod instrument;
pub mod provider;
