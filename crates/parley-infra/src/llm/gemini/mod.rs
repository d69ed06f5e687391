//! Gemini generation backend.

pub mod client;
pub mod streaming;
pub mod types;

pub use client::GeminiProvider;
