//! Infrastructure layer for Parley.
//!
//! Contains implementations of the ports defined in `parley-core`: SQLite
//! repositories, the Gemini generation backend, the DuckDuckGo search
//! backend, Argon2id/JWT credential adapters, and the config file loader.

pub mod auth;
pub mod config;
pub mod llm;
pub mod search;
pub mod sqlite;
