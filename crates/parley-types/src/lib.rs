//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across the Parley chat
//! backend: users, chats and their messages, generation-backend request
//! shapes, relay events, configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod relay;
pub mod search;
pub mod user;
