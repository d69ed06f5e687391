//! Chats and message turns.
//!
//! - `repository`: the owner-bound transcript store port
//! - `service`: create/list/get/delete
//! - `context`: bounded history for a generation call
//! - `relay`: the per-turn server-to-client event channel
//! - `turn`: the streaming orchestrator

pub mod context;
pub mod relay;
pub mod repository;
pub mod service;
pub mod turn;
