//! Business logic and port definitions for Parley.
//!
//! This crate defines the "ports" (repository, generation, search and
//! credential traits) that the infrastructure layer implements, and the
//! turn orchestration built on them. It depends only on `parley-types` --
//! never on `parley-infra` or any database/IO crate.

pub mod auth;
pub mod chat;
mod deadline;
pub mod llm;
pub mod search;

#[cfg(test)]
mod test_support;
