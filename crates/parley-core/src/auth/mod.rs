//! Accounts and authentication.
//!
//! Password hashing and token signing are ports; argon2 and JWT adapters
//! live in parley-infra.

pub mod credentials;
pub mod repository;
pub mod service;
