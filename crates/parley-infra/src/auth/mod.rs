//! Credential adapters: Argon2id password hashing and HS256 bearer tokens.

pub mod password;
pub mod token;

pub use password::Argon2PasswordHasher;
pub use token::JwtTokenCodec;
