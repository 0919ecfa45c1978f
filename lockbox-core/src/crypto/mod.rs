//! Cryptographic primitives for the session layer.
//!
//! This module provides:
//! - Argon2id password hashing (PHC strings, per-hash random salt)
//! - HS256 signed, self-contained session tokens

pub mod password;
pub mod token;

pub use password::{CredentialHasher, HashingParams};
pub use token::{Claims, TokenKind, TokenSigner};
