//! Lockbox HTTP server
//!
//! Exposes the session authority and the record sync engine over JSON/HTTP.
//! Record routes sit behind a bearer-token middleware; register, login,
//! refresh and health are public.

pub mod auth;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod server;

pub use config::ServerConfig;
pub use server::{build_router, AppState};
