//! An OAuth2 authorization server for testing OAuth2 clients.
//!
//! The server issues single-use authorization codes, exchanges them for
//! access and rotating refresh tokens, and exposes a scope-gated identity
//! endpoint. All state is held in memory and lost on restart.

pub mod api;
pub mod config;
pub mod error;
pub mod oauth2;
