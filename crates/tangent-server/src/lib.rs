//! HTTP surface of the tangent knowledge-base server: content store,
//! config, axum routes, rate-limit middleware and the chat assistant.

pub mod chat;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod store;
