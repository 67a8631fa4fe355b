//! Grant strategies layered on top of [`Client::request`](crate::Client::request).
//!
//! Strategies only sequence calls: they build parameters, pick the endpoint, and interpret
//! the body. Transport behavior and error classification stay in the client.

pub mod web_server;

pub use web_server::*;
