//! Edge security and authorization layer for a multi-cluster console.
//!
//! Every inbound HTTP/WebSocket request passes an ordered chain that checks
//! its origin, its rate, its connection count and finally the caller's
//! namespace permissions before any handler runs.

pub mod auth;
pub mod config;
pub mod console;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::ConsoleConfig;
pub use error::EdgeError;
pub use http::{Collaborators, HttpServer};
pub use lifecycle::Shutdown;
