//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layer composition)
//!     → middleware/ (headers → origin → rate limit → ws slots → session → audit)
//!     → api.rs (console handlers) / websocket.rs (namespace streams)
//!     → Send to client
//! ```

pub mod api;
pub mod middleware;
pub mod server;
pub mod websocket;

pub use server::{AppState, Collaborators, EdgeState, HttpServer};
