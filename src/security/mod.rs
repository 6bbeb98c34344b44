//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (hardening response headers)
//!     → origin.rs (Origin/Referer check for state-changing methods)
//!     → rate_limit.rs (per-IP token buckets; skipped for WebSocket upgrades)
//!     → connections.rs (per-IP WebSocket slots; upgrades only)
//!     → Pass to audit + handlers
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - No trust in client input; forwarded headers only from trusted proxies
//! - Every registry owns its own lock

pub mod connections;
pub mod headers;
pub mod origin;
pub mod proxy;
pub mod rate_limit;

pub use connections::{ConnectionLimiter, ConnectionSlot};
pub use origin::{is_origin_allowed, validate_request, OriginRejection};
pub use proxy::{client_ip, effective_host, TrustConfig};
pub use rate_limit::{Admission, RateLimiterPool, RateLimiterRegistry};
