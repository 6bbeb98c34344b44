//! Request middleware chain.
//!
//! # Order (outermost first)
//! ```text
//! security headers
//!     → csrf.rs        origin validation       403
//!     → rate_limit.rs  API pool (not stream upgrades)  429 + Retry-After
//!     → ws_limit.rs    WebSocket slots          429 + Retry-After
//!     → session.rs     attach verified session
//!     → audit.rs       audit trail
//!     → handler
//! ```
//!
//! A stage that rejects returns its response without calling `next`, so
//! nothing further down the chain runs.

pub mod audit;
pub mod csrf;
pub mod rate_limit;
pub mod session;
pub mod ws_limit;

pub use audit::audit_log;
pub use csrf::origin_guard;
pub use rate_limit::{api_rate_limit, login_rate_limit};
pub use session::attach_session;
pub use ws_limit::connection_limit;
