//! Identity and authorization subsystem.
//!
//! # Data Flow
//! ```text
//! upstream session verification
//!     → SessionContext (claims / map / raw triple) in request extensions
//!     → identity.rs (normalise into Identity)
//!     → permissions.rs (namespace access, levels, filtering)
//!     → ldap.rs (optional directory admin check)
//! ```
//!
//! # Design Decisions
//! - `role` and `permissions` are independent signals; neither is inferred from the other
//! - A missing identity is a hard `Unauthenticated`, never an empty result
//! - Directory failures resolve to the non-privileged outcome

pub mod identity;
pub mod ldap;
pub mod permissions;

pub use identity::{Claims, Identity, PermissionLevel, Role, SessionContext};
pub use ldap::{is_admin, LdapAdminChecker, LdapAdminConfig, LdapError};
pub use permissions::{Action, Namespaced};
