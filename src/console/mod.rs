//! External collaborators the console API is built on.
//!
//! Only the interfaces live here, plus a static repository used by the
//! binary and tests. Cluster access and session issuance are implemented by
//! other services.

pub mod repository;
pub mod session;

pub use repository::{RepositoryError, Resource, ResourceRepository, StaticRepository};
pub use session::{Credentials, IssuedSession, IssuerError, SessionIssuer, SessionVerifier};
