//! # Gateway Middleware Library
//!
//! Authentication chain middleware for Corebank actix services
//!
//! The chain is an ordered, short-circuiting pipeline evaluated per request:
//! bearer-token verification, then the revocation blacklist, then the
//! sliding-window session guard. Public paths bypass the whole chain before
//! any store access.
//!
//! ## Modules
//! - `jwt_auth`: JWT verification and identity binding/propagation
//! - `token_revocation`: blacklist check (fail-open on store failure)
//! - `session_guard`: session liveness + sliding refresh (fail-closed)
//! - `public_paths`: static classifier for exempt endpoints
//! - `identity`: verified identity type and downstream headers
//! - `error`: terminal rejection type with compact reason codes
//! - `metrics`: prometheus counters for rejections and store failures
//! - `logging`: request/response logging

pub mod error;
pub mod identity;
pub mod jwt_auth;
pub mod logging;
pub mod metrics;
pub mod public_paths;
pub mod session_guard;
pub mod token_revocation;

pub use error::AuthRejection;
pub use identity::AuthenticatedUser;
pub use jwt_auth::JwtAuthMiddleware;
pub use logging::Logging;
pub use public_paths::PublicPaths;
pub use session_guard::SessionGuardMiddleware;
pub use token_revocation::TokenRevocationMiddleware;
