//! API Gateway for the Corebank platform.
//!
//! Hosts the authentication chain (JWT verification → revocation blacklist
//! → sliding-window session guard) in front of every protected route and
//! serves the session-lifecycle endpoints that belong to the gateway
//! itself: logout and session introspection.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
