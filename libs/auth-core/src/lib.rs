//! # Auth Core Library
//!
//! Core authentication primitives shared by Corebank services
//!
//! ## Modules
//! - `jwt`: token claims model, signing and verification
//! - `hash`: token digest helper for store keys

pub mod hash;
pub mod jwt;

pub use hash::token_digest;
pub use jwt::{AuthError, Claims, JwtSigner, JwtVerifier, KeyMaterial};
