//! # Session Store Library
//!
//! Shared key/value stores backing the Corebank authentication layer
//!
//! Two independent concerns live here, each under its own key namespace so
//! they can be colocated in one Redis instance without collisions:
//! - `revocation`: hashed-token blacklist consulted on every request
//! - `session`: sliding-window session records plus a token→subject lookup
//!
//! Correctness relies on per-key atomic operations (SET-EX, EXISTS, DEL)
//! rather than multi-step transactions; concurrent writers for the same key
//! resolve last-write-wins.

pub mod backend;
pub mod error;
pub mod revocation;
pub mod session;

pub use backend::{KvBackend, MemoryBackend, RedisBackend};
pub use error::StoreError;
pub use revocation::RevocationStore;
pub use session::{ClientContext, SessionConfig, SessionRecord, SessionStore};
