//! Refresh-session lifecycle: issue, rotation, revocation.

pub mod manager;

pub use manager::{IssuedSession, SessionManager};
