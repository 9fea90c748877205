//! # stockdesk-auth
//!
//! Authentication and authorization for StockDesk.
//!
//! - `jwt`: signing and verification of access and refresh tokens, each
//!   with its own secret
//! - `session`: refresh-session issue, rotation with reuse detection, and
//!   revocation
//! - `token`: random opaque tokens and their SHA-256 hashes
//! - `password`: Argon2id hashing and password policy
//! - `permission`: role-based module/action checks within a tenant

pub mod jwt;
pub mod password;
pub mod permission;
pub mod session;
pub mod token;

pub use jwt::{AccessClaims, JwtDecoder, JwtEncoder, RefreshClaims};
pub use password::{PasswordHasher, PasswordValidator};
pub use permission::PermissionEvaluator;
pub use session::{IssuedSession, SessionManager};
