//! `quillpost-auth` — authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod credentials;
pub mod identity;
pub mod ownership;
pub mod password;
pub mod token;
pub mod user;

pub use claims::{ClaimsError, SESSION_TTL_SECS, SessionClaims, validate_claims};
pub use credentials::{PolicyViolation, validate_password, validate_username};
pub use identity::Identity;
pub use ownership::{Action, Owned, OwnershipError, authorize, authorize_owned};
pub use password::{HashCost, PasswordError, PasswordStore};
pub use token::{TokenCodec, TokenError};
pub use user::{NewUser, ProfileUpdate, User};
