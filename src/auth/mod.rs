//! Authentication for studyhall.
//!
//! Password hashing, session tokens, login lockout, and the session
//! authenticator that ties them to the credential store.

mod lockout;
mod password;
mod service;
mod token;

pub use lockout::{LockoutStatus, LockoutTracker, LOCKOUT_WINDOW_SECS, MAX_LOGIN_FAILURES};
pub use password::{Argon2Scheme, PasswordError, PasswordVerifier};
pub use service::{AuthError, Authenticator};
pub use token::{JwtCodec, TokenClaims, TokenCodec, TokenError};
