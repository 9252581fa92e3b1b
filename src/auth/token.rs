//! Session token encoding and decoding.
//!
//! Tokens are HMAC-signed JWTs carrying the user id and the user's
//! password version. They carry no expiry: a token stays valid until
//! the user's version counter moves, which happens on every password
//! change or reset. The version comparison lives in the authenticator;
//! this module only signs and parses.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token errors.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Token is malformed, tampered with, or signed with another key.
    #[error("invalid token")]
    Invalid,

    /// Signing failed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Claims embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id.
    pub sub: i64,
    /// Password version the token was issued against.
    pub ver: i64,
}

/// Capability for issuing and parsing session tokens.
pub trait TokenCodec: Send + Sync {
    /// Issue a token binding the user id to a password version.
    fn issue(&self, user_id: i64, version: i64) -> Result<String, TokenError>;

    /// Parse and validate a token's signature, returning its claims.
    fn parse(&self, token: &str) -> Result<TokenClaims, TokenError>;
}

/// HS256 JWT implementation of [`TokenCodec`].
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    /// Create a codec from the configured signing secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No expiry claim: version mismatch is the invalidation mechanism.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl TokenCodec for JwtCodec {
    fn issue(&self, user_id: i64, version: i64) -> Result<String, TokenError> {
        let claims = TokenClaims {
            sub: user_id,
            ver: version,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn parse(&self, token: &str) -> Result<TokenClaims, TokenError> {
        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }
}
