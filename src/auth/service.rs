//! Session authenticator.
//!
//! Orchestrates the credential store, password verifier, token codec,
//! and lockout tracker into the account lifecycle operations: login,
//! register, token verification, password change/reset, and the
//! administrative disable/enable/delete switches.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use super::lockout::{LockoutStatus, LockoutTracker};
use super::password::{Argon2Scheme, PasswordError, PasswordVerifier};
use super::token::{JwtCodec, TokenCodec, TokenError};
use crate::config::AuthConfig;
use crate::db::{Database, NewUser, UserRecord, UserRepository};
use crate::Error;

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown username or wrong password. Deliberately a single kind,
    /// so a caller cannot distinguish the two cases.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Wrong current password on a password change.
    #[error("old password incorrect")]
    OldPasswordIncorrect,

    /// Account exists and the password matched, but the account is
    /// administratively disabled.
    #[error("account is disabled")]
    AccountDisabled,

    /// Too many recent failures for this username.
    #[error("too many failed attempts, retry in {} seconds", retry_after.as_secs())]
    RateLimited {
        /// Time until the lockout window opens again.
        retry_after: Duration,
    },

    /// A live account with this username already exists.
    #[error("username already exists")]
    DuplicateUsername,

    /// Self-service registration is switched off.
    #[error("registration is disabled")]
    RegistrationDisabled,

    /// No live user matched.
    #[error("user not found")]
    UserNotFound,

    /// Token is malformed, tampered with, or signed with another key.
    #[error("invalid token")]
    InvalidToken,

    /// Token was issued before the user's last password change.
    #[error("token expired")]
    TokenExpired,

    /// Underlying storage failure.
    #[error(transparent)]
    Store(Error),

    /// Internal failure (hashing, signing).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<Error> for AuthError {
    fn from(e: Error) -> Self {
        match e {
            Error::DuplicateUsername => AuthError::DuplicateUsername,
            Error::NotFound(_) => AuthError::UserNotFound,
            other => AuthError::Store(other),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Invalid => AuthError::InvalidToken,
            TokenError::Signing(msg) => AuthError::Internal(msg),
        }
    }
}

/// The session authenticator.
///
/// Constructed explicitly from a database handle and config; holds the
/// password and token capabilities behind trait objects so tests can
/// substitute cheap fakes.
pub struct Authenticator {
    db: Arc<Database>,
    verifier: Box<dyn PasswordVerifier>,
    tokens: Box<dyn TokenCodec>,
    lockout: LockoutTracker,
    registration_enabled: bool,
    /// Fixed credential hashed when the username does not exist, so an
    /// unknown-username login burns the same time as a wrong password.
    dummy_salt: String,
    dummy_hash: String,
}

impl Authenticator {
    /// Create an authenticator with the production verifier and codec.
    pub fn new(db: Arc<Database>, config: &AuthConfig) -> Result<Self, AuthError> {
        let lockout = LockoutTracker::with_limits(
            config.max_login_failures,
            Duration::from_secs(config.lockout_window_secs),
        );
        Self::with_capabilities(
            db,
            Box::new(Argon2Scheme::new()),
            Box::new(JwtCodec::new(&config.token_secret)),
            lockout,
            config.registration_enabled,
        )
    }

    /// Create an authenticator with explicit capabilities.
    pub fn with_capabilities(
        db: Arc<Database>,
        verifier: Box<dyn PasswordVerifier>,
        tokens: Box<dyn TokenCodec>,
        lockout: LockoutTracker,
        registration_enabled: bool,
    ) -> Result<Self, AuthError> {
        let dummy_salt = verifier.generate_salt();
        let dummy_hash = verifier.hash("studyhall-dummy-credential", &dummy_salt)?;
        Ok(Self {
            db,
            verifier,
            tokens,
            lockout,
            registration_enabled,
            dummy_salt,
            dummy_hash,
        })
    }

    fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.db)
    }

    /// Authenticate a username/password pair and issue a session token.
    ///
    /// Order matters: lockout first (no credential work while locked),
    /// then password verification, then the disabled check. A disabled
    /// account with a wrong password reads as `InvalidCredentials` and
    /// counts toward the lockout; only a correct password reveals
    /// `AccountDisabled`.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        match self.lockout.check(&self.db, username).await? {
            LockoutStatus::Locked { retry_after } => {
                warn!(
                    username = %username,
                    retry_after_secs = retry_after.as_secs(),
                    "Login blocked by lockout"
                );
                return Err(AuthError::RateLimited { retry_after });
            }
            LockoutStatus::Allowed => {}
        }

        let user = match self.users().get_by_username(username).await? {
            Some(user) => user,
            None => {
                // Unknown usernames never enter the failure history, but
                // the hash still runs so timing does not reveal absence.
                let _ = self
                    .verifier
                    .verify(&self.dummy_salt, password, &self.dummy_hash);
                warn!(username = %username, "Login failed: unknown username");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self
            .verifier
            .verify(&user.password_salt, password, &user.password_hash)
        {
            self.lockout.record_failure(&self.db, username).await?;
            warn!(username = %username, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if user.is_disabled {
            warn!(username = %username, user_id = user.id, "Login refused: account disabled");
            return Err(AuthError::AccountDisabled);
        }

        self.lockout.clear(&self.db, username).await?;
        let token = self.tokens.issue(user.id, user.version)?;
        info!(username = %username, user_id = user.id, "Login succeeded");
        Ok(token)
    }

    /// Register a new account and issue its first session token.
    ///
    /// The first-ever live account becomes a teacher; later ones are
    /// students.
    pub async fn register(&self, username: &str, password: &str) -> Result<String, AuthError> {
        if !self.registration_enabled {
            return Err(AuthError::RegistrationDisabled);
        }

        let salt = self.verifier.generate_salt();
        let hash = self.verifier.hash(password, &salt)?;

        let user = self
            .users()
            .create(&NewUser::new(username, hash, salt))
            .await?;

        let token = self.tokens.issue(user.id, user.version)?;
        info!(username = %username, user_id = user.id, role = %user.role, "User registered");
        Ok(token)
    }

    /// Validate a session token and return the current user record.
    ///
    /// Pure: no side effects, no history writes. The version embedded in
    /// the token must match the stored one, so any password change since
    /// issuance invalidates it.
    pub async fn verify_token(&self, token: &str) -> Result<UserRecord, AuthError> {
        let claims = self.tokens.parse(token)?;

        let user = self
            .users()
            .get_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.version != claims.ver {
            return Err(AuthError::TokenExpired);
        }

        Ok(user)
    }

    /// Change a user's own password, returning a token for the new
    /// version. Every previously issued token becomes invalid.
    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<String, AuthError> {
        let user = self
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self
            .verifier
            .verify(&user.password_salt, old_password, &user.password_hash)
        {
            warn!(user_id, "Password change refused: old password incorrect");
            return Err(AuthError::OldPasswordIncorrect);
        }

        let salt = self.verifier.generate_salt();
        let hash = self.verifier.hash(new_password, &salt)?;
        let version = self.users().set_password(user_id, &hash, &salt).await?;

        let token = self.tokens.issue(user_id, version)?;
        info!(user_id, "Password changed");
        Ok(token)
    }

    /// Administratively reset a user's password to their username and
    /// return the plaintext once.
    ///
    /// Works on soft-deleted users too. The caller is responsible for
    /// checking that the acting user holds the teacher role.
    pub async fn reset_password(&self, user_id: i64) -> Result<String, AuthError> {
        let user = self
            .users()
            .get_by_id_any(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let new_password = user.username.clone();
        let salt = self.verifier.generate_salt();
        let hash = self.verifier.hash(&new_password, &salt)?;
        self.users().set_password(user_id, &hash, &salt).await?;

        info!(user_id, "Password administratively reset");
        Ok(new_password)
    }

    /// Administratively disable an account. Outstanding tokens keep
    /// verifying; only new logins are refused.
    pub async fn disable_user(&self, user_id: i64) -> Result<(), AuthError> {
        self.users().set_disabled(user_id, true).await?;
        Ok(())
    }

    /// Re-enable a disabled account.
    pub async fn enable_user(&self, user_id: i64) -> Result<(), AuthError> {
        self.users().set_disabled(user_id, false).await?;
        Ok(())
    }

    /// Soft-delete an account. Its username becomes reusable.
    pub async fn delete_user(&self, user_id: i64) -> Result<(), AuthError> {
        self.users().soft_delete(user_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Role;

    async fn setup() -> Authenticator {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        Authenticator::new(db, &AuthConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let auth = setup().await;

        auth.register("alice", "password1").await.unwrap();
        let token = auth.login("alice", "password1").await.unwrap();

        let user = auth.verify_token(&token).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.role, Role::Teacher);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let auth = setup().await;
        auth.register("alice", "password1").await.unwrap();

        let result = auth.login("alice", "wrong").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_username() {
        let auth = setup().await;

        let result = auth.login("ghost", "whatever").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_username_not_recorded() {
        let auth = setup().await;

        for _ in 0..10 {
            let _ = auth.login("ghost", "whatever").await;
        }
        // Still invalid credentials, never rate limited
        let result = auth.login("ghost", "whatever").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_lockout_after_failures() {
        let auth = setup().await;
        auth.register("alice", "password1").await.unwrap();

        for _ in 0..5 {
            let result = auth.login("alice", "wrong").await;
            assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        }

        // Even the correct password is refused while locked
        let result = auth.login("alice", "password1").await;
        assert!(matches!(result, Err(AuthError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_success_clears_failures() {
        let auth = setup().await;
        auth.register("alice", "password1").await.unwrap();

        for _ in 0..4 {
            let _ = auth.login("alice", "wrong").await;
        }
        auth.login("alice", "password1").await.unwrap();

        // History cleared: four more failures stay below the limit
        for _ in 0..4 {
            let _ = auth.login("alice", "wrong").await;
        }
        assert!(auth.login("alice", "password1").await.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_account() {
        let auth = setup().await;
        let token = auth.register("alice", "password1").await.unwrap();
        let user = auth.verify_token(&token).await.unwrap();

        auth.disable_user(user.id).await.unwrap();

        // Correct password reveals the disabled state
        let result = auth.login("alice", "password1").await;
        assert!(matches!(result, Err(AuthError::AccountDisabled)));
        // Wrong password stays indistinguishable
        let result = auth.login("alice", "wrong").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));

        auth.enable_user(user.id).await.unwrap();
        assert!(auth.login("alice", "password1").await.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_failures_count_toward_lockout() {
        let auth = setup().await;
        let token = auth.register("alice", "password1").await.unwrap();
        let user = auth.verify_token(&token).await.unwrap();
        auth.disable_user(user.id).await.unwrap();

        for _ in 0..5 {
            let _ = auth.login("alice", "wrong").await;
        }
        let result = auth.login("alice", "password1").await;
        assert!(matches!(result, Err(AuthError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_change_password_invalidates_old_tokens() {
        let auth = setup().await;
        let old_token = auth.register("alice", "password1").await.unwrap();
        let user = auth.verify_token(&old_token).await.unwrap();

        let new_token = auth
            .change_password(user.id, "password1", "password2")
            .await
            .unwrap();

        assert!(matches!(
            auth.verify_token(&old_token).await,
            Err(AuthError::TokenExpired)
        ));
        assert!(auth.verify_token(&new_token).await.is_ok());

        assert!(auth.login("alice", "password2").await.is_ok());
        assert!(matches!(
            auth.login("alice", "password1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_change_password_wrong_old() {
        let auth = setup().await;
        let token = auth.register("alice", "password1").await.unwrap();
        let user = auth.verify_token(&token).await.unwrap();

        let result = auth.change_password(user.id, "wrong", "password2").await;
        assert!(matches!(result, Err(AuthError::OldPasswordIncorrect)));
        // Old credentials still work
        assert!(auth.login("alice", "password1").await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_to_username() {
        let auth = setup().await;
        let old_token = auth.register("alice", "password1").await.unwrap();
        let user = auth.verify_token(&old_token).await.unwrap();

        let plaintext = auth.reset_password(user.id).await.unwrap();
        assert_eq!(plaintext, "alice");

        assert!(auth.login("alice", "alice").await.is_ok());
        assert!(matches!(
            auth.verify_token(&old_token).await,
            Err(AuthError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn test_reset_password_on_deleted_user() {
        let auth = setup().await;
        let token = auth.register("alice", "password1").await.unwrap();
        let user = auth.verify_token(&token).await.unwrap();
        auth.delete_user(user.id).await.unwrap();

        // Administrative reset reaches soft-deleted records
        let plaintext = auth.reset_password(user.id).await.unwrap();
        assert_eq!(plaintext, "alice");
    }

    #[tokio::test]
    async fn test_deleted_user_cannot_login() {
        let auth = setup().await;
        let token = auth.register("alice", "password1").await.unwrap();
        let user = auth.verify_token(&token).await.unwrap();
        auth.delete_user(user.id).await.unwrap();

        assert!(matches!(
            auth.login("alice", "password1").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.verify_token(&token).await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let auth = setup().await;
        auth.register("alice", "password1").await.unwrap();

        let result = auth.register("alice", "password2").await;
        assert!(matches!(result, Err(AuthError::DuplicateUsername)));
    }

    #[tokio::test]
    async fn test_registration_disabled() {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let config = AuthConfig {
            registration_enabled: false,
            ..Default::default()
        };
        let auth = Authenticator::new(db, &config).unwrap();

        let result = auth.register("alice", "password1").await;
        assert!(matches!(result, Err(AuthError::RegistrationDisabled)));
    }

    #[tokio::test]
    async fn test_verify_token_garbage() {
        let auth = setup().await;
        let result = auth.verify_token("not-a-token").await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_username_reuse_after_delete() {
        let auth = setup().await;
        let token = auth.register("alice", "password1").await.unwrap();
        let old = auth.verify_token(&token).await.unwrap();
        auth.delete_user(old.id).await.unwrap();

        let new_token = auth.register("alice", "fresh-pass").await.unwrap();
        let reborn = auth.verify_token(&new_token).await.unwrap();
        assert_ne!(reborn.id, old.id);
        assert!(auth.login("alice", "fresh-pass").await.is_ok());
    }
}
