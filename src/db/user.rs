//! User model for studyhall.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::query::SoftDeleteEntity;

/// User role.
///
/// The first-ever live registration is bootstrapped as `Teacher`; every
/// later one is `Student`. Roles are administrator-mutable afterwards via
/// [`super::UserRepository::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    /// Regular student account.
    #[default]
    Student,
    /// Teacher (administrative) account.
    Teacher,
}

impl Role {
    /// Convert role to its database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// A stored user record, including password material.
///
/// Never hand this to a presentation layer directly; convert to
/// [`UserInfo`] at the boundary.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    /// Unique user ID, never reused.
    pub id: i64,
    /// Login username, unique among non-deleted records.
    pub username: String,
    /// Opaque verifier salt.
    pub password_salt: String,
    /// Opaque verifier hash.
    pub password_hash: String,
    /// User role.
    pub role: Role,
    /// Token-invalidation counter; bumped by 1 on every password change.
    pub version: i64,
    /// Administrative lock, independent of soft delete.
    pub is_disabled: bool,
    /// Soft-delete marker.
    pub is_deleted: bool,
    /// Creation timestamp (ms since epoch).
    pub created_at: i64,
    /// Display nickname.
    pub nickname: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Self-introduction text.
    pub bio: Option<String>,
}

impl UserRecord {
    /// Check if this user holds the teacher role.
    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }
}

impl SoftDeleteEntity for UserRecord {
    const TABLE: &'static str = "users";
    const NAME: &'static str = "user";
    const SEARCH_COLUMNS: &'static [&'static str] = &["username", "nickname"];
    const HAS_ROLE: bool = true;
}

/// Public view of a user, safe to return across the library boundary.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub is_disabled: bool,
    pub created_at: i64,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

impl From<UserRecord> for UserInfo {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            is_disabled: user.is_disabled,
            created_at: user.created_at,
            nickname: user.nickname,
            avatar_url: user.avatar_url,
            bio: user.bio,
        }
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Pre-hashed password material.
    pub password_hash: String,
    /// Salt the hash was derived with.
    pub password_salt: String,
    /// Explicit role. `None` applies the bootstrap policy: teacher when no
    /// live users exist at creation time, student otherwise.
    pub role: Option<Role>,
    /// Optional display nickname.
    pub nickname: Option<String>,
}

impl NewUser {
    /// Create a new user with the required fields.
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        password_salt: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            password_salt: password_salt.into(),
            role: None,
            nickname: None,
        }
    }

    /// Set an explicit role, bypassing the bootstrap policy.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Set the nickname.
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }
}

/// Data for updating an existing user's profile.
///
/// Password material, the version counter, and the disabled/deleted flags
/// are deliberately absent: only the session authenticator writes those,
/// through dedicated repository methods.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New nickname.
    pub nickname: Option<String>,
    /// New avatar URL.
    pub avatar_url: Option<String>,
    /// New bio text.
    pub bio: Option<String>,
    /// New role (administrative).
    pub role: Option<Role>,
}

impl UserUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new nickname.
    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    /// Set new avatar URL.
    pub fn avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// Set new bio.
    pub fn bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    /// Set new role.
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.nickname.is_none()
            && self.avatar_url.is_none()
            && self.bio.is_none()
            && self.role.is_none()
    }
}
