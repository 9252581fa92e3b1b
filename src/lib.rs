//! STUDYHALL - Classroom record keeping
//!
//! A classroom record-keeping library: user accounts with session
//! authentication, exercises, submitted solutions, and announcements,
//! all over a local SQLite store with soft-deleted records.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;

pub use auth::{
    Argon2Scheme, AuthError, Authenticator, JwtCodec, LockoutStatus, LockoutTracker,
    PasswordError, PasswordVerifier, TokenClaims, TokenCodec, TokenError,
};
pub use config::{AuthConfig, Config, DatabaseConfig, LoggingConfig};
pub use db::{
    AnnouncementRecord, AnnouncementRepository, AnnouncementUpdate, Database, ExerciseMedia,
    ExerciseRecord, ExerciseRepository, ExerciseUpdate, ListOptions, MediaKind, NewAnnouncement,
    NewExercise, NewSolution, NewUser, Page, Role, SolutionRecord, SolutionRepository,
    SolutionStatus, SolutionUpdate, UserInfo, UserRecord, UserRepository, UserUpdate,
};
pub use error::{Error, Result};
