//! User registration input and the user repository collaborator.

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use regex::Regex;
use serde::Deserialize;
use tracing::info;

/// Maximum nickname length in characters.
pub const MAX_NICKNAME_CHARS: usize = 20;

/// Minimum password length in characters.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Maximum password length in characters.
pub const MAX_PASSWORD_CHARS: usize = 24;

/// Errors from user validation and storage.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Registration input failed validation.
    #[error("{0}")]
    Invalid(String),

    /// A user with the same email or phone already exists.
    #[error("user already exists: {0}")]
    Duplicate(String),

    /// Storage backend failure.
    #[error("user storage error: {0}")]
    Storage(String),
}

/// Registration payload. Every field but the password may be empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewUser {
    #[serde(alias = "Nickname")]
    pub nickname: String,
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(alias = "Phone")]
    pub phone: String,
    #[serde(alias = "Password")]
    pub password: String,
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

fn cellphone_regex() -> &'static Regex {
    static CELLPHONE: OnceLock<Regex> = OnceLock::new();
    CELLPHONE.get_or_init(|| Regex::new(r"^1[3-9][0-9]{9}$").expect("cellphone pattern is valid"))
}

impl NewUser {
    /// Check field constraints.
    pub fn validate(&self) -> Result<(), UserError> {
        if self.nickname.chars().count() > MAX_NICKNAME_CHARS {
            return Err(UserError::Invalid(format!(
                "nickname must be at most {MAX_NICKNAME_CHARS} characters"
            )));
        }

        if !self.email.is_empty() && !email_regex().is_match(&self.email) {
            return Err(UserError::Invalid(format!("invalid email: {}", self.email)));
        }

        if !self.phone.is_empty() && !cellphone_regex().is_match(&self.phone) {
            return Err(UserError::Invalid(format!("invalid phone: {}", self.phone)));
        }

        if self.password.is_empty() {
            return Err(UserError::Invalid("password is required".to_string()));
        }

        let len = self.password.chars().count();
        if !(MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&len) {
            return Err(UserError::Invalid(format!(
                "password must be {MIN_PASSWORD_CHARS} to {MAX_PASSWORD_CHARS} characters"
            )));
        }

        Ok(())
    }
}

/// A stored user.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: u64,
    pub nickname: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Check a plaintext password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        PasswordHash::new(&self.password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

/// Persistence for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new, already validated user.
    async fn add_user(&self, user: NewUser) -> Result<UserRecord, UserError>;
}

/// User repository held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Whether no users are stored.
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    /// Find a user by email.
    pub fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        self.users
            .read()
            .iter()
            .find(|u| !u.email.is_empty() && u.email == email)
            .cloned()
    }

    fn conflict(&self, user: &NewUser) -> Option<String> {
        self.users.read().iter().find_map(|existing| {
            if !user.email.is_empty() && existing.email == user.email {
                Some(format!("email {}", user.email))
            } else if !user.phone.is_empty() && existing.phone == user.phone {
                Some(format!("phone {}", user.phone))
            } else {
                None
            }
        })
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn add_user(&self, user: NewUser) -> Result<UserRecord, UserError> {
        if let Some(conflict) = self.conflict(&user) {
            return Err(UserError::Duplicate(conflict));
        }

        let password = user.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| UserError::Storage(e.to_string()))??;

        let mut users = self.users.write();
        // Re-check: another registration may have landed while hashing.
        if users.iter().any(|existing| {
            (!user.email.is_empty() && existing.email == user.email)
                || (!user.phone.is_empty() && existing.phone == user.phone)
        }) {
            return Err(UserError::Duplicate(format!(
                "email {} / phone {}",
                user.email, user.phone
            )));
        }

        let record = UserRecord {
            id: users.len() as u64 + 1,
            nickname: user.nickname,
            email: user.email,
            phone: user.phone,
            password_hash,
            created_at: Utc::now(),
        };
        users.push(record.clone());

        info!(user_id = record.id, "User registered");
        Ok(record)
    }
}

/// Hash a password with Argon2 and a random salt.
fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::Storage(e.to_string()))
}
