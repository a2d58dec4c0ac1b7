//! Console sign-in.
//!
//! Accounts live in a small JSON file next to the data directory. Passwords
//! are stored as bcrypt hashes and a successful login yields an HS256 token
//! carrying the username and role.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::AuthConfig;

pub const DEFAULT_ROLE: &str = "user";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Username '{0}' is already taken.")]
    Conflict(String),
    #[error("Invalid username or password.")]
    Unauthorized,
    #[error("Token has expired. Please log in again.")]
    Expired,
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("Token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
    #[error("User store error: {0}")]
    Store(#[from] io::Error),
    #[error("User store is unreadable: {0}")]
    Document(#[from] serde_json::Error),
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub role: String,
    pub iat: u64,
    pub exp: u64,
}

pub trait Authenticator {
    fn register(&mut self, username: &str, password: &str) -> AuthResult<()>;
    /// Returns a signed token on success.
    fn login(&self, username: &str, password: &str) -> AuthResult<String>;
    fn verify(&self, token: &str) -> AuthResult<Claims>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserEntry {
    password_hash: String,
    role: String,
}

/// bcrypt + HS256 authenticator backed by a JSON users file.
pub struct LocalAuthenticator {
    path: PathBuf,
    users: BTreeMap<String, UserEntry>,
    config: AuthConfig,
}

impl LocalAuthenticator {
    /// Opens the users file at `path`, starting empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>, config: AuthConfig) -> AuthResult<Self> {
        let path = path.into();
        let users = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, users, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.users)?)?;
        Ok(())
    }

    fn issue(&self, username: &str, role: &str) -> AuthResult<String> {
        let now = get_current_timestamp();
        let claims = Claims {
            username: username.to_string(),
            role: role.to_string(),
            iat: now,
            exp: now + self.config.token_ttl_secs,
        };
        let key = EncodingKey::from_secret(self.config.secret.as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(AuthError::Signing)
    }
}

impl Authenticator for LocalAuthenticator {
    fn register(&mut self, username: &str, password: &str) -> AuthResult<()> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Invalid("username and password are required".to_string()));
        }
        if self.users.contains_key(username) {
            return Err(AuthError::Conflict(username.to_string()));
        }
        let password_hash = bcrypt::hash(password, self.config.bcrypt_cost)?;
        self.users.insert(
            username.to_string(),
            UserEntry { password_hash, role: DEFAULT_ROLE.to_string() },
        );
        self.persist()?;
        info!(user = username, "user registered");
        Ok(())
    }

    fn login(&self, username: &str, password: &str) -> AuthResult<String> {
        let user = self.users.get(username.trim()).ok_or(AuthError::Unauthorized)?;
        if !bcrypt::verify(password, &user.password_hash)? {
            debug!(user = username, "password rejected");
            return Err(AuthError::Unauthorized);
        }
        self.issue(username.trim(), &user.role)
    }

    fn verify(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let key = DecodingKey::from_secret(self.config.secret.as_bytes());
        let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::Invalid(e.to_string()),
        })?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> AuthConfig {
        AuthConfig {
            secret: "test-secret".to_string(),
            bcrypt_cost: 4,
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_register_login_verify() {
        let dir = TempDir::new().unwrap();
        let mut auth = LocalAuthenticator::open(dir.path().join("users.json"), config()).unwrap();
        auth.register("alice", "s3cret").unwrap();

        let token = auth.login("alice", "s3cret").unwrap();
        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, DEFAULT_ROLE);
    }

    #[test]
    fn test_users_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("auth").join("users.json");
        let mut auth = LocalAuthenticator::open(&path, config()).unwrap();
        auth.register("alice", "s3cret").unwrap();

        let auth = LocalAuthenticator::open(&path, config()).unwrap();
        assert!(auth.login("alice", "s3cret").is_ok());
        let stored = fs::read_to_string(path).unwrap();
        assert!(!stored.contains("s3cret"));
    }

    #[test]
    fn test_rejections() {
        let dir = TempDir::new().unwrap();
        let mut auth = LocalAuthenticator::open(dir.path().join("users.json"), config()).unwrap();
        auth.register("alice", "s3cret").unwrap();

        assert!(matches!(auth.register("alice", "other"), Err(AuthError::Conflict(_))));
        assert!(matches!(auth.login("alice", "wrong"), Err(AuthError::Unauthorized)));
        assert!(matches!(auth.login("bob", "s3cret"), Err(AuthError::Unauthorized)));
        assert!(matches!(auth.verify("not-a-token"), Err(AuthError::Invalid(_))));
    }

    #[test]
    fn test_token_from_other_secret_is_invalid() {
        let dir = TempDir::new().unwrap();
        let mut auth = LocalAuthenticator::open(dir.path().join("users.json"), config()).unwrap();
        auth.register("alice", "s3cret").unwrap();
        let token = auth.login("alice", "s3cret").unwrap();

        let other = LocalAuthenticator::open(
            dir.path().join("users.json"),
            AuthConfig { secret: "another".to_string(), ..config() },
        )
        .unwrap();
        assert!(matches!(other.verify(&token), Err(AuthError::Invalid(_))));
    }

    #[test]
    fn test_expired_token() {
        let dir = TempDir::new().unwrap();
        let auth = LocalAuthenticator::open(dir.path().join("users.json"), config()).unwrap();
        let now = get_current_timestamp();
        let claims = Claims { username: "alice".into(), role: DEFAULT_ROLE.into(), iat: now - 120, exp: now - 60 };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(auth.verify(&token), Err(AuthError::Expired)));
    }
}
