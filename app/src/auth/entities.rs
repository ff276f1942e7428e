//! Handles admin authentication and session credentials. There is a single
//! admin identity, injected as [`Config`] at process start. Authentication is
//! proven by possession of an opaque session token; authorization for admin
//! operations is proven by possession of an [`AdminGrant`].

use crate::hex::Hex;
use crate::seconds::Seconds;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::Digest;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("access denied")]
pub struct AccessDenied;

/// The single-admin credential block, read once from process configuration.
/// The password is stored as a bcrypt hash; an empty hash fails closed.
#[derive(Debug, Clone)]
pub struct Config {
    pub email: String,
    pub password_hash: String,
    pub session_ttl: Seconds,
}

impl Config {
    pub(crate) fn verify_credentials(&self, email: &str, password: &str) -> bool {
        if email != self.email || self.password_hash.is_empty() {
            return false;
        }
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

/// This grant represents a compile-time proof that the caller holds a live
/// admin session.
#[derive(Debug, Clone, Copy)]
pub struct AdminGrant {
    pub session_id: SessionId,
}

/// The opaque credential handed to the admin client. Only its hash is
/// persisted.
pub struct SessionToken(String);

impl SessionToken {
    /// 32 random bytes, hex encoded. The entropy is what makes an unsalted
    /// fast hash acceptable for storage, same as any machine-generated API
    /// token.
    pub(crate) fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(Hex::encode(&bytes).as_str().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A SHA-256 hash of a session token.
pub struct TokenHash(Hex);

impl TokenHash {
    pub(crate) fn generate(token: &str) -> Self {
        let mut hasher = sha2::Sha256::new();
        hasher.update(token);
        let sha = hasher.finalize();
        Self(Hex::encode(&sha))
    }

    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[derive(Debug)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) created: DateTime<Utc>,
    pub(crate) expires: DateTime<Utc>,
}

impl Session {
    pub(crate) fn create(ttl: Seconds) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId(Uuid::new_v4()),
            created: now,
            expires: now + Duration::seconds(ttl.0),
        }
    }

    pub(crate) fn admin_grant(&self, now: DateTime<Utc>) -> Result<AdminGrant, AccessDenied> {
        if now < self.expires {
            Ok(AdminGrant {
                session_id: self.id,
            })
        } else {
            Err(AccessDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(hash: &str) -> Config {
        Config {
            email: "admin@example.com".to_owned(),
            password_hash: hash.to_owned(),
            session_ttl: Seconds(60),
        }
    }

    #[test]
    fn credentials_verify_against_bcrypt_hash() {
        let hash = bcrypt::hash("hunter2", 4).unwrap();
        let config = config(&hash);
        assert!(config.verify_credentials("admin@example.com", "hunter2"));
        assert!(!config.verify_credentials("admin@example.com", "wrong"));
        assert!(!config.verify_credentials("other@example.com", "hunter2"));
    }

    #[test]
    fn empty_hash_fails_closed() {
        assert!(!config("").verify_credentials("admin@example.com", ""));
    }

    #[test]
    fn tokens_are_long_and_unique() {
        let a = SessionToken::generate();
        let b = SessionToken::generate();
        assert_eq!(a.as_str().len(), 64);
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn token_hash_is_deterministic() {
        let a = TokenHash::generate("token");
        let b = TokenHash::generate("token");
        let c = TokenHash::generate("other");
        assert_eq!(a.as_str(), b.as_str());
        assert_ne!(a.as_str(), c.as_str());
    }

    #[test]
    fn session_grant_respects_expiry() {
        let session = Session::create(Seconds(60));
        assert!(session.admin_grant(Utc::now()).is_ok());
        let later = Utc::now() + Duration::seconds(61);
        assert!(session.admin_grant(later).is_err());
    }
}
