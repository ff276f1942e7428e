use crate::database::Database;
use chrono::Utc;

mod entities;

pub use entities::{AccessDenied, AdminGrant, Config, SessionId, SessionToken, TokenHash};

/// Verifies the admin credential and opens a new session. The returned token
/// is the only copy; the database keeps its hash.
pub async fn login(
    db: &Database,
    config: &Config,
    email: &str,
    password: &str,
) -> Result<SessionToken, AccessDenied> {
    if !config.verify_credentials(email, password) {
        return Err(AccessDenied);
    }
    let token = SessionToken::generate();
    let session = entities::Session::create(config.session_ttl);
    queries::insert(db, &session, &TokenHash::generate(token.as_str())).await;
    Ok(token)
}

pub async fn get_admin_grant(db: &Database, token: &str) -> Result<AdminGrant, AccessDenied> {
    queries::get(db, &TokenHash::generate(token))
        .await
        .ok_or(AccessDenied)?
        .admin_grant(Utc::now())
}

/// Drops the session behind the token. Unknown tokens are ignored so that
/// logout stays idempotent.
pub async fn logout(db: &Database, token: &str) {
    queries::delete(db, &TokenHash::generate(token)).await;
}

mod queries {
    use super::entities::Session;
    use super::{SessionId, TokenHash};
    use crate::database::Database;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    pub(super) async fn insert(db: &Database, session: &Session, token_hash: &TokenHash) {
        sqlx::query(
            "INSERT INTO sessions (id, token_hash, created, expires) VALUES ($1, $2, $3, $4)",
        )
        .bind(session.id.0)
        .bind(token_hash.as_str())
        .bind(session.created)
        .bind(session.expires)
        .execute(db)
        .await
        .unwrap();
    }

    pub(super) async fn get(db: &Database, token_hash: &TokenHash) -> Option<Session> {
        sqlx::query_as::<_, SessionRow>(
            "SELECT id, created, expires FROM sessions WHERE token_hash = $1",
        )
        .bind(token_hash.as_str())
        .fetch_optional(db)
        .await
        .unwrap()
        .map(|row| row.into_entity())
    }

    pub(super) async fn delete(db: &Database, token_hash: &TokenHash) {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash.as_str())
            .execute(db)
            .await
            .unwrap();
    }

    #[derive(Debug, sqlx::FromRow)]
    struct SessionRow {
        id: Uuid,
        created: DateTime<Utc>,
        expires: DateTime<Utc>,
    }

    impl SessionRow {
        fn into_entity(self) -> Session {
            Session {
                id: SessionId(self.id),
                created: self.created,
                expires: self.expires,
            }
        }
    }
}
