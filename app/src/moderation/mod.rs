//! Bridges anonymous public submissions and the admin-controlled roster.
//! A submission stages a pending request; an admin later approves it into the
//! user registry or denies it, discarding the request.

use crate::{auth, database::Database, user};
use thiserror::Error;

mod entities;

pub use entities::{Approval, DuplicatePolicy, PendingRequest, SubmitOutcome, Submission};

#[derive(Debug, Error)]
pub enum Error {
    #[error("user already registered")]
    AlreadyRegistered,
    #[error("pending request not found")]
    NotFound,
}

/// Public, unauthenticated entry point. Stages the submission unless the
/// identity is already on the roster, in which case the configured
/// [`DuplicatePolicy`] decides between a hard conflict and a soft notice.
/// Resubmitting while pending overwrites the staged profile in place.
pub async fn submit(
    db: &Database,
    policy: DuplicatePolicy,
    submission: Submission,
) -> Result<SubmitOutcome, Error> {
    let mut data_tx = db.begin().await.unwrap();
    if user::exists_in_tx(&mut data_tx, &submission.user_id, &submission.email).await {
        return policy.on_duplicate();
    }
    queries::upsert(&mut data_tx, &submission).await;
    data_tx.commit().await.unwrap();
    Ok(SubmitOutcome::Staged)
}

pub async fn list(_grant: &auth::AdminGrant, db: &Database) -> Vec<PendingRequest> {
    queries::list(db).await
}

/// Materializes the pending request as an approved user and discards the
/// request, both within one transaction.
pub async fn approve(
    _grant: &auth::AdminGrant,
    db: &Database,
    id: &user::Id,
) -> Result<Approval, Error> {
    let mut data_tx = db.begin().await.unwrap();
    let pending = queries::get(&mut data_tx, id).await.ok_or(Error::NotFound)?;
    if user::exists_in_tx(&mut data_tx, &pending.user_id, &pending.email).await {
        queries::delete(&mut data_tx, id).await;
        data_tx.commit().await.unwrap();
        return Ok(Approval::AlreadyPresent);
    }
    match user::insert_in_tx(&mut data_tx, &pending.into_new_user()).await {
        Ok(user) => {
            queries::delete(&mut data_tx, id).await;
            data_tx.commit().await.unwrap();
            Ok(Approval::Created(user))
        }
        // Lost the identity race against a concurrent direct creation. The
        // failed insert aborted the transaction, so the request is discarded
        // in a fresh one.
        Err(_) => {
            drop(data_tx);
            let mut retry_tx = db.begin().await.unwrap();
            queries::delete(&mut retry_tx, id).await;
            retry_tx.commit().await.unwrap();
            Ok(Approval::AlreadyPresent)
        }
    }
}

/// Discards the pending request without creating a user.
pub async fn deny(_grant: &auth::AdminGrant, db: &Database, id: &user::Id) -> Result<(), Error> {
    let mut data_tx = db.begin().await.unwrap();
    if !queries::delete(&mut data_tx, id).await {
        return Err(Error::NotFound);
    }
    data_tx.commit().await.unwrap();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AdminGrant, SessionId};
    use crate::database;
    use crate::user::{NewUser, Status};
    use uuid::Uuid;

    fn grant() -> AdminGrant {
        AdminGrant {
            session_id: SessionId::default(),
        }
    }

    fn submission(user_id: &str, email: &str) -> Submission {
        Submission {
            user_id: user::Id(user_id.to_owned()),
            nick: "nick".to_owned(),
            email: email.to_owned(),
            wallet: "0xabc".to_owned(),
            network: "ERC20".to_owned(),
        }
    }

    // Needs a live Postgres at DATABASE_URL; run with: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn approval_of_an_already_registered_identity_discards_the_request() {
        let db = database::test_database().await;
        let uid = format!("u_{}", Uuid::new_v4().to_simple());
        submit(
            &db,
            DuplicatePolicy::Reject,
            submission(&uid, &format!("{}@example.com", uid)),
        )
        .await
        .unwrap();
        // A direct admin registration claims the identity before approval.
        crate::user::create(
            &grant(),
            &db,
            NewUser {
                user_id: user::Id(uid.clone()),
                nick: "nick".to_owned(),
                email: format!("{}-direct@example.com", uid),
                wallet: "0xabc".to_owned(),
                network: "ERC20".to_owned(),
                status: Status::Approved,
            },
        )
        .await
        .unwrap();
        let approval = approve(&grant(), &db, &user::Id(uid.clone())).await.unwrap();
        assert!(matches!(approval, Approval::AlreadyPresent));
        assert!(list(&grant(), &db)
            .await
            .iter()
            .all(|pending| pending.user_id.0 != uid));
    }
}

mod queries {
    use super::{PendingRequest, Submission};
    use crate::database::{self, Database};
    use crate::user;
    use chrono::{DateTime, Utc};
    use const_format::formatcp;

    const COLUMNS: &str = "id, user_id, nick, email, wallet, network, created";

    pub(super) async fn upsert(data_tx: &mut database::Transaction, submission: &Submission) {
        sqlx::query(
            r#"INSERT INTO pending_users (user_id, nick, email, wallet, network, created)
                VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (user_id) DO UPDATE SET
                nick = $2, email = $3, wallet = $4, network = $5"#,
        )
        .bind(&submission.user_id.0)
        .bind(&submission.nick)
        .bind(&submission.email)
        .bind(&submission.wallet)
        .bind(&submission.network)
        .bind(Utc::now())
        .execute(&mut *data_tx)
        .await
        .unwrap();
    }

    pub(super) async fn get(
        data_tx: &mut database::Transaction,
        id: &user::Id,
    ) -> Option<PendingRequest> {
        sqlx::query_as::<_, PendingRow>(formatcp!(
            "SELECT {} FROM pending_users WHERE user_id = $1",
            COLUMNS
        ))
        .bind(&id.0)
        .fetch_optional(&mut *data_tx)
        .await
        .unwrap()
        .map(|row| row.into_entity())
    }

    pub(super) async fn list(db: &Database) -> Vec<PendingRequest> {
        sqlx::query_as::<_, PendingRow>(formatcp!(
            "SELECT {} FROM pending_users ORDER BY id DESC",
            COLUMNS
        ))
        .fetch_all(db)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.into_entity())
        .collect()
    }

    pub(super) async fn delete(data_tx: &mut database::Transaction, id: &user::Id) -> bool {
        sqlx::query("DELETE FROM pending_users WHERE user_id = $1")
            .bind(&id.0)
            .execute(&mut *data_tx)
            .await
            .unwrap()
            .rows_affected()
            > 0
    }

    #[derive(sqlx::FromRow, Debug)]
    struct PendingRow {
        id: i64,
        user_id: String,
        nick: String,
        email: String,
        wallet: String,
        network: String,
        created: DateTime<Utc>,
    }

    impl PendingRow {
        fn into_entity(self) -> PendingRequest {
            PendingRequest {
                id: self.id,
                user_id: user::Id(self.user_id),
                nick: self.nick,
                email: self.email,
                wallet: self.wallet,
                network: self.network,
                created: self.created,
            }
        }
    }
}
