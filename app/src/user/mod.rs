use crate::{auth, database::Database};
use thiserror::Error;

mod entities;

pub use entities::{Id, InvalidStatus, NewUser, Status, User};

#[derive(Debug, Error)]
pub enum Error {
    #[error("user id or email already registered")]
    AlreadyExists,
    #[error("user not found")]
    NotFound,
}

/// Filter for [`list`]. The text query matches case-insensitive substrings of
/// user id, nick, email and wallet.
#[derive(Debug, Default)]
pub struct Filter {
    pub query: Option<String>,
    pub status: Option<Status>,
}

pub async fn create(
    _grant: &auth::AdminGrant,
    db: &Database,
    new: NewUser,
) -> Result<User, Error> {
    let mut data_tx = db.begin().await.unwrap();
    if queries::exists(&mut data_tx, &new.user_id, &new.email).await {
        return Err(Error::AlreadyExists);
    }
    let user = queries::insert(&mut data_tx, &new).await?;
    data_tx.commit().await.unwrap();
    Ok(user)
}

pub async fn get(_grant: &auth::AdminGrant, db: &Database, id: &Id) -> Option<User> {
    queries::get(db, id).await
}

pub async fn list(_grant: &auth::AdminGrant, db: &Database, filter: Filter) -> Vec<User> {
    queries::list(db, filter).await
}

pub async fn update_status(
    _grant: &auth::AdminGrant,
    db: &Database,
    id: &Id,
    status: Status,
) -> Result<User, Error> {
    queries::update_status(db, id, status)
        .await
        .ok_or(Error::NotFound)
}

/// Hard delete. Historical ledger entries referencing the user are kept as an
/// audit trail.
pub async fn delete(_grant: &auth::AdminGrant, db: &Database, id: &Id) -> Result<(), Error> {
    if queries::delete(db, id).await {
        Ok(())
    } else {
        Err(Error::NotFound)
    }
}

pub(crate) use queries::{apply_payment, exists as exists_in_tx, get_for_update, insert as insert_in_tx};

mod queries {
    use super::{Error, Filter, Id, NewUser, Status, User};
    use crate::database::{self, Database};
    use crate::money::Amount;
    use const_format::formatcp;

    const COLUMNS: &str = "id, user_id, nick, email, wallet, network, total_paid, status";

    pub(crate) async fn exists(
        data_tx: &mut database::Transaction,
        user_id: &Id,
        email: &str,
    ) -> bool {
        sqlx::query("SELECT id FROM users WHERE user_id = $1 OR email = $2")
            .bind(&user_id.0)
            .bind(email)
            .fetch_optional(&mut *data_tx)
            .await
            .unwrap()
            .is_some()
    }

    /// Inserts a roster row. A unique violation means a concurrent writer won
    /// the identity race; it surfaces as the same conflict the pre-check
    /// reports.
    pub(crate) async fn insert(
        data_tx: &mut database::Transaction,
        new: &NewUser,
    ) -> Result<User, Error> {
        let result = sqlx::query_as::<_, UserRow>(formatcp!(
            r#"INSERT INTO users (user_id, nick, email, wallet, network, total_paid, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}"#,
            COLUMNS
        ))
        .bind(&new.user_id.0)
        .bind(&new.nick)
        .bind(&new.email)
        .bind(&new.wallet)
        .bind(&new.network)
        .bind(0.0_f64)
        .bind(new.status.as_str())
        .fetch_one(&mut *data_tx)
        .await;
        match result {
            Ok(row) => Ok(row.into_entity()),
            Err(ref e) if database::is_unique_violation(e) => Err(Error::AlreadyExists),
            Err(e) => panic!("failed to insert user: {:?}", e),
        }
    }

    pub(super) async fn get(db: &Database, id: &Id) -> Option<User> {
        sqlx::query_as::<_, UserRow>(formatcp!(
            "SELECT {} FROM users WHERE user_id = $1",
            COLUMNS
        ))
        .bind(&id.0)
        .fetch_optional(db)
        .await
        .unwrap()
        .map(|row| row.into_entity())
    }

    /// Row-locked read used by the ledger's strict payout path. The lock is
    /// held until the surrounding transaction commits, so the user cannot be
    /// deleted mid-payout.
    pub(crate) async fn get_for_update(
        data_tx: &mut database::Transaction,
        id: &Id,
    ) -> Option<User> {
        sqlx::query_as::<_, UserRow>(formatcp!(
            "SELECT {} FROM users WHERE user_id = $1 FOR UPDATE",
            COLUMNS
        ))
        .bind(&id.0)
        .fetch_optional(&mut *data_tx)
        .await
        .unwrap()
        .map(|row| row.into_entity())
    }

    pub(super) async fn list(db: &Database, filter: Filter) -> Vec<User> {
        let like = filter.query.map(|q| format!("%{}%", q));
        let rows = match (like, filter.status) {
            (Some(like), Some(status)) => {
                sqlx::query_as::<_, UserRow>(formatcp!(
                    r#"SELECT {} FROM users
                        WHERE (user_id ILIKE $1 OR nick ILIKE $1 OR email ILIKE $1 OR wallet ILIKE $1)
                        AND status = $2 ORDER BY id DESC"#,
                    COLUMNS
                ))
                .bind(like)
                .bind(status.as_str())
                .fetch_all(db)
                .await
            }
            (Some(like), None) => {
                sqlx::query_as::<_, UserRow>(formatcp!(
                    r#"SELECT {} FROM users
                        WHERE user_id ILIKE $1 OR nick ILIKE $1 OR email ILIKE $1 OR wallet ILIKE $1
                        ORDER BY id DESC"#,
                    COLUMNS
                ))
                .bind(like)
                .fetch_all(db)
                .await
            }
            (None, Some(status)) => {
                sqlx::query_as::<_, UserRow>(formatcp!(
                    "SELECT {} FROM users WHERE status = $1 ORDER BY id DESC",
                    COLUMNS
                ))
                .bind(status.as_str())
                .fetch_all(db)
                .await
            }
            (None, None) => {
                sqlx::query_as::<_, UserRow>(formatcp!(
                    "SELECT {} FROM users ORDER BY id DESC",
                    COLUMNS
                ))
                .fetch_all(db)
                .await
            }
        };
        rows.unwrap().into_iter().map(|row| row.into_entity()).collect()
    }

    pub(super) async fn update_status(db: &Database, id: &Id, status: Status) -> Option<User> {
        sqlx::query_as::<_, UserRow>(formatcp!(
            "UPDATE users SET status = $1 WHERE user_id = $2 RETURNING {}",
            COLUMNS
        ))
        .bind(status.as_str())
        .bind(&id.0)
        .fetch_optional(db)
        .await
        .unwrap()
        .map(|row| row.into_entity())
    }

    pub(super) async fn delete(db: &Database, id: &Id) -> bool {
        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(&id.0)
            .execute(db)
            .await
            .unwrap()
            .rows_affected()
            > 0
    }

    /// Atomic balance increment, invoked by the ledger once per success-status
    /// entry, inside the same transaction as the ledger insert. The increment
    /// happens in SQL so concurrent postings cannot lose updates. Returns the
    /// updated total, or `None` when no roster row matches.
    pub(crate) async fn apply_payment(
        data_tx: &mut database::Transaction,
        id: &Id,
        amount: Amount,
    ) -> Option<Amount> {
        sqlx::query_as::<_, TotalRow>(
            "UPDATE users SET total_paid = total_paid + $1 WHERE user_id = $2 RETURNING total_paid",
        )
        .bind(amount.0)
        .bind(&id.0)
        .fetch_optional(&mut *data_tx)
        .await
        .unwrap()
        .map(|row| Amount(row.total_paid))
    }

    #[derive(sqlx::FromRow, Debug)]
    struct UserRow {
        id: i64,
        user_id: String,
        nick: String,
        email: String,
        wallet: String,
        network: String,
        total_paid: f64,
        status: String,
    }

    #[derive(sqlx::FromRow, Debug)]
    struct TotalRow {
        total_paid: f64,
    }

    impl UserRow {
        fn into_entity(self) -> User {
            User {
                id: self.id,
                user_id: Id(self.user_id),
                nick: self.nick,
                email: self.email,
                wallet: self.wallet,
                network: self.network,
                total_paid: Amount(self.total_paid),
                status: Status::parse(&self.status)
                    .unwrap_or_else(|e| unreachable!("corrupt status in storage: {}", e)),
            }
        }
    }
}
