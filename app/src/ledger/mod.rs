//! The append-only transaction ledger and its effect on roster balances.
//! There are two write variants: [`log`], which tolerates entries for users
//! that are not on the roster, and [`pay`], which requires an existing,
//! approved user. Both append the entry and the conditional balance increment
//! inside a single database transaction.

use crate::{auth, database::Database, money::Amount, user};

mod entities;

pub use entities::{Draft, Entry, Error, InvalidTxStatus, Status, TxHash};

use entities::NewEntry;

/// The result of the strict payout variant: the appended entry plus the
/// user's running total after the write.
#[derive(Debug)]
pub struct Payout {
    pub entry: Entry,
    pub total_paid: Amount,
}

/// Tolerant write variant. The referenced user may be absent from the roster;
/// the entry is recorded either way and the balance update is simply skipped
/// for unknown users.
pub async fn log(_grant: &auth::AdminGrant, db: &Database, draft: Draft) -> Result<Entry, Error> {
    let new = NewEntry::create(draft)?;
    let mut data_tx = db.begin().await.unwrap();
    let entry = queries::insert(&mut data_tx, &new).await;
    if entry.status == Status::Success
        && user::apply_payment(&mut data_tx, &entry.user_id, entry.amount)
            .await
            .is_none()
    {
        log::info!(
            "ledger entry {} references unknown user {:?}, balance update skipped",
            entry.id,
            entry.user_id
        );
    }
    data_tx.commit().await.unwrap();
    Ok(entry)
}

/// Strict write variant. The referenced user must exist and be approved for
/// payouts. The user row is read with a row lock inside the write
/// transaction, so the roster cannot change between the eligibility check and
/// the append.
pub async fn pay(_grant: &auth::AdminGrant, db: &Database, draft: Draft) -> Result<Payout, Error> {
    let mut data_tx = db.begin().await.unwrap();
    let user = user::get_for_update(&mut data_tx, &draft.user_id)
        .await
        .ok_or(Error::UserNotFound)?;
    if user.status != user::Status::Approved {
        return Err(Error::NotEligible);
    }
    let new = NewEntry::create(draft)?;
    let entry = queries::insert(&mut data_tx, &new).await;
    let total_paid = if entry.status == Status::Success {
        user::apply_payment(&mut data_tx, &entry.user_id, entry.amount)
            .await
            .unwrap_or(user.total_paid)
    } else {
        user.total_paid
    };
    data_tx.commit().await.unwrap();
    Ok(Payout { entry, total_paid })
}

/// Full payout history for a user, most recent first. Unknown users simply
/// have no history.
pub async fn list_by_user(_grant: &auth::AdminGrant, db: &Database, id: &user::Id) -> Vec<Entry> {
    queries::list_by_user(db, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AdminGrant, SessionId};
    use crate::database;
    use crate::user::NewUser;
    use uuid::Uuid;

    fn grant() -> AdminGrant {
        AdminGrant {
            session_id: SessionId::default(),
        }
    }

    fn draft(uid: &str, amount: f64) -> Draft {
        Draft {
            user_id: user::Id(uid.to_owned()),
            amount: Amount(amount),
            status: None,
            tx_hash: None,
            network: "ERC20".to_owned(),
            meta: None,
        }
    }

    async fn register(db: &Database, uid: &str, status: user::Status) {
        user::create(
            &grant(),
            db,
            NewUser {
                user_id: user::Id(uid.to_owned()),
                nick: "nick".to_owned(),
                email: format!("{}@example.com", uid),
                wallet: "0xabc".to_owned(),
                network: "ERC20".to_owned(),
                status,
            },
        )
        .await
        .unwrap();
    }

    // Needs a live Postgres at DATABASE_URL; run with: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn pay_rejects_missing_and_unapproved_users() {
        let db = database::test_database().await;
        let missing = format!("u_{}", Uuid::new_v4().to_simple());
        assert!(matches!(
            pay(&grant(), &db, draft(&missing, 10.0)).await,
            Err(Error::UserNotFound)
        ));

        let uid = format!("u_{}", Uuid::new_v4().to_simple());
        register(&db, &uid, user::Status::Pending).await;
        assert!(matches!(
            pay(&grant(), &db, draft(&uid, 10.0)).await,
            Err(Error::NotEligible)
        ));
        assert!(list_by_user(&grant(), &db, &user::Id(uid)).await.is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn pay_increments_the_running_total() {
        let db = database::test_database().await;
        let uid = format!("u_{}", Uuid::new_v4().to_simple());
        register(&db, &uid, user::Status::Approved).await;

        let payout = pay(&grant(), &db, draft(&uid, 10.0)).await.unwrap();
        assert_eq!(payout.total_paid.0, 10.0);
        let payout = pay(&grant(), &db, draft(&uid, 2.5)).await.unwrap();
        assert_eq!(payout.total_paid.0, 12.5);
    }
}

mod queries {
    use super::{Entry, NewEntry, Status, TxHash};
    use crate::database::{self, Database};
    use crate::money::Amount;
    use crate::user;
    use chrono::{DateTime, Utc};
    use const_format::formatcp;

    const COLUMNS: &str = "id, user_id, amount, status, tx_hash, network, created, meta";

    pub(super) async fn insert(data_tx: &mut database::Transaction, new: &NewEntry) -> Entry {
        sqlx::query_as::<_, EntryRow>(formatcp!(
            r#"INSERT INTO tx_logs (user_id, amount, status, tx_hash, network, created, meta)
                VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}"#,
            COLUMNS
        ))
        .bind(&new.user_id.0)
        .bind(new.amount.0)
        .bind(new.status.as_str())
        .bind(&new.tx_hash.0)
        .bind(&new.network)
        .bind(new.created)
        .bind(&new.meta)
        .fetch_one(&mut *data_tx)
        .await
        .unwrap()
        .into_entity()
    }

    pub(super) async fn list_by_user(db: &Database, id: &user::Id) -> Vec<Entry> {
        sqlx::query_as::<_, EntryRow>(formatcp!(
            "SELECT {} FROM tx_logs WHERE user_id = $1 ORDER BY id DESC",
            COLUMNS
        ))
        .bind(&id.0)
        .fetch_all(db)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.into_entity())
        .collect()
    }

    #[derive(sqlx::FromRow, Debug)]
    struct EntryRow {
        id: i64,
        user_id: String,
        amount: f64,
        status: String,
        tx_hash: String,
        network: String,
        created: DateTime<Utc>,
        meta: Option<String>,
    }

    impl EntryRow {
        fn into_entity(self) -> Entry {
            Entry {
                id: self.id,
                user_id: user::Id(self.user_id),
                amount: Amount(self.amount),
                status: Status::parse(&self.status)
                    .unwrap_or_else(|e| unreachable!("corrupt status in storage: {}", e)),
                tx_hash: TxHash(self.tx_hash),
                network: self.network,
                created: self.created,
                meta: self.meta,
            }
        }
    }
}
