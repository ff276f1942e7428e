use super::{Database, Transaction};
use chrono::Utc;

pub async fn seed_development_data(db: &Database) {
    let mut data_tx = db.begin().await.unwrap();
    seed_test_user(&mut data_tx, 1, "approved").await;
    seed_test_user(&mut data_tx, 2, "approved").await;
    seed_test_pending(&mut data_tx, 3).await;
    data_tx.commit().await.unwrap();
}

async fn seed_test_user(data_tx: &mut Transaction, index: i64, status: &str) {
    let row = sqlx::query("SELECT id FROM users WHERE user_id = $1")
        .bind(format!("u_{:03}", index))
        .fetch_optional(&mut *data_tx)
        .await
        .unwrap();
    if row.is_some() {
        return;
    }
    sqlx::query(
        r#"INSERT INTO users (user_id, nick, email, wallet, network, total_paid, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
    )
    .bind(format!("u_{:03}", index))
    .bind(format!("tester-{}", index))
    .bind(format!("test-{}@user.net", index))
    .bind(format!("0x{:040x}", index))
    .bind("ERC20")
    .bind(0.0_f64)
    .bind(status)
    .execute(&mut *data_tx)
    .await
    .unwrap();
}

async fn seed_test_pending(data_tx: &mut Transaction, index: i64) {
    let row = sqlx::query("SELECT id FROM pending_users WHERE user_id = $1")
        .bind(format!("u_{:03}", index))
        .fetch_optional(&mut *data_tx)
        .await
        .unwrap();
    if row.is_some() {
        return;
    }
    sqlx::query(
        r#"INSERT INTO pending_users (user_id, nick, email, wallet, network, created)
            VALUES ($1, $2, $3, $4, $5, $6)"#,
    )
    .bind(format!("u_{:03}", index))
    .bind(format!("tester-{}", index))
    .bind(format!("test-{}@user.net", index))
    .bind(format!("T{:033x}", index))
    .bind("TRC20")
    .bind(Utc::now())
    .execute(&mut *data_tx)
    .await
    .unwrap();
}
