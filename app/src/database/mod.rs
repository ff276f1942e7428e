use sqlx::postgres::PgPoolOptions;
use url::Url;

pub use migrations::run_migrations;
pub use seeder::seed_development_data;

mod migrations;
mod seeder;

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub(crate) type Transaction = sqlx::Transaction<'static, sqlx::Postgres>;

pub async fn connect(url: &Url) -> Database {
    PgPoolOptions::new().connect(url.as_str()).await.unwrap()
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CountRow {
    pub count: i64,
}

/// Postgres error code raised on unique-constraint violations. Modules that
/// insert into uniquely-constrained tables translate this into their own
/// conflict error.
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

/// Migrated connection for the database-backed tests, which are gated behind
/// `--ignored` and expect DATABASE_URL to point at a throwaway database.
#[cfg(test)]
pub(crate) async fn test_database() -> Database {
    let url: Url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must point at a test database")
        .parse()
        .unwrap();
    let db = connect(&url).await;
    run_migrations(&db).await;
    db
}
