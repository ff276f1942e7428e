use super::{Migration, SimpleSqlMigration};

pub fn migration() -> impl Migration {
    SimpleSqlMigration {
        serial_number: 0,
        sql: vec![
            // user_id is the external, caller-assigned key; id only orders
            // listings. Both user_id and email are unique across the roster.
            r#"
            CREATE TABLE users (
                id BIGSERIAL PRIMARY KEY,
                user_id TEXT UNIQUE NOT NULL,
                nick TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                wallet TEXT NOT NULL,
                network TEXT NOT NULL,
                total_paid DOUBLE PRECISION NOT NULL DEFAULT 0,
                status TEXT NOT NULL
            )"#,
            r#"CREATE INDEX user_status ON users (status)"#,
            // Staged public registrations. Unique on user_id only; a
            // resubmission overwrites the staged profile.
            r#"
            CREATE TABLE pending_users (
                id BIGSERIAL PRIMARY KEY,
                user_id TEXT UNIQUE NOT NULL,
                nick TEXT NOT NULL,
                email TEXT NOT NULL,
                wallet TEXT NOT NULL,
                network TEXT NOT NULL,
                created TIMESTAMP WITH TIME ZONE NOT NULL
            )"#,
            // Append-only ledger. user_id is a weak reference on purpose:
            // deleting a user keeps their payout history, and tx_hash carries
            // no uniqueness constraint.
            r#"
            CREATE TABLE tx_logs (
                id BIGSERIAL PRIMARY KEY,
                user_id TEXT NOT NULL,
                amount DOUBLE PRECISION NOT NULL,
                status TEXT NOT NULL,
                tx_hash TEXT NOT NULL,
                network TEXT NOT NULL,
                created TIMESTAMP WITH TIME ZONE NOT NULL,
                meta TEXT
            )"#,
            r#"CREATE INDEX tx_log_user_id ON tx_logs (user_id)"#,
            r#"
            CREATE TABLE sessions (
                id UUID PRIMARY KEY,
                token_hash TEXT UNIQUE NOT NULL,
                created TIMESTAMP WITH TIME ZONE NOT NULL,
                expires TIMESTAMP WITH TIME ZONE NOT NULL
            )"#,
        ],
    }
}
