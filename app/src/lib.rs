pub mod auth;
pub mod database;
mod hex;
pub mod ledger;
pub mod moderation;
pub mod money;
pub mod seconds;
pub mod user;
