//! This library contains definitions for the API layer.

use app::database::Database;
use rocket::{Build, Rocket};
use state::RocketState;

mod access;
mod error;
mod rate_limit;
mod routes;
mod state;

pub use rate_limit::RateLimit;

pub fn register(
    rocket: Rocket<Build>,
    db: Database,
    auth: app::auth::Config,
    moderation_policy: app::moderation::DuplicatePolicy,
    rate_limit: RateLimit,
) -> Rocket<Build> {
    routes::register(
        rocket,
        RocketState {
            db,
            auth,
            moderation_policy,
            rate_limit,
        },
    )
}
