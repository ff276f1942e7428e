use app::database::Database;

use crate::rate_limit::RateLimit;

pub struct RocketState {
    pub db: Database,
    pub auth: app::auth::Config,
    pub moderation_policy: app::moderation::DuplicatePolicy,
    pub rate_limit: RateLimit,
}
