use std::time::Duration;

use app::database::{self, run_migrations, seed_development_data};
use app::seconds::Seconds;
use rocket::{launch, Build, Rocket};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct Config {
    database_url: Url,
    admin: AdminConfig,
    moderation: ModerationConfig,
    rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize)]
struct AdminConfig {
    email: String,
    password_hash: String,
    session_ttl_secs: i64,
}

impl AdminConfig {
    fn into_auth_config(self) -> app::auth::Config {
        app::auth::Config {
            email: self.email,
            password_hash: self.password_hash,
            session_ttl: Seconds(self.session_ttl_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModerationConfig {
    /// "reject" for a hard conflict on duplicate public submissions,
    /// "acknowledge" for a soft success reporting the user is already on file.
    duplicate_submit: String,
}

impl ModerationConfig {
    fn into_policy(self) -> app::moderation::DuplicatePolicy {
        match self.duplicate_submit.as_str() {
            "reject" => app::moderation::DuplicatePolicy::Reject,
            "acknowledge" => app::moderation::DuplicatePolicy::Acknowledge,
            other => panic!("unknown moderation.duplicate_submit value {:?}", other),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RateLimitConfig {
    limit: usize,
    span: Duration,
}

impl RateLimitConfig {
    fn into_rate_limit(self) -> api::RateLimit {
        api::RateLimit::new(self.limit, self.span)
    }
}

#[launch]
async fn rocket() -> _ {
    start_server().await
}

async fn start_server() -> Rocket<Build> {
    env_logger::init();

    let rocket = Rocket::build();
    let config: Config = rocket.figment().extract().unwrap();

    let db = database::connect(&config.database_url).await;

    run_migrations(&db).await;
    #[cfg(debug_assertions)]
    seed_development_data(&db).await;

    api::register(
        rocket,
        db,
        config.admin.into_auth_config(),
        config.moderation.into_policy(),
        config.rate_limit.into_rate_limit(),
    )
}
