use okapi::openapi3::{Object, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket::{
    async_trait,
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};
use rocket_okapi::{
    gen::OpenApiGenerator,
    request::{OpenApiFromRequest, RequestHeaderInput},
};
use thiserror::Error;

use crate::state::RocketState;

/// Request guard proving the caller holds a live admin session. The token is
/// taken from the auth header, falling back to the session cookie set by the
/// login route.
pub struct AdminGuard(app::auth::AdminGrant);

impl AdminGuard {
    pub fn grant(&self) -> &app::auth::AdminGrant {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("access denied")]
    AccessDenied(#[from] app::auth::AccessDenied),
    #[error("rate limit exceeded")]
    RateLimited,
}

const TOKEN_HEADER: &str = "X-Auth-Token";
pub const SESSION_COOKIE: &str = "session";

fn token_from(req: &Request<'_>) -> Option<String> {
    req.headers()
        .get_one(TOKEN_HEADER)
        .map(ToOwned::to_owned)
        .or_else(|| req.cookies().get(SESSION_COOKIE).map(|c| c.value().to_owned()))
}

/// The raw session credential as presented, header first, then cookie.
/// Infallible; logout needs the token even when the session is already
/// expired.
pub struct SessionCredential(pub Option<String>);

#[async_trait]
impl<'r> FromRequest<'r> for SessionCredential {
    type Error = std::convert::Infallible;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(Self(token_from(req)))
    }
}

#[async_trait]
impl<'r> FromRequest<'r> for AdminGuard {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match token_from(req) {
            Some(token) => {
                let state = req.rocket().state::<RocketState>().unwrap();
                match app::auth::get_admin_grant(&state.db, &token).await {
                    Ok(grant) => {
                        if state.rate_limit.limit(grant.session_id) {
                            log::info!("rate limiting session {:?}", grant.session_id);
                            Outcome::Failure((Status::TooManyRequests, Error::RateLimited))
                        } else {
                            Outcome::Success(AdminGuard(grant))
                        }
                    }
                    Err(e) => Outcome::Failure((Status::Unauthorized, e.into())),
                }
            }
            None => Outcome::Failure((Status::Unauthorized, app::auth::AccessDenied.into())),
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for AdminGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(openapi_auth())
    }
}

fn openapi_auth() -> RequestHeaderInput {
    let security_scheme = SecurityScheme {
        description: Some(format!(
            "Requires an admin session token: \"{}\".",
            TOKEN_HEADER
        )),
        data: SecuritySchemeData::ApiKey {
            name: TOKEN_HEADER.to_owned(),
            location: "header".to_owned(),
        },
        extensions: Object::default(),
    };
    let mut security_req = SecurityRequirement::new();
    security_req.insert(TOKEN_HEADER.to_owned(), Vec::new());
    RequestHeaderInput::Security(TOKEN_HEADER.to_owned(), security_scheme, security_req)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::{Cookie, Header};
    use rocket::local::asynchronous::Client;
    use rocket::{get, routes};

    #[get("/credential")]
    fn credential(credential: SessionCredential) -> String {
        credential.0.unwrap_or_default()
    }

    async fn client() -> Client {
        Client::untracked(rocket::build().mount("/", routes![credential]))
            .await
            .unwrap()
    }

    #[rocket::async_test]
    async fn header_token_takes_precedence_over_cookie() {
        let client = client().await;
        let body = client
            .get("/credential")
            .header(Header::new(TOKEN_HEADER, "from-header"))
            .cookie(Cookie::new(SESSION_COOKIE, "from-cookie"))
            .dispatch()
            .await
            .into_string()
            .await
            .unwrap();
        assert_eq!(body, "from-header");
    }

    #[rocket::async_test]
    async fn cookie_token_is_used_when_no_header_is_present() {
        let client = client().await;
        let body = client
            .get("/credential")
            .cookie(Cookie::new(SESSION_COOKIE, "from-cookie"))
            .dispatch()
            .await
            .into_string()
            .await
            .unwrap();
        assert_eq!(body, "from-cookie");
    }
}
