//! Admin session routes: login, logout and a session probe.

use rocket::{
    get,
    http::{Cookie, CookieJar},
    post,
    serde::json::Json,
    State,
};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    access::{self, SESSION_COOKIE},
    error::{self, JsonResult},
    state::RocketState,
};

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct LoginResponse {
    ok: bool,
    /// The session token; also set as the session cookie. Scripted clients
    /// pass it back via the auth header.
    token: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct LogoutResponse {
    ok: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct SessionResponse {
    authenticated: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// Unknown email or wrong password.
    BadCredentials,
}

#[post("/login", data = "<req>")]
pub(super) async fn login(
    state: &State<RocketState>,
    jar: &CookieJar<'_>,
    req: Json<LoginRequest>,
) -> JsonResult<LoginResponse, Error> {
    app::auth::login(&state.db, &state.auth, &req.email, &req.password)
        .await
        .map(|token| {
            jar.add(
                Cookie::build(SESSION_COOKIE, token.as_str().to_owned())
                    .http_only(true)
                    .finish(),
            );
            Json(LoginResponse {
                ok: true,
                token: token.as_str().to_owned(),
            })
        })
        .map_err(|_| error::unauthorized(Error::BadCredentials, "bad credentials".to_owned()))
}

/// Invalidates the presented session, whether it arrived in the auth header
/// or the session cookie.
#[post("/logout")]
pub(super) async fn logout(
    state: &State<RocketState>,
    jar: &CookieJar<'_>,
    credential: access::SessionCredential,
) -> Json<LogoutResponse> {
    if let Some(token) = credential.0 {
        app::auth::logout(&state.db, &token).await;
    }
    jar.remove(Cookie::named(SESSION_COOKIE));
    Json(LogoutResponse { ok: true })
}

/// Probe whether the presented session credential is still valid.
#[openapi(tag = "Session")]
#[get("/session")]
pub(super) async fn probe(_guard: access::AdminGuard) -> Json<SessionResponse> {
    Json(SessionResponse {
        authenticated: true,
    })
}
