//! Admin routes for managing the participant roster.

use rocket::{delete, get, http::Status, patch, post, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use app::user;

use crate::{
    access,
    error::{self, JsonError, JsonResult},
    state::RocketState,
};

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct UserModel {
    id: i64,
    /// External, caller-assigned user id.
    user_id: String,
    nick: String,
    email: String,
    wallet: String,
    /// Payout network tag, e.g. ERC20 or TRC20.
    network: String,
    /// Running sum of all success-status payouts.
    total_paid: f64,
    /// Moderation status: pending, approved or denied.
    status: String,
}

impl UserModel {
    pub(super) fn from_entity(user: &user::User) -> Self {
        Self {
            id: user.id,
            user_id: user.user_id.0.clone(),
            nick: user.nick.clone(),
            email: user.email.clone(),
            wallet: user.wallet.clone(),
            network: user.network.clone(),
            total_paid: user.total_paid.0,
            status: user.status.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct UserResponse {
    user: UserModel,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct UsersResponse {
    users: Vec<UserModel>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct CreateUserRequest {
    user_id: String,
    nick: String,
    email: String,
    wallet: String,
    network: String,
    /// Defaults to approved when omitted.
    status: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct StatusUpdateRequest {
    status: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// The user id or email is already registered.
    AlreadyExists,
    /// Status must be one of pending, approved or denied.
    InvalidStatus,
    /// No user with this id.
    NotFound,
}

fn parse_status(s: &str) -> Result<user::Status, JsonError<Error>> {
    user::Status::parse(s).map_err(|e| error::bad_request(Error::InvalidStatus, e.to_string()))
}

/// Create a roster entry directly. Admin creations default to approved.
#[openapi(tag = "Users")]
#[post("/users", data = "<req>")]
pub(super) async fn create(
    state: &State<RocketState>,
    guard: access::AdminGuard,
    req: Json<CreateUserRequest>,
) -> JsonResult<UserResponse, Error> {
    let req = req.into_inner();
    let status = match req.status {
        Some(ref s) => parse_status(s)?,
        None => user::Status::Approved,
    };
    user::create(
        guard.grant(),
        &state.db,
        user::NewUser {
            user_id: user::Id(req.user_id),
            nick: req.nick,
            email: req.email,
            wallet: req.wallet,
            network: req.network,
            status,
        },
    )
    .await
    .map(|user| {
        Json(UserResponse {
            user: UserModel::from_entity(&user),
        })
    })
    .map_err(|e| match e {
        user::Error::AlreadyExists => {
            error::conflict(Error::AlreadyExists, "user id or email already exists".to_owned())
        }
        user::Error::NotFound => unreachable!("create cannot report a missing user"),
    })
}

/// List users, optionally filtered by a text query and/or status.
#[openapi(tag = "Users")]
#[get("/users?<q>&<status>")]
pub(super) async fn list(
    state: &State<RocketState>,
    guard: access::AdminGuard,
    q: Option<String>,
    status: Option<String>,
) -> JsonResult<UsersResponse, Error> {
    let status = match status {
        Some(ref s) => Some(parse_status(s)?),
        None => None,
    };
    let users = user::list(guard.grant(), &state.db, user::Filter { query: q, status }).await;
    Ok(Json(UsersResponse {
        users: users.iter().map(UserModel::from_entity).collect(),
    }))
}

/// Get a user by external id.
#[openapi(tag = "Users")]
#[get("/users/<user_id>", rank = 2)]
pub(super) async fn get(
    state: &State<RocketState>,
    guard: access::AdminGuard,
    user_id: String,
) -> Option<Json<UserResponse>> {
    user::get(guard.grant(), &state.db, &user::Id(user_id))
        .await
        .map(|user| {
            Json(UserResponse {
                user: UserModel::from_entity(&user),
            })
        })
}

/// Set a user's moderation status. Any of the three states can be set
/// regardless of the current one.
#[openapi(tag = "Users")]
#[patch("/users/<user_id>/status", data = "<req>")]
pub(super) async fn update_status(
    state: &State<RocketState>,
    guard: access::AdminGuard,
    user_id: String,
    req: Json<StatusUpdateRequest>,
) -> JsonResult<UserResponse, Error> {
    let status = parse_status(&req.status)?;
    user::update_status(guard.grant(), &state.db, &user::Id(user_id), status)
        .await
        .map(|user| {
            Json(UserResponse {
                user: UserModel::from_entity(&user),
            })
        })
        .map_err(|e| match e {
            user::Error::NotFound => error::not_found(Error::NotFound, "user not found".to_owned()),
            user::Error::AlreadyExists => {
                unreachable!("status update cannot violate uniqueness")
            }
        })
}

/// Permanently remove a user. Ledger history is retained.
#[delete("/users/<user_id>")]
pub(super) async fn delete(
    state: &State<RocketState>,
    guard: access::AdminGuard,
    user_id: String,
) -> Result<Status, JsonError<Error>> {
    user::delete(guard.grant(), &state.db, &user::Id(user_id))
        .await
        .map(|()| Status::NoContent)
        .map_err(|e| match e {
            user::Error::NotFound => error::not_found(Error::NotFound, "user not found".to_owned()),
            user::Error::AlreadyExists => unreachable!("delete cannot violate uniqueness"),
        })
}
