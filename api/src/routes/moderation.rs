//! The public self-registration form and the admin moderation queue.

use chrono::{DateTime, Utc};
use rocket::{get, post, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use app::{moderation, user};

use crate::{
    access,
    error::{self, JsonResult},
    routes::users::UserModel,
    state::RocketState,
};

#[derive(Debug, Serialize, JsonSchema)]
struct PendingModel {
    id: i64,
    user_id: String,
    nick: String,
    email: String,
    wallet: String,
    network: String,
    created: DateTime<Utc>,
}

impl PendingModel {
    fn from_entity(pending: &moderation::PendingRequest) -> Self {
        Self {
            id: pending.id,
            user_id: pending.user_id.0.clone(),
            nick: pending.nick.clone(),
            email: pending.email.clone(),
            wallet: pending.wallet.clone(),
            network: pending.network.clone(),
            created: pending.created,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct SubmitRequest {
    user_id: String,
    nick: String,
    email: String,
    wallet: String,
    network: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct SubmitResponse {
    ok: bool,
    /// Set when the identity was already on the roster and the deployment is
    /// configured to acknowledge rather than reject duplicates.
    already_on_file: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct PendingResponse {
    pending: Vec<PendingModel>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct ApproveResponse {
    ok: bool,
    /// Set when the identity had already been registered directly; the
    /// pending request was discarded without creating a second entry.
    already_present: bool,
    user: Option<UserModel>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct DenyResponse {
    ok: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// The user id or email is already registered.
    AlreadyRegistered,
    /// No pending request with this user id.
    NotFound,
}

/// Public form submission. Stages a pending registration, overwriting a
/// previous submission for the same user id.
#[openapi(tag = "Moderation")]
#[post("/users/public", data = "<req>")]
pub(super) async fn submit_public(
    state: &State<RocketState>,
    req: Json<SubmitRequest>,
) -> JsonResult<SubmitResponse, Error> {
    let req = req.into_inner();
    moderation::submit(
        &state.db,
        state.moderation_policy,
        moderation::Submission {
            user_id: user::Id(req.user_id),
            nick: req.nick,
            email: req.email,
            wallet: req.wallet,
            network: req.network,
        },
    )
    .await
    .map(|outcome| {
        Json(SubmitResponse {
            ok: true,
            already_on_file: outcome == moderation::SubmitOutcome::AlreadyOnFile,
        })
    })
    .map_err(|e| match e {
        moderation::Error::AlreadyRegistered => error::conflict(
            Error::AlreadyRegistered,
            "user already exists".to_owned(),
        ),
        moderation::Error::NotFound => unreachable!("submit cannot report a missing request"),
    })
}

/// List pending registration requests, most recent first.
#[openapi(tag = "Moderation")]
#[get("/users/pending")]
pub(super) async fn list_pending(
    state: &State<RocketState>,
    guard: access::AdminGuard,
) -> Json<PendingResponse> {
    Json(PendingResponse {
        pending: moderation::list(guard.grant(), &state.db)
            .await
            .iter()
            .map(PendingModel::from_entity)
            .collect(),
    })
}

/// Approve a pending request, materializing it as an approved user.
#[openapi(tag = "Moderation")]
#[post("/users/pending/<user_id>/approve")]
pub(super) async fn approve(
    state: &State<RocketState>,
    guard: access::AdminGuard,
    user_id: String,
) -> JsonResult<ApproveResponse, Error> {
    moderation::approve(guard.grant(), &state.db, &user::Id(user_id))
        .await
        .map(|approval| {
            Json(match approval {
                moderation::Approval::Created(user) => ApproveResponse {
                    ok: true,
                    already_present: false,
                    user: Some(UserModel::from_entity(&user)),
                },
                moderation::Approval::AlreadyPresent => ApproveResponse {
                    ok: true,
                    already_present: true,
                    user: None,
                },
            })
        })
        .map_err(|e| match e {
            moderation::Error::NotFound => {
                error::not_found(Error::NotFound, "pending request not found".to_owned())
            }
            moderation::Error::AlreadyRegistered => {
                unreachable!("approval resolves duplicates without erroring")
            }
        })
}

/// Deny a pending request, discarding it.
#[openapi(tag = "Moderation")]
#[post("/users/pending/<user_id>/deny")]
pub(super) async fn deny(
    state: &State<RocketState>,
    guard: access::AdminGuard,
    user_id: String,
) -> JsonResult<DenyResponse, Error> {
    moderation::deny(guard.grant(), &state.db, &user::Id(user_id))
        .await
        .map(|()| Json(DenyResponse { ok: true }))
        .map_err(|e| match e {
            moderation::Error::NotFound => {
                error::not_found(Error::NotFound, "pending request not found".to_owned())
            }
            moderation::Error::AlreadyRegistered => {
                unreachable!("denial never reports duplicates")
            }
        })
}
