//! Ledger routes: the tolerant log variant, the strict pay variant, and the
//! per-user history.

use chrono::{DateTime, Utc};
use rocket::{get, post, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use app::{ledger, money::Amount, user};

use crate::{
    access,
    error::{self, JsonError, JsonResult},
    state::RocketState,
};

#[derive(Debug, Serialize, JsonSchema)]
struct TxModel {
    id: i64,
    user_id: String,
    amount: f64,
    /// success, failed or pending.
    status: String,
    tx_hash: String,
    network: String,
    created_at: DateTime<Utc>,
    meta: Option<String>,
}

impl TxModel {
    fn from_entity(entry: &ledger::Entry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id.0.clone(),
            amount: entry.amount.0,
            status: entry.status.as_str().to_owned(),
            tx_hash: entry.tx_hash.0.clone(),
            network: entry.network.clone(),
            created_at: entry.created,
            meta: entry.meta.clone(),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct LogRequest {
    user_id: String,
    amount: f64,
    /// Defaults to success when omitted; matched case-insensitively.
    status: Option<String>,
    /// Synthesized when omitted or empty.
    tx_hash: Option<String>,
    network: String,
    meta: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct PayRequest {
    user_id: String,
    amount: f64,
    network: String,
    tx_hash: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct TxResponse {
    tx: TxModel,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct TxsResponse {
    txs: Vec<TxModel>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct PayResponse {
    ok: bool,
    tx: TxModel,
    /// The user's running total after this payout was recorded.
    user_total_paid: f64,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// Amount must be greater than zero.
    InvalidAmount,
    /// Status must be one of success, failed or pending.
    InvalidStatus,
    /// No user with this id.
    UserNotFound,
    /// The user is not approved for payouts.
    NotEligible,
}

fn parse_status(s: Option<String>) -> Result<Option<ledger::Status>, JsonError<Error>> {
    match s {
        Some(ref s) => ledger::Status::parse(s)
            .map(Some)
            .map_err(|e| error::bad_request(Error::InvalidStatus, e.to_string())),
        None => Ok(None),
    }
}

fn map_ledger_error(e: ledger::Error) -> JsonError<Error> {
    match e {
        ledger::Error::InvalidAmount => {
            error::bad_request(Error::InvalidAmount, "amount must be > 0".to_owned())
        }
        ledger::Error::UserNotFound => {
            error::not_found(Error::UserNotFound, "user not found".to_owned())
        }
        ledger::Error::NotEligible => error::unprocessable(
            Error::NotEligible,
            "user is not eligible for payout".to_owned(),
        ),
    }
}

/// Record an externally-executed transaction. Tolerates user ids that are not
/// on the roster; success-status entries for known users bump their total.
#[openapi(tag = "Transactions")]
#[post("/tx", data = "<req>")]
pub(super) async fn log(
    state: &State<RocketState>,
    guard: access::AdminGuard,
    req: Json<LogRequest>,
) -> JsonResult<TxResponse, Error> {
    let req = req.into_inner();
    let status = parse_status(req.status)?;
    ledger::log(
        guard.grant(),
        &state.db,
        ledger::Draft {
            user_id: user::Id(req.user_id),
            amount: Amount(req.amount),
            status,
            tx_hash: req.tx_hash,
            network: req.network,
            meta: req.meta,
        },
    )
    .await
    .map(|entry| {
        Json(TxResponse {
            tx: TxModel::from_entity(&entry),
        })
    })
    .map_err(map_ledger_error)
}

/// One-click payout record against an existing, approved user.
#[openapi(tag = "Transactions")]
#[post("/pay", data = "<req>")]
pub(super) async fn pay(
    state: &State<RocketState>,
    guard: access::AdminGuard,
    req: Json<PayRequest>,
) -> JsonResult<PayResponse, Error> {
    let req = req.into_inner();
    let status = parse_status(req.status)?;
    ledger::pay(
        guard.grant(),
        &state.db,
        ledger::Draft {
            user_id: user::Id(req.user_id),
            amount: Amount(req.amount),
            status,
            tx_hash: req.tx_hash,
            network: req.network,
            meta: None,
        },
    )
    .await
    .map(|payout| {
        Json(PayResponse {
            ok: true,
            tx: TxModel::from_entity(&payout.entry),
            user_total_paid: payout.total_paid.0,
        })
    })
    .map_err(map_ledger_error)
}

/// Payout history for a user, most recent first. Unknown users yield an
/// empty list.
#[openapi(tag = "Transactions")]
#[get("/tx/user/<user_id>")]
pub(super) async fn list_by_user(
    state: &State<RocketState>,
    guard: access::AdminGuard,
    user_id: String,
) -> Json<TxsResponse> {
    Json(TxsResponse {
        txs: ledger::list_by_user(guard.grant(), &state.db, &user::Id(user_id))
            .await
            .iter()
            .map(TxModel::from_entity)
            .collect(),
    })
}
