//! Entities for the append-only payout ledger. Entries are immutable once
//! written; only success-status entries feed the roster's running total.

use crate::hex::Hex;
use crate::money::Amount;
use crate::user;
use chrono::{DateTime, Utc};
use rand::RngCore;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("amount must be greater than zero")]
    InvalidAmount,
    #[error("user not found")]
    UserNotFound,
    #[error("user is not eligible for payout")]
    NotEligible,
}

/// Outcome of an externally-executed payout, as reported to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failed,
    Pending,
}

#[derive(Debug, Error)]
#[error("invalid transaction status {0:?}, expected success, failed or pending")]
pub struct InvalidTxStatus(pub String);

impl Status {
    pub fn parse(s: &str) -> Result<Self, InvalidTxStatus> {
        match s.to_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "pending" => Ok(Self::Pending),
            _ => Err(InvalidTxStatus(s.to_owned())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }
}

/// External transaction reference. Callers usually report the real on-chain
/// hash; when none is supplied one is synthesized so every entry stays
/// individually addressable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxHash(pub String);

impl TxHash {
    /// `0x` plus 40 random hex characters. Random rather than sequential so
    /// synthesized references cannot collide with each other in practice.
    pub(crate) fn generate() -> Self {
        let mut bytes = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(format!("0x{}", Hex::encode(&bytes).as_str()))
    }
}

/// An immutable ledger row. `user_id` is a weak reference: deleting the user
/// keeps the entry.
#[derive(Debug)]
pub struct Entry {
    pub id: i64,
    pub user_id: user::Id,
    pub amount: Amount,
    pub status: Status,
    pub tx_hash: TxHash,
    pub network: String,
    pub created: DateTime<Utc>,
    pub meta: Option<String>,
}

/// Caller input for a ledger write, before validation and defaulting.
#[derive(Debug)]
pub struct Draft {
    pub user_id: user::Id,
    pub amount: Amount,
    pub status: Option<Status>,
    pub tx_hash: Option<String>,
    pub network: String,
    pub meta: Option<String>,
}

/// A validated entry awaiting its database-assigned id.
#[derive(Debug)]
pub struct NewEntry {
    pub(crate) user_id: user::Id,
    pub(crate) amount: Amount,
    pub(crate) status: Status,
    pub(crate) tx_hash: TxHash,
    pub(crate) network: String,
    pub(crate) created: DateTime<Utc>,
    pub(crate) meta: Option<String>,
}

impl NewEntry {
    /// Validates the draft and fills defaults: status falls back to success,
    /// and a missing or empty tx hash is synthesized.
    pub(crate) fn create(draft: Draft) -> Result<Self, Error> {
        if !draft.amount.is_positive() {
            return Err(Error::InvalidAmount);
        }
        let tx_hash = match draft.tx_hash.filter(|hash| !hash.is_empty()) {
            Some(hash) => TxHash(hash),
            None => TxHash::generate(),
        };
        Ok(Self {
            user_id: draft.user_id,
            amount: draft.amount,
            status: draft.status.unwrap_or(Status::Success),
            tx_hash,
            network: draft.network,
            created: Utc::now(),
            meta: draft.meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(amount: f64) -> Draft {
        Draft {
            user_id: user::Id("u1".to_owned()),
            amount: Amount(amount),
            status: None,
            tx_hash: None,
            network: "ERC20".to_owned(),
            meta: None,
        }
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert!(matches!(
            NewEntry::create(draft(0.0)),
            Err(Error::InvalidAmount)
        ));
        assert!(matches!(
            NewEntry::create(draft(-1.0)),
            Err(Error::InvalidAmount)
        ));
        assert!(matches!(
            NewEntry::create(draft(f64::NAN)),
            Err(Error::InvalidAmount)
        ));
    }

    #[test]
    fn status_defaults_to_success() {
        let entry = NewEntry::create(draft(50.0)).unwrap();
        assert_eq!(entry.status, Status::Success);

        let entry = NewEntry::create(Draft {
            status: Some(Status::Failed),
            ..draft(25.0)
        })
        .unwrap();
        assert_eq!(entry.status, Status::Failed);
    }

    #[test]
    fn synthesizes_a_hash_when_missing_or_empty() {
        let entry = NewEntry::create(draft(1.0)).unwrap();
        let hash = &entry.tx_hash.0;
        assert!(hash.starts_with("0x"));
        assert_eq!(hash.len(), 42);
        assert!(hash[2..].chars().all(|c| c.is_ascii_hexdigit()));

        let other = NewEntry::create(Draft {
            tx_hash: Some(String::new()),
            ..draft(1.0)
        })
        .unwrap();
        assert_ne!(entry.tx_hash, other.tx_hash);
    }

    #[test]
    fn keeps_a_supplied_hash() {
        let entry = NewEntry::create(Draft {
            tx_hash: Some("0xdeadbeef".to_owned()),
            ..draft(1.0)
        })
        .unwrap();
        assert_eq!(entry.tx_hash, TxHash("0xdeadbeef".to_owned()));
    }

    #[test]
    fn tx_status_parses_case_insensitively() {
        assert_eq!(Status::parse("Success").unwrap(), Status::Success);
        assert_eq!(Status::parse("FAILED").unwrap(), Status::Failed);
        assert_eq!(Status::parse("pending").unwrap(), Status::Pending);
        assert!(Status::parse("settled").is_err());
    }
}
