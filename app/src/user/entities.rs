use crate::money::Amount;
use thiserror::Error;

/// External, caller-assigned user key (e.g. `u_001`). Distinct from the
/// internal row id, which only orders listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Id(pub String);

#[derive(Debug, Error)]
#[error("invalid status {0:?}, expected pending, approved or denied")]
pub struct InvalidStatus(pub String);

/// Moderation status of a roster entry. Any state is reachable from any
/// other; there is no transition graph beyond the moderation workflow's
/// conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Approved,
    Denied,
}

impl Status {
    pub fn parse(s: &str) -> Result<Self, InvalidStatus> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "denied" => Ok(Self::Denied),
            _ => Err(InvalidStatus(s.to_owned())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
        }
    }
}

#[derive(Debug)]
pub struct User {
    pub id: i64,
    pub user_id: Id,
    pub nick: String,
    pub email: String,
    pub wallet: String,
    pub network: String,
    pub total_paid: Amount,
    pub status: Status,
}

/// Input for a roster insert. Admin creations default to [`Status::Approved`]
/// unless the caller overrides the status explicitly.
#[derive(Debug)]
pub struct NewUser {
    pub user_id: Id,
    pub nick: String,
    pub email: String,
    pub wallet: String,
    pub network: String,
    pub status: Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(Status::parse("approved").unwrap(), Status::Approved);
        assert_eq!(Status::parse("Pending").unwrap(), Status::Pending);
        assert_eq!(Status::parse("DENIED").unwrap(), Status::Denied);
    }

    #[test]
    fn status_rejects_unknown_values() {
        assert!(Status::parse("").is_err());
        assert!(Status::parse("active").is_err());
        assert!(Status::parse("approved ").is_err());
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [Status::Pending, Status::Approved, Status::Denied] {
            assert_eq!(Status::parse(status.as_str()).unwrap(), status);
        }
    }
}
