use crate::user;
use chrono::{DateTime, Utc};

/// A staged registration submitted through the unauthenticated public form,
/// awaiting admin moderation. Keyed by the external user id within the
/// pending set only.
#[derive(Debug)]
pub struct PendingRequest {
    pub id: i64,
    pub user_id: user::Id,
    pub nick: String,
    pub email: String,
    pub wallet: String,
    pub network: String,
    pub created: DateTime<Utc>,
}

impl PendingRequest {
    /// Approval materializes the staged profile as an approved roster entry
    /// with a zeroed balance.
    pub(crate) fn into_new_user(self) -> user::NewUser {
        user::NewUser {
            user_id: self.user_id,
            nick: self.nick,
            email: self.email,
            wallet: self.wallet,
            network: self.network,
            status: user::Status::Approved,
        }
    }
}

/// Public form input. No status field is exposed here; submissions can only
/// ever stage a pending request.
#[derive(Debug)]
pub struct Submission {
    pub user_id: user::Id,
    pub nick: String,
    pub email: String,
    pub wallet: String,
    pub network: String,
}

/// Configured handling of a public submission whose identity is already on
/// the roster. The two deployed frontends expect different behavior, so this
/// is a deliberate deployment choice rather than a hardcoded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Hard conflict; nothing is staged.
    Reject,
    /// Soft success reporting the user is already on file; nothing is staged.
    Acknowledge,
}

impl DuplicatePolicy {
    /// Resolves a submission whose identity is already on the roster.
    pub(crate) fn on_duplicate(self) -> Result<SubmitOutcome, super::Error> {
        match self {
            Self::Reject => Err(super::Error::AlreadyRegistered),
            Self::Acknowledge => Ok(SubmitOutcome::AlreadyOnFile),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Staged,
    AlreadyOnFile,
}

#[derive(Debug)]
pub enum Approval {
    Created(user::User),
    /// The identity was registered directly by an admin while the request was
    /// pending. The request is discarded without creating a second entry.
    AlreadyPresent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::Status;

    #[test]
    fn approval_copies_the_staged_profile() {
        let pending = PendingRequest {
            id: 7,
            user_id: user::Id("u1".to_owned()),
            nick: "nick".to_owned(),
            email: "a@b.com".to_owned(),
            wallet: "0xabc".to_owned(),
            network: "ERC20".to_owned(),
            created: Utc::now(),
        };
        let new = pending.into_new_user();
        assert_eq!(new.user_id, user::Id("u1".to_owned()));
        assert_eq!(new.nick, "nick");
        assert_eq!(new.email, "a@b.com");
        assert_eq!(new.wallet, "0xabc");
        assert_eq!(new.network, "ERC20");
        assert_eq!(new.status, Status::Approved);
    }

    #[test]
    fn reject_policy_turns_duplicate_submissions_into_conflicts() {
        assert!(matches!(
            DuplicatePolicy::Reject.on_duplicate(),
            Err(crate::moderation::Error::AlreadyRegistered)
        ));
    }

    #[test]
    fn acknowledge_policy_reports_duplicates_as_already_on_file() {
        assert_eq!(
            DuplicatePolicy::Acknowledge.on_duplicate().unwrap(),
            SubmitOutcome::AlreadyOnFile
        );
    }
}
