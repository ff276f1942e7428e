use std::sync::Arc;

use app::auth::SessionId;
use dashmap::{mapref::entry::Entry, DashMap};
use std::time::Duration;

/// In-memory request counter per admin session. One admin identity still
/// means many possible sessions (browser tabs, scripts), so the counter is
/// keyed by session rather than globally.
pub struct RateLimit {
    limit: usize,
    span: Duration,
    counter: Arc<DashMap<SessionId, usize>>,
}

impl RateLimit {
    pub fn new(limit: usize, span: Duration) -> Self {
        Self {
            limit,
            span,
            counter: Arc::new(Default::default()),
        }
    }

    /// Returns true if the session should be rate limited, false otherwise.
    pub fn limit(&self, session_id: SessionId) -> bool {
        match self.counter.entry(session_id) {
            Entry::Occupied(mut count) => {
                let count = count.get_mut();
                if *count >= self.limit {
                    true
                } else {
                    *count += 1;
                    self.decrement_later(session_id);
                    false
                }
            }
            Entry::Vacant(e) => {
                e.insert(0);
                false
            }
        }
    }

    fn decrement_later(&self, session_id: SessionId) {
        let counter = Arc::clone(&self.counter);
        let span = self.span;
        tokio::spawn(async move {
            tokio::time::sleep(span).await;
            match counter.entry(session_id) {
                Entry::Occupied(mut e) => {
                    let v = e.get_mut();
                    *v -= 1;
                    if *v == 0 {
                        e.remove();
                    }
                }
                Entry::Vacant(_) => {
                    log::error!(
                        "entry should not be vacant, this is a bug. session id {:?}",
                        session_id
                    );
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn limits_after_the_configured_count() {
        let limit = RateLimit::new(1, Duration::from_secs(3600));
        let session = SessionId(Uuid::new_v4());
        assert!(!limit.limit(session));
        assert!(!limit.limit(session));
        assert!(limit.limit(session));
    }

    #[tokio::test]
    async fn sessions_are_limited_independently() {
        let limit = RateLimit::new(1, Duration::from_secs(3600));
        let a = SessionId(Uuid::new_v4());
        let b = SessionId(Uuid::new_v4());
        while !limit.limit(a) {}
        assert!(!limit.limit(b));
    }
}
