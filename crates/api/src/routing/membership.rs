//! Organization membership check (fail-closed)

use hostedge_shared::{NamespaceId, UserId};
use std::sync::Arc;
use std::time::Duration;

use super::HostingDirectory;

#[derive(Clone)]
pub struct MembershipChecker {
    directory: Arc<dyn HostingDirectory>,
    timeout: Duration,
}

impl MembershipChecker {
    pub fn new(directory: Arc<dyn HostingDirectory>, timeout: Duration) -> Self {
        Self { directory, timeout }
    }

    /// Whether the user is a member of the organization owning the namespace.
    ///
    /// Errors and timeouts count as "not a member".
    pub async fn is_member(&self, user_id: &UserId, namespace_id: &NamespaceId) -> bool {
        match tokio::time::timeout(self.timeout, self.directory.is_member(user_id, namespace_id)).await {
            Ok(Ok(is_member)) => is_member,
            Ok(Err(e)) => {
                tracing::warn!(user_id = %user_id, namespace_id = %namespace_id, error = %e, "Failed to check membership");
                false
            }
            Err(_) => {
                tracing::warn!(user_id = %user_id, namespace_id = %namespace_id, "Membership check timed out");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::testing::FakeDirectory;

    #[tokio::test]
    async fn test_member_lookup() {
        let directory = Arc::new(FakeDirectory::default().with_member("u1", "ns_1"));
        let checker = MembershipChecker::new(directory.clone(), Duration::from_secs(1));

        assert!(checker.is_member(&"u1".into(), &"ns_1".into()).await);
        assert!(!checker.is_member(&"u2".into(), &"ns_1".into()).await);
        assert!(!checker.is_member(&"u1".into(), &"ns_2".into()).await);
        assert_eq!(directory.member_calls(), 3);
    }

    #[tokio::test]
    async fn test_failure_is_not_member() {
        let directory = Arc::new(FakeDirectory::default().with_member("u1", "ns_1").failing_membership());
        let checker = MembershipChecker::new(directory, Duration::from_secs(1));
        assert!(!checker.is_member(&"u1".into(), &"ns_1".into()).await);
    }

    #[tokio::test]
    async fn test_timeout_is_not_member() {
        let directory = Arc::new(
            FakeDirectory::default()
                .with_member("u1", "ns_1")
                .with_delay(Duration::from_secs(5)),
        );
        let checker = MembershipChecker::new(directory, Duration::from_millis(100));
        assert!(!checker.is_member(&"u1".into(), &"ns_1".into()).await);
    }
}
