//! Cache lifetimes per data class.

use std::time::Duration;

use crate::cache::CacheOptions;

/// TTL and tags applied to one class of cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub tags: &'static [&'static str],
}

impl CachePolicy {
    /// Live counters (online users, requests in flight).
    pub const REALTIME: CachePolicy = CachePolicy {
        ttl: Duration::from_secs(15),
        tags: &["analytics", "realtime"],
    };

    pub const OVERVIEW: CachePolicy = CachePolicy {
        ttl: Duration::from_secs(5 * 60),
        tags: &["analytics", "overview"],
    };

    pub const REVENUE: CachePolicy = CachePolicy {
        ttl: Duration::from_secs(10 * 60),
        tags: &["analytics", "revenue"],
    };

    pub const USER_GROWTH: CachePolicy = CachePolicy {
        ttl: Duration::from_secs(15 * 60),
        tags: &["analytics", "users"],
    };
}

impl From<CachePolicy> for CacheOptions {
    fn from(policy: CachePolicy) -> Self {
        CacheOptions::ttl(policy.ttl).with_tags(policy.tags.iter().copied())
    }
}

impl From<Duration> for CacheOptions {
    fn from(ttl: Duration) -> Self {
        CacheOptions::ttl(ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volatile_data_expires_sooner() {
        assert!(CachePolicy::REALTIME.ttl < CachePolicy::OVERVIEW.ttl);
        assert!(CachePolicy::OVERVIEW.ttl < CachePolicy::REVENUE.ttl);
        assert!(CachePolicy::REVENUE.ttl < CachePolicy::USER_GROWTH.ttl);
    }

    #[test]
    fn test_policy_into_options() {
        let options: CacheOptions = CachePolicy::REVENUE.into();
        assert_eq!(options.ttl, Some(Duration::from_secs(600)));
        assert_eq!(options.tags, vec!["analytics".to_string(), "revenue".to_string()]);
    }
}
