use std::time::SystemTime;

use serde::{Deserialize, Serialize};

pub trait TimeLimited {
    fn set_validity(&mut self, until: SystemTime);
    fn check_validity(&self) -> bool;
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Claim carried by API bearer tokens, `sub` is the id of the authenticated user.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiClaim {
    pub sub: String,
    pub exp: u64,
}

impl ApiClaim {
    /// Claim with no validity yet, token manager sets it when issuing
    pub fn new_expired(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            exp: 0,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.sub
    }
}

impl TimeLimited for ApiClaim {
    fn set_validity(&mut self, until: SystemTime) {
        self.exp = unix_secs(until);
    }

    fn check_validity(&self) -> bool {
        self.exp > unix_secs(SystemTime::now())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_claim_validity() {
        let mut claim = ApiClaim::new_expired("u1");
        assert_eq!(claim.user_id(), "u1");
        assert!(!claim.check_validity());

        claim.set_validity(SystemTime::now() + Duration::from_secs(60));
        assert!(claim.check_validity());

        claim.set_validity(SystemTime::now() - Duration::from_secs(60));
        assert!(!claim.check_validity());
    }
}
