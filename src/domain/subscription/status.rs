//! Subscription status and provider status mapping.

use serde::{Deserialize, Serialize};

/// Local subscription status.
///
/// Only `Active` and `PastDue` may retain a paid plan long term;
/// `Cancelled` eventually implies a free plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid and current.
    Active,

    /// Payment failed but within the provider's grace period.
    PastDue,

    /// Payment retries exhausted or period lapsed. No access.
    Expired,

    /// Subscription ended at the provider.
    Cancelled,
}

impl SubscriptionStatus {
    /// String code used in the database and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a stored string code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SubscriptionStatus::Active),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "expired" => Some(SubscriptionStatus::Expired),
            "cancelled" => Some(SubscriptionStatus::Cancelled),
            _ => None,
        }
    }

    /// Map the provider's raw subscription status string.
    ///
    /// Statuses the provider may introduce that we do not recognize map
    /// to `None`, which the update handler treats as "leave status
    /// untouched" rather than erroring.
    pub fn from_provider(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SubscriptionStatus::Active),
            "trialing" => Some(SubscriptionStatus::Active),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "canceled" => Some(SubscriptionStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_roundtrip() {
        for status in [
            SubscriptionStatus::Active,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Expired,
            SubscriptionStatus::Cancelled,
        ] {
            assert_eq!(SubscriptionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SubscriptionStatus::parse("pending"), None);
    }

    #[test]
    fn provider_status_mapping_table() {
        assert_eq!(
            SubscriptionStatus::from_provider("active"),
            Some(SubscriptionStatus::Active)
        );
        assert_eq!(
            SubscriptionStatus::from_provider("trialing"),
            Some(SubscriptionStatus::Active)
        );
        assert_eq!(
            SubscriptionStatus::from_provider("past_due"),
            Some(SubscriptionStatus::PastDue)
        );
        assert_eq!(
            SubscriptionStatus::from_provider("canceled"),
            Some(SubscriptionStatus::Cancelled)
        );
    }

    #[test]
    fn unmapped_provider_statuses_are_none() {
        assert_eq!(SubscriptionStatus::from_provider("incomplete"), None);
        assert_eq!(SubscriptionStatus::from_provider("paused"), None);
        assert_eq!(SubscriptionStatus::from_provider(""), None);
    }
}
