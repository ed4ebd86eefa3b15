//! Plan tier definitions and price-id resolution.

use serde::{Deserialize, Serialize};

/// Subscription plan tier.
///
/// Determines feature access elsewhere in the system; this service only
/// reconciles which tier a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// No paid subscription.
    Free,

    /// Basic paid tier.
    Basic,

    /// Premium paid tier.
    Premium,
}

impl PlanTier {
    /// Returns true if this tier is a paid tier.
    pub fn is_paid(&self) -> bool {
        !matches!(self, PlanTier::Free)
    }

    /// String code used in the database and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Basic => "basic",
            PlanTier::Premium => "premium",
        }
    }

    /// Parse a stored string code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(PlanTier::Free),
            "basic" => Some(PlanTier::Basic),
            "premium" => Some(PlanTier::Premium),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Billing interval for a paid subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

impl BillingInterval {
    /// String code used in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingInterval::Monthly => "monthly",
            BillingInterval::Yearly => "yearly",
        }
    }

    /// Parse a stored string code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(BillingInterval::Monthly),
            "yearly" => Some(BillingInterval::Yearly),
            _ => None,
        }
    }

    /// Map the provider's recurring interval ("month", "year").
    pub fn from_provider(s: &str) -> Option<Self> {
        match s {
            "month" => Some(BillingInterval::Monthly),
            "year" => Some(BillingInterval::Yearly),
            _ => None,
        }
    }
}

/// Resolve a provider price identifier to an internal plan tier.
///
/// Matching is substring-based against known tier names, so new price
/// ids for an existing tier (currency variants, price changes) resolve
/// without code changes. Unrecognized identifiers resolve to `None`,
/// which callers must treat as "do not change plan" — an unresolvable
/// price must never cause an accidental downgrade.
pub fn resolve_plan(price_id: &str) -> Option<PlanTier> {
    if price_id.contains("premium") {
        Some(PlanTier::Premium)
    } else if price_id.contains("basic") {
        Some(PlanTier::Basic)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn free_tier_is_not_paid() {
        assert!(!PlanTier::Free.is_paid());
        assert!(PlanTier::Basic.is_paid());
        assert!(PlanTier::Premium.is_paid());
    }

    #[test]
    fn tier_codes_roundtrip() {
        for tier in [PlanTier::Free, PlanTier::Basic, PlanTier::Premium] {
            assert_eq!(PlanTier::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(PlanTier::parse("gold"), None);
    }

    #[test]
    fn interval_codes_roundtrip() {
        for interval in [BillingInterval::Monthly, BillingInterval::Yearly] {
            assert_eq!(BillingInterval::parse(interval.as_str()), Some(interval));
        }
    }

    #[test]
    fn provider_intervals_map() {
        assert_eq!(
            BillingInterval::from_provider("month"),
            Some(BillingInterval::Monthly)
        );
        assert_eq!(
            BillingInterval::from_provider("year"),
            Some(BillingInterval::Yearly)
        );
        assert_eq!(BillingInterval::from_provider("week"), None);
    }

    #[test]
    fn known_price_ids_resolve() {
        assert_eq!(resolve_plan("plan_basic_monthly"), Some(PlanTier::Basic));
        assert_eq!(resolve_plan("price_premium_yearly"), Some(PlanTier::Premium));
    }

    #[test]
    fn unknown_price_ids_resolve_to_none() {
        assert_eq!(resolve_plan("price_1NXabc"), None);
        assert_eq!(resolve_plan(""), None);
    }

    #[test]
    fn premium_wins_over_basic_in_ambiguous_ids() {
        // "premium" is checked first so a pathological id naming both
        // tiers never downgrades.
        assert_eq!(resolve_plan("basic_to_premium_upgrade"), Some(PlanTier::Premium));
    }

    proptest! {
        #[test]
        fn any_id_containing_premium_resolves_premium(
            prefix in "[a-z_]{0,12}",
            suffix in "[a-z_]{0,12}",
        ) {
            let id = format!("{}premium{}", prefix, suffix);
            prop_assert_eq!(resolve_plan(&id), Some(PlanTier::Premium));
        }

        #[test]
        fn ids_without_tier_names_never_resolve(id in "[0-9_]{0,24}") {
            prop_assert_eq!(resolve_plan(&id), None);
        }
    }
}
