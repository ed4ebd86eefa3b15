//! Subscription domain module.
//!
//! Owns the local subscription record reconciled from billing-provider
//! events, the plan tier and status enums, and the pure mappings from
//! provider identifiers onto them.

mod entity;
mod plan;
mod status;

pub use entity::Subscription;

#[cfg(test)]
pub(crate) use entity::test_support;
pub use plan::{resolve_plan, BillingInterval, PlanTier};
pub use status::SubscriptionStatus;
