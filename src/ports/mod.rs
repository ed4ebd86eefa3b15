//! Ports (trait seams) between the domain and infrastructure adapters.

mod billing_provider;
mod notifier;
mod subscription_repository;

pub use billing_provider::{BillingProvider, ProviderError, SubscriptionDetail};
pub use notifier::{Notification, Notifier};
pub use subscription_repository::{
    CheckoutUpsert, RepositoryError, StatusUpdate, SubscriptionRepository,
};
