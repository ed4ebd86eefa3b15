//! Remedia billing service.
//!
//! Reconciles asynchronous billing-provider webhook events into the
//! local subscription record that gates feature access.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
