//! Domain layer.

pub mod subscription;
pub mod webhook;
