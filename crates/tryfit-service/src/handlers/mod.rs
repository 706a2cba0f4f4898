//! HTTP request handlers.

pub mod accounts;
pub mod credits;
pub mod health;
pub mod providers;
pub mod tryon;
pub mod webhooks;
