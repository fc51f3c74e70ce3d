//! HTTP handlers for scrivo-api.

pub mod accounts;
pub mod health;
pub mod notes;
