//! HTTP handlers for consent-service.

pub mod accounts;
pub mod consent;
pub mod content;
pub mod data_rights;
pub mod health;
pub mod payments;
