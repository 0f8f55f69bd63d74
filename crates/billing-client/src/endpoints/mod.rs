//! Typed endpoint wrappers
//!
//! One module per platform resource. Each function is a thin call into
//! the pipeline — authentication, refresh-retry, and error shaping all
//! happen in `ApiClient`; nothing here touches tokens.

pub mod analytics;
pub mod files;
pub mod invoices;
pub mod payments;
pub mod plans;
pub mod subscriptions;
pub mod usage;
pub mod users;
