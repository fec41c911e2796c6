//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod aliases;
pub mod health;
pub mod sync;

pub use aliases::{alias_list_handler, reserve_alias_handler};
pub use health::health_handler;
pub use sync::{reservation_sync_handler, sync_plan_handler, trigger_sync_handler};
