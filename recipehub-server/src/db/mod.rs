//! Database access for recipehub-server
//!
//! Pool creation and schema live in `recipehub_common::db`; these modules hold
//! the per-table queries.

pub mod categories;
pub mod conversations;
pub mod live_sessions;
pub mod rate_limits;
pub mod recipes;
pub mod settings;
