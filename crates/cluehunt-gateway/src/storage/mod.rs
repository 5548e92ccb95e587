//! SQLite storage for the Cluehunt gateway.
//!
//! Provides persistence for teams, chat messages, and per-team hunt
//! progress (hint timers and the audit event log).

mod db;
mod models;
mod queries;
mod queries_hunt;


pub use cluehunt_core::db::DatabaseError;
pub use db::HuntDatabase;
pub use models::*;
