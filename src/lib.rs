//! Internal lunch-voting service: restaurants upload daily menus, employees
//! cast ranked votes for them, and per-menu totals are read back. The vote
//! admission engine lives in [`domain::admission`], the aggregation in
//! [`domain::results`].

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod routes;
pub mod server;
pub mod store;
pub mod telemetry;
