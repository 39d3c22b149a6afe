//! Mathboard server library
//!
//! HTTP backend for the multiplication practice app: user profiles, quiz
//! results, per-factor-pair statistics, and SPA static file serving.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod server;

pub use config::ServerConfig;
pub use db::Database;
pub use error::{Error, Result};
