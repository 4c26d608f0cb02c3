//! Application initialization and resource setup.
//!
//! Logger and HTTP client construction. The database pool lives in
//! [`crate::storage`].

mod client;
mod logger;

pub use client::init_client;
pub use logger::init_logger_with;
