//! API HTTP handlers.

mod consulted;
mod domain;

pub use consulted::consulted_handler;
pub use domain::{domain_handler, error_status, normalize_domain};
