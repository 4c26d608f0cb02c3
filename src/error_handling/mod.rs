//! Error handling.
//!
//! Errors are categorized by the layer that raises them:
//! - **Initialization**: logger and HTTP client setup
//! - **Database**: pool creation and SQL execution
//! - **Source**: the assessment and geolocation APIs
//! - **Reconcile**: a lookup as a whole, wrapping the two above
//!
//! Missing page metadata is not an error; it is recorded as empty strings.

mod types;

pub use types::{DatabaseError, InitializationError, ReconcileError, SourceError};
