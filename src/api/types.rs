//! API server data structures.

use crate::fetch::FetchContext;
use crate::reconcile::Reconciler;

/// Shared state for the API handlers
#[derive(Clone)]
pub struct ApiState {
    pub reconciler: Reconciler,
    pub fetch: FetchContext,
}

impl ApiState {
    pub fn new(reconciler: Reconciler, fetch: FetchContext) -> Self {
        Self { reconciler, fetch }
    }
}
