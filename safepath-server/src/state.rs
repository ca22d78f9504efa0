use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use safepath_core::{Error, RoutingContext, RoutingModelConfig, reload_features};
use tracing::info;

/// Shared server state.
///
/// Requests take a cheap `Arc` snapshot of the current context and search on
/// it without holding the lock. A reload builds a complete new context and
/// swaps the reference, so a search never mixes old and new divisors.
pub struct AppState {
    context: RwLock<Arc<RoutingContext>>,
    model: RoutingModelConfig,
    // serializes reloads; readers never take it
    reload_lock: Mutex<()>,
}

impl AppState {
    pub fn new(context: RoutingContext, model: RoutingModelConfig) -> Self {
        Self {
            context: RwLock::new(Arc::new(context)),
            model,
            reload_lock: Mutex::new(()),
        }
    }

    /// Context that new requests should run against
    pub fn snapshot(&self) -> Arc<RoutingContext> {
        Arc::clone(&self.context.read())
    }

    /// Re-reads the feature files and publishes the rescored context.
    ///
    /// Blocking; call from a blocking task.
    ///
    /// # Errors
    ///
    /// Loading or validation errors; the current context stays in place.
    pub fn reload(&self) -> Result<Arc<RoutingContext>, Error> {
        let _guard = self.reload_lock.lock();
        let current = self.snapshot();
        let next = Arc::new(reload_features(&current, &self.model)?);
        *self.context.write() = Arc::clone(&next);
        info!(
            edges = next.graph().edge_count(),
            skipped = next.feature_summary().skipped(),
            "published rescored routing context"
        );
        Ok(next)
    }
}
