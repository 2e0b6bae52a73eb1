//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::checkout::guard::SubmissionGuards;
use crate::config::StorefrontConfig;
use crate::payments::{GatewayClient, PaymentGateway};
use crate::store::{CommerceStore, StoreClient};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The remote collaborators are held as trait
/// objects so tests can inject in-memory fakes; there is no module-level
/// global anywhere - everything session-independent flows through here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    store: Arc<dyn CommerceStore>,
    payments: Arc<dyn PaymentGateway>,
    submissions: SubmissionGuards,
}

impl AppState {
    /// Create application state with the real remote clients.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let store = Arc::new(StoreClient::new(&config.store));
        let payments = Arc::new(GatewayClient::new(&config.payments));
        Self::with_remotes(config, pool, store, payments)
    }

    /// Create application state with explicit remote collaborators.
    #[must_use]
    pub fn with_remotes(
        config: StorefrontConfig,
        pool: PgPool,
        store: Arc<dyn CommerceStore>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                store,
                payments,
                submissions: SubmissionGuards::default(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the session-store connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the commerce store client.
    #[must_use]
    pub fn store(&self) -> &dyn CommerceStore {
        self.inner.store.as_ref()
    }

    /// Get the payment gateway client.
    #[must_use]
    pub fn payments(&self) -> &dyn PaymentGateway {
        self.inner.payments.as_ref()
    }

    /// Get the per-checkout submission locks.
    #[must_use]
    pub fn submissions(&self) -> &SubmissionGuards {
        &self.inner.submissions
    }
}
