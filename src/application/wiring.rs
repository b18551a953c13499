//! Composition of the licensing engine from configuration and ports.

use std::sync::Arc;

use crate::adapters::events::OrderEventDispatcher;
use crate::config::AppConfig;
use crate::domain::foundation::Clock;
use crate::domain::licensing::{LicenseContext, LicenseError, LicenseFactory, LicenseTypeRegistry};
use crate::ports::{
    EventPublisher, LicenseRepository, NoticeSink, OfferingCatalog, OrderRepository, UserAccounts,
};

use super::{
    AdministerLicenseHandler, CartQuantityGuard, ExistingRightsGuard, LicenseLifecycle,
    OrderSyncCoordinator,
};

/// Port implementations the engine runs on.
#[derive(Clone)]
pub struct LicensingPorts {
    pub licenses: Arc<dyn LicenseRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub catalog: Arc<dyn OfferingCatalog>,
    pub users: Arc<dyn UserAccounts>,
    pub notices: Arc<dyn NoticeSink>,
    pub publisher: Arc<dyn EventPublisher>,
    pub clock: Arc<dyn Clock>,
}

/// The wired engine.
///
/// Order workflow notifications go to `dispatcher`; further subscribers
/// (for example one that needs the license on the line) can be registered
/// on it with a `depends_on` of [`OrderSyncCoordinator::NAME`].
pub struct LicensingEngine {
    pub registry: Arc<LicenseTypeRegistry>,
    pub lifecycle: LicenseLifecycle,
    pub admin: AdministerLicenseHandler,
    pub dispatcher: OrderEventDispatcher,
}

impl LicensingEngine {
    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// `Validation` if the configuration is invalid.
    pub fn build(
        config: &AppConfig,
        ports: LicensingPorts,
        registry: LicenseTypeRegistry,
    ) -> Result<Self, LicenseError> {
        config
            .validate()
            .map_err(|e| LicenseError::validation("config", e.to_string()))?;
        let default_offset = config
            .licensing
            .default_offset()
            .map_err(|e| LicenseError::validation("licensing.default_timezone", e.to_string()))?;

        let registry = Arc::new(registry);
        let ctx = LicenseContext::new(
            registry.clone(),
            Arc::new(config.licensing.expiration_policy()),
            ports.users.clone(),
            ports.clock.clone(),
        )
        .with_default_offset(default_offset);

        let lifecycle = LicenseLifecycle::new(ports.licenses.clone(), ports.publisher.clone(), ctx);
        let coordinator = OrderSyncCoordinator::new(
            ports.orders.clone(),
            ports.catalog.clone(),
            LicenseFactory::new(registry.clone(), ports.clock.clone()),
            lifecycle.clone(),
            config.order_workflow.clone(),
        );

        let dispatcher = OrderEventDispatcher::new()
            .with(Arc::new(coordinator))?
            .with(Arc::new(ExistingRightsGuard::new(
                ports.orders.clone(),
                ports.catalog.clone(),
                registry.clone(),
                ports.notices.clone(),
            )))?
            .with(Arc::new(CartQuantityGuard::new(
                ports.orders,
                ports.catalog,
                ports.notices,
            )))?;

        tracing::info!(
            kinds = ?registry.list().iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
            subscribers = ?dispatcher.order(),
            "Licensing engine ready"
        );

        Ok(Self {
            admin: AdministerLicenseHandler::new(lifecycle.clone()),
            registry,
            lifecycle,
            dispatcher,
        })
    }
}
