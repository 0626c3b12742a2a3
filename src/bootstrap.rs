//! # Bootstrap
//!
//! Wires configuration, logging, the entity store and the event publisher
//! into a ready [`ProductionService`].

use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use crate::config::{ConfigLoader, ShopfloorConfig};
use crate::events::EventPublisher;
use crate::logging::init_structured_logging;
use crate::service::ProductionService;
use crate::store::memory::InMemoryEntityStore;
#[cfg(feature = "postgres")]
use crate::store::postgres::PgEntityStore;

/// A running engine and the handles callers usually need alongside it
#[derive(Clone)]
pub struct ShopfloorSystem {
    pub config: ShopfloorConfig,
    pub service: ProductionService,
    pub publisher: Arc<EventPublisher>,
}

/// Load configuration from `./config` and bootstrap against PostgreSQL
#[cfg(feature = "postgres")]
pub async fn bootstrap() -> anyhow::Result<ShopfloorSystem> {
    let config = ConfigLoader::load().context("failed to load shopfloor configuration")?;
    bootstrap_with_config(config).await
}

#[cfg(feature = "postgres")]
pub async fn bootstrap_with_config(config: ShopfloorConfig) -> anyhow::Result<ShopfloorSystem> {
    config.validate().context("invalid shopfloor configuration")?;
    init_structured_logging(&config.logging);

    let store = PgEntityStore::connect(&config.database)
        .await
        .context("failed to connect to the production database")?;
    if config.database.run_migrations {
        store.migrate().await.context("failed to apply migrations")?;
    }

    let publisher = Arc::new(EventPublisher::new(config.events.channel_capacity));
    let service = ProductionService::new(Arc::new(store), publisher.clone());

    info!(
        environment = %config.environment,
        max_connections = config.database.max_connections,
        "🚀 Shopfloor engine bootstrapped"
    );

    Ok(ShopfloorSystem {
        config,
        service,
        publisher,
    })
}

/// Bootstrap on the in-memory store, for local runs and tests
pub fn bootstrap_in_memory(config: ShopfloorConfig) -> anyhow::Result<ShopfloorSystem> {
    config.validate().context("invalid shopfloor configuration")?;
    init_structured_logging(&config.logging);

    let publisher = Arc::new(EventPublisher::new(config.events.channel_capacity));
    let service = ProductionService::new(Arc::new(InMemoryEntityStore::new()), publisher.clone());

    info!(environment = %config.environment, "Shopfloor engine bootstrapped in memory");

    Ok(ShopfloorSystem {
        config,
        service,
        publisher,
    })
}
