use std::sync::{Arc, OnceLock};

use capability_client::{CapabilityResourceOps, HttpCapabilityClient};
use database::{get_db_pool, repository_manager::RepositoryManager};

use crate::{
    bootcamp_deletion::service::BootcampDeletionService,
    bootcamp_metrics_service::BootcampMetricsService, error::Error,
    relationship_store::{RelationshipStore, SqlxRelationshipStore},
    settings::Settings,
};

pub async fn create_app_services(settings: Settings) -> Result<Arc<AppServices>, Error> {
    let pool = get_db_pool(&settings.database_url).await?;
    let repository_manager = Arc::new(RepositoryManager::new(pool));
    let capability_ops: Arc<dyn CapabilityResourceOps> = Arc::new(HttpCapabilityClient::new(
        settings.capability_client_config(),
    )?);

    Ok(Arc::new(AppServices::new(
        repository_manager,
        capability_ops,
        Arc::new(settings),
    )))
}

pub struct AppServices {
    bootcamp_deletion: OnceLock<Arc<BootcampDeletionService>>,
    bootcamp_metrics: OnceLock<Arc<BootcampMetricsService>>,
    repository_manager: Arc<RepositoryManager>,
    store: Arc<dyn RelationshipStore>,
    capability_ops: Arc<dyn CapabilityResourceOps>,
    app_settings: Arc<Settings>,
}

impl AppServices {
    pub fn new(
        repository_manager: Arc<RepositoryManager>,
        capability_ops: Arc<dyn CapabilityResourceOps>,
        settings: Arc<Settings>,
    ) -> Self {
        let store: Arc<dyn RelationshipStore> =
            Arc::new(SqlxRelationshipStore::new(Arc::clone(&repository_manager)));
        Self {
            bootcamp_deletion: OnceLock::new(),
            bootcamp_metrics: OnceLock::new(),
            repository_manager,
            store,
            capability_ops,
            app_settings: settings,
        }
    }

    pub fn bootcamp_deletion(&self) -> Arc<BootcampDeletionService> {
        self.bootcamp_deletion
            .get_or_init(|| {
                Arc::new(
                    BootcampDeletionService::new(
                        Arc::clone(&self.store),
                        Arc::clone(&self.capability_ops),
                    )
                    .with_max_concurrent_capabilities(
                        self.app_settings.max_concurrent_capabilities,
                    ),
                )
            })
            .clone()
    }

    pub fn bootcamp_metrics(&self) -> Arc<BootcampMetricsService> {
        self.bootcamp_metrics
            .get_or_init(|| {
                Arc::new(BootcampMetricsService::new(
                    Arc::clone(&self.repository_manager),
                    Arc::clone(&self.store),
                    Arc::clone(&self.capability_ops),
                ))
            })
            .clone()
    }
}
