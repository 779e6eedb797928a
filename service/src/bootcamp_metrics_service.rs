use std::collections::BTreeSet;
use std::sync::Arc;

use capability_client::CapabilityResourceOps;
use core_types::{BootcampId, BootcampMetrics};
use database::{database_error::DatabaseError, repository_manager::RepositoryManager};
use futures::future::try_join_all;

use crate::{error::Error, relationship_store::RelationshipStore};

/// Read-only counts for a single bootcamp. Never deletes anything.
pub struct BootcampMetricsService {
    repository_manager: Arc<RepositoryManager>,
    store: Arc<dyn RelationshipStore>,
    capability_ops: Arc<dyn CapabilityResourceOps>,
}

impl BootcampMetricsService {
    pub fn new(
        repository_manager: Arc<RepositoryManager>,
        store: Arc<dyn RelationshipStore>,
        capability_ops: Arc<dyn CapabilityResourceOps>,
    ) -> Self {
        Self {
            repository_manager,
            store,
            capability_ops,
        }
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn collect(
        &self,
        bootcamp_id: BootcampId,
        trace_id: &str,
    ) -> Result<BootcampMetrics, Error> {
        if self
            .repository_manager
            .get_bootcamp_repository()
            .get_bootcamp(bootcamp_id)
            .await?
            .is_none()
        {
            return Err(DatabaseError::BootcampNotFound(bootcamp_id).into());
        }

        let capability_ids = self.store.capability_ids_of(bootcamp_id).await?;

        let mut shared_capability_count = 0;
        for capability_id in &capability_ids {
            if self
                .store
                .is_capability_referenced_by_others(*capability_id, bootcamp_id)
                .await?
            {
                shared_capability_count += 1;
            }
        }

        let technology_lists = try_join_all(
            capability_ids
                .iter()
                .map(|capability_id| self.capability_ops.technology_ids_of(*capability_id, trace_id)),
        )
        .await?;
        let technologies: BTreeSet<_> = technology_lists.into_iter().flatten().collect();

        let enrollment_count = self
            .repository_manager
            .get_enrollment_repository()
            .count_enrollments_for_bootcamp(bootcamp_id)
            .await?;

        let metrics = BootcampMetrics {
            bootcamp_id,
            capability_count: capability_ids.len() as i64,
            shared_capability_count,
            technology_count: technologies.len() as i64,
            enrollment_count,
        };
        tracing::debug!(?metrics, "Collected metrics for bootcamp {}", bootcamp_id);
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use capability_client::{
        GatewayError,
        mock::{MockCapabilityService, MockOperation},
    };
    use database::{helper::AddBootcampParams, setup_test_db};

    use super::*;
    use crate::relationship_store::SqlxRelationshipStore;

    async fn setup() -> (
        BootcampMetricsService,
        Arc<RepositoryManager>,
        MockCapabilityService,
    ) {
        let pool = Arc::new(setup_test_db().await);
        let repository_manager = Arc::new(RepositoryManager::new(pool));
        let capability_ops = MockCapabilityService::new();
        let service = BootcampMetricsService::new(
            repository_manager.clone(),
            Arc::new(SqlxRelationshipStore::new(repository_manager.clone())),
            Arc::new(capability_ops.clone()),
        );
        (service, repository_manager, capability_ops)
    }

    async fn add_bootcamp(
        repository_manager: &RepositoryManager,
        name: &str,
        capability_ids: &[i64],
    ) -> i64 {
        repository_manager
            .get_bootcamp_repository()
            .add_bootcamp(AddBootcampParams {
                name,
                description: "",
                capability_ids,
            })
            .await
            .unwrap()
    }

    #[async_std::test]
    async fn test_collect() {
        let (service, repository_manager, capability_ops) = setup().await;
        capability_ops.add_capability(1, &[10, 11]);
        capability_ops.add_capability(2, &[11, 12]);
        capability_ops.add_capability(3, &[]);
        let bootcamp_id = add_bootcamp(&repository_manager, "rust", &[1, 2, 3]).await;
        add_bootcamp(&repository_manager, "go", &[2]).await;
        let enrollments = repository_manager.get_enrollment_repository();
        enrollments.add_enrollment(bootcamp_id, 100).await.unwrap();
        enrollments.add_enrollment(bootcamp_id, 101).await.unwrap();

        let metrics = service.collect(bootcamp_id, "trace-m").await.unwrap();

        assert_eq!(
            metrics,
            BootcampMetrics {
                bootcamp_id,
                capability_count: 3,
                shared_capability_count: 1,
                technology_count: 3,
                enrollment_count: 2,
            }
        );
        assert_eq!(capability_ops.delete_call_count(), 0);
        assert_eq!(capability_ops.trace_ids(), vec!["trace-m".to_string()]);
    }

    #[async_std::test]
    async fn test_collect_unknown_bootcamp() {
        let (service, _, capability_ops) = setup().await;

        let result = service.collect(42, "trace-m").await;

        assert!(matches!(result, Err(Error::DbError(_))));
        assert!(capability_ops.trace_ids().is_empty());
    }

    #[async_std::test]
    async fn test_collect_propagates_capability_service_failure() {
        let (service, repository_manager, capability_ops) = setup().await;
        capability_ops.add_capability(1, &[10]);
        capability_ops.fail(
            MockOperation::TechnologyIdsOf,
            1,
            GatewayError::Unreachable("connection refused".to_string()),
        );
        let bootcamp_id = add_bootcamp(&repository_manager, "rust", &[1]).await;

        let result = service.collect(bootcamp_id, "trace-m").await;

        assert!(matches!(result, Err(Error::CapabilityServiceError(_))));
    }
}
