//! Local bootcamp to capability linkage.
//!
//! The deletion workflow only needs three operations from the local store. They are
//! behind a trait so the workflow can be exercised against a store that fails on demand.

use std::sync::Arc;

use async_trait::async_trait;
use core_types::{BootcampId, CapabilityId};
use database::repository_manager::RepositoryManager;

use crate::error::StoreError;

#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Capability ids linked to the bootcamp, empty for an unknown bootcamp
    async fn capability_ids_of(
        &self,
        bootcamp_id: BootcampId,
    ) -> Result<Vec<CapabilityId>, StoreError>;

    /// True when at least one bootcamp other than `excluding_bootcamp_id` links to the
    /// capability
    async fn is_capability_referenced_by_others(
        &self,
        capability_id: CapabilityId,
        excluding_bootcamp_id: BootcampId,
    ) -> Result<bool, StoreError>;

    /// Removes the bootcamp links and then the bootcamp row in one local transaction
    async fn delete_bootcamp_cascade_local(&self, bootcamp_id: BootcampId)
    -> Result<(), StoreError>;
}

/// Production implementation backed by the sqlx repositories
#[derive(Debug, Clone)]
pub struct SqlxRelationshipStore {
    repository_manager: Arc<RepositoryManager>,
}

impl SqlxRelationshipStore {
    pub fn new(repository_manager: Arc<RepositoryManager>) -> Self {
        Self { repository_manager }
    }
}

#[async_trait]
impl RelationshipStore for SqlxRelationshipStore {
    async fn capability_ids_of(
        &self,
        bootcamp_id: BootcampId,
    ) -> Result<Vec<CapabilityId>, StoreError> {
        let ids = self
            .repository_manager
            .get_bootcamp_repository()
            .get_capability_ids_for_bootcamp(bootcamp_id)
            .await?;
        Ok(ids)
    }

    async fn is_capability_referenced_by_others(
        &self,
        capability_id: CapabilityId,
        excluding_bootcamp_id: BootcampId,
    ) -> Result<bool, StoreError> {
        let count = self
            .repository_manager
            .get_bootcamp_repository()
            .count_other_bootcamps_for_capability(capability_id, excluding_bootcamp_id)
            .await?;
        Ok(count > 0)
    }

    async fn delete_bootcamp_cascade_local(
        &self,
        bootcamp_id: BootcampId,
    ) -> Result<(), StoreError> {
        self.repository_manager
            .get_bootcamp_repository()
            .delete_bootcamp(bootcamp_id)
            .await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use database::{helper::AddBootcampParams, setup_test_db};

    use super::*;

    async fn create_store() -> (SqlxRelationshipStore, Arc<RepositoryManager>) {
        let pool = Arc::new(setup_test_db().await);
        let repository_manager = Arc::new(RepositoryManager::new(pool));
        (
            SqlxRelationshipStore::new(repository_manager.clone()),
            repository_manager,
        )
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
    async fn test_capability_ids_of() {
        let (store, repository_manager) = create_store().await;
        let bootcamp_id = add_bootcamp(&repository_manager, "rust", &[3, 1, 2]).await;

        assert_eq!(store.capability_ids_of(bootcamp_id).await.unwrap(), vec![1, 2, 3]);
        assert!(store.capability_ids_of(bootcamp_id + 1).await.unwrap().is_empty());
    }

    #[async_std::test]
    async fn test_is_capability_referenced_by_others_excludes_own_bootcamp() {
        let (store, repository_manager) = create_store().await;
        let first = add_bootcamp(&repository_manager, "first", &[1, 2]).await;
        let second = add_bootcamp(&repository_manager, "second", &[2]).await;

        assert!(!store.is_capability_referenced_by_others(1, first).await.unwrap());
        assert!(store.is_capability_referenced_by_others(2, first).await.unwrap());
        assert!(store.is_capability_referenced_by_others(2, second).await.unwrap());
    }

    #[async_std::test]
    async fn test_delete_bootcamp_cascade_local_is_not_found_the_second_time() {
        let (store, repository_manager) = create_store().await;
        let bootcamp_id = add_bootcamp(&repository_manager, "rust", &[1]).await;

        store.delete_bootcamp_cascade_local(bootcamp_id).await.unwrap();
        let second = store.delete_bootcamp_cascade_local(bootcamp_id).await;

        assert_eq!(second, Err(StoreError::NotFound(bootcamp_id)));
        assert!(store.capability_ids_of(bootcamp_id).await.unwrap().is_empty());
    }
}
