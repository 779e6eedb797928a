use async_std::channel::Sender;
use capability_client::{CapabilityResourceOps, GatewayError};
use core_types::{BootcampId, CapabilityId, TechnologyId, events::DeletionEvent};

use crate::{
    bootcamp_deletion::{
        context::send_event,
        model::{CapabilityOutcome, CleanupFailure},
    },
    relationship_store::RelationshipStore,
};

/// Cleans up one capability of a bootcamp that is being deleted.
///
/// The capability is kept when another bootcamp links to it. Otherwise each of its
/// technologies is deleted when this capability is its only user, and the capability
/// itself is deleted last. The first failure ends the cleanup of this capability.
pub struct CapabilityCleanup<'a> {
    pub bootcamp_id: BootcampId,
    pub trace_id: &'a str,
    pub store: &'a dyn RelationshipStore,
    pub capability_ops: &'a dyn CapabilityResourceOps,
    pub progress_tx: Option<&'a Sender<DeletionEvent>>,
}

impl CapabilityCleanup<'_> {
    pub async fn run(&self, capability_id: CapabilityId) -> CapabilityOutcome {
        let referenced = match self
            .store
            .is_capability_referenced_by_others(capability_id, self.bootcamp_id)
            .await
        {
            Ok(referenced) => referenced,
            Err(e) => {
                return self
                    .failed(capability_id, CleanupFailure::Store(e), vec![])
                    .await;
            }
        };

        if referenced {
            tracing::info!(
                trace_id = self.trace_id,
                "Capability {} is linked to other bootcamps, keeping it",
                capability_id
            );
            send_event(
                self.progress_tx,
                DeletionEvent::CapabilitySkippedShared { capability_id },
            )
            .await;
            return CapabilityOutcome::Shared;
        }

        let technology_ids = match self
            .capability_ops
            .technology_ids_of(capability_id, self.trace_id)
            .await
        {
            Ok(ids) => ids,
            Err(e) => {
                return self
                    .failed(capability_id, CleanupFailure::Gateway(e), vec![])
                    .await;
            }
        };

        let mut deleted_technologies = Vec::new();
        let mut kept_technologies = Vec::new();

        for technology_id in technology_ids {
            match self.cleanup_technology(capability_id, technology_id).await {
                Ok(true) => deleted_technologies.push(technology_id),
                Ok(false) => kept_technologies.push(technology_id),
                Err(e) => {
                    return self
                        .failed(capability_id, CleanupFailure::Gateway(e), deleted_technologies)
                        .await;
                }
            }
        }

        match self
            .capability_ops
            .delete_capability(capability_id, self.trace_id)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    trace_id = self.trace_id,
                    "Deleted capability {}",
                    capability_id
                );
            }
            Err(GatewayError::NotFound(_)) => {
                tracing::info!(
                    trace_id = self.trace_id,
                    "Capability {} was already deleted",
                    capability_id
                );
            }
            Err(e) => {
                return self
                    .failed(capability_id, CleanupFailure::Gateway(e), deleted_technologies)
                    .await;
            }
        }

        send_event(
            self.progress_tx,
            DeletionEvent::CapabilityDeleted { capability_id },
        )
        .await;

        CapabilityOutcome::Deleted {
            deleted_technologies,
            kept_technologies,
        }
    }

    /// Returns whether the technology was deleted.
    async fn cleanup_technology(
        &self,
        capability_id: CapabilityId,
        technology_id: TechnologyId,
    ) -> Result<bool, GatewayError> {
        let usage_count = self
            .capability_ops
            .technology_usage_count(technology_id, self.trace_id)
            .await?;

        if usage_count != 1 {
            tracing::info!(
                trace_id = self.trace_id,
                "Technology {} is used by {} capabilities, keeping it",
                technology_id,
                usage_count
            );
            send_event(
                self.progress_tx,
                DeletionEvent::TechnologyKept {
                    capability_id,
                    technology_id,
                    usage_count,
                },
            )
            .await;
            return Ok(false);
        }

        match self
            .capability_ops
            .delete_technology(technology_id, self.trace_id)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    trace_id = self.trace_id,
                    "Deleted technology {} of capability {}",
                    technology_id,
                    capability_id
                );
            }
            Err(GatewayError::NotFound(_)) => {
                tracing::info!(
                    trace_id = self.trace_id,
                    "Technology {} was already deleted",
                    technology_id
                );
            }
            Err(e) => return Err(e),
        }

        send_event(
            self.progress_tx,
            DeletionEvent::TechnologyDeleted {
                capability_id,
                technology_id,
            },
        )
        .await;
        Ok(true)
    }

    async fn failed(
        &self,
        capability_id: CapabilityId,
        error: CleanupFailure,
        deleted_technologies: Vec<TechnologyId>,
    ) -> CapabilityOutcome {
        tracing::error!(
            trace_id = self.trace_id,
            "Cleanup of capability {} failed: {}",
            capability_id,
            error
        );
        send_event(
            self.progress_tx,
            DeletionEvent::CapabilityCleanupFailed {
                capability_id,
                error: error.to_string(),
            },
        )
        .await;
        CapabilityOutcome::Failed {
            error,
            deleted_technologies,
        }
    }
}
