use std::sync::Arc;

use async_std::channel::{Receiver, Sender};
use capability_client::CapabilityResourceOps;
use core_types::{BootcampId, DeletionState, events::DeletionEvent};

use crate::{
    bootcamp_deletion::{context::BootcampDeletionContext, model::DeletionReport},
    error::Error,
    pipeline::generic_pipeline::Pipeline,
    relationship_store::RelationshipStore,
};

pub const DEFAULT_MAX_CONCURRENT_CAPABILITIES: usize = 4;

/// Deletes a bootcamp and garbage collects the capabilities and technologies only it
/// was using.
///
/// Success means the bootcamp and its local links are gone. Remote cleanup is best
/// effort; its outcome per capability is in the returned [`DeletionReport`].
///
/// Reference counts are point-in-time reads with no lock spanning the local store and
/// the capability service, so two deletions racing on a shared capability can both see
/// it as unreferenced. Remote deletes being idempotent keeps that wasteful rather than
/// harmful.
pub struct BootcampDeletionService {
    store: Arc<dyn RelationshipStore>,
    capability_ops: Arc<dyn CapabilityResourceOps>,
    max_concurrent_capabilities: usize,
}

impl BootcampDeletionService {
    pub fn new(
        store: Arc<dyn RelationshipStore>,
        capability_ops: Arc<dyn CapabilityResourceOps>,
    ) -> Self {
        Self {
            store,
            capability_ops,
            max_concurrent_capabilities: DEFAULT_MAX_CONCURRENT_CAPABILITIES,
        }
    }

    pub fn with_max_concurrent_capabilities(mut self, max_concurrent_capabilities: usize) -> Self {
        self.max_concurrent_capabilities = max_concurrent_capabilities.max(1);
        self
    }

    pub async fn delete_bootcamp(
        &self,
        bootcamp_id: BootcampId,
        trace_id: &str,
    ) -> Result<DeletionReport, Error> {
        self.delete_bootcamp_with_progress(bootcamp_id, trace_id, None, None)
            .await
    }

    /// Like [`delete_bootcamp`](Self::delete_bootcamp), reporting progress on
    /// `progress_tx`. A message on `cancel_rx` stops new capabilities from being
    /// started; the bootcamp itself is still deleted.
    #[tracing::instrument(skip(self, progress_tx, cancel_rx), err)]
    pub async fn delete_bootcamp_with_progress(
        &self,
        bootcamp_id: BootcampId,
        trace_id: &str,
        progress_tx: Option<Sender<DeletionEvent>>,
        cancel_rx: Option<Receiver<()>>,
    ) -> Result<DeletionReport, Error> {
        tracing::info!("Starting deletion of bootcamp {}", bootcamp_id);

        let mut context = BootcampDeletionContext::new(
            bootcamp_id,
            trace_id,
            self.store.clone(),
            self.capability_ops.clone(),
            self.max_concurrent_capabilities,
        )
        .with_progress(progress_tx)
        .with_cancellation(cancel_rx);

        context
            .send_event(DeletionEvent::DeletionStarted { bootcamp_id })
            .await;

        let pipeline = Pipeline::<BootcampDeletionContext>::new();
        if let Err(error) = pipeline.execute(&mut context).await {
            context.transition_to(DeletionState::Failed);
            context
                .send_event(DeletionEvent::DeletionFailed {
                    bootcamp_id,
                    error: error.to_string(),
                })
                .await;
            return Err(error);
        }

        let report = context.to_report();
        tracing::info!(
            deleted = report.deleted_capabilities().len(),
            shared = report.shared_capabilities().len(),
            failed = report.failed_capabilities().len(),
            not_started = report.not_started_capabilities().len(),
            "Bootcamp {} deletion {}",
            bootcamp_id,
            report.state
        );
        Ok(report)
    }
}
