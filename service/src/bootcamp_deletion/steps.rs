use core_types::{DeletionState, events::DeletionEvent};
use futures::{StreamExt, stream};

use crate::{
    bootcamp_deletion::{
        capability_cleanup::CapabilityCleanup, context::BootcampDeletionContext,
        model::CapabilityOutcome,
    },
    error::{Error, StoreError},
    pipeline::pipeline_step::{PipelineStep, StepAction},
};

/// Step 1: Read the capability ids linked to the bootcamp
pub struct EnumerateCapabilitiesStep;

#[async_trait::async_trait]
impl PipelineStep<BootcampDeletionContext> for EnumerateCapabilitiesStep {
    fn name(&self) -> &'static str {
        "enumerate_capabilities"
    }

    async fn execute(&self, context: &mut BootcampDeletionContext) -> StepAction {
        context.transition_to(DeletionState::EnumeratingCapabilities);

        match context.store.capability_ids_of(context.bootcamp_id).await {
            Ok(capability_ids) => {
                tracing::info!(
                    trace_id = %context.trace_id,
                    "Bootcamp {} links {} capabilities",
                    context.bootcamp_id,
                    capability_ids.len()
                );
                context
                    .send_event(DeletionEvent::CapabilitiesEnumerated {
                        bootcamp_id: context.bootcamp_id,
                        capability_count: capability_ids.len(),
                    })
                    .await;
                context.capability_ids = capability_ids;
                StepAction::Continue
            }
            Err(e) => {
                tracing::error!(
                    trace_id = %context.trace_id,
                    "Failed to enumerate capabilities of bootcamp {}: {}",
                    context.bootcamp_id,
                    e
                );
                StepAction::Abort(Error::CapabilityEnumerationFailed {
                    bootcamp_id: context.bootcamp_id,
                    error: e,
                })
            }
        }
    }
}

/// Step 2: Clean up capabilities that no other bootcamp links to.
///
/// Capabilities are processed concurrently; failures are recorded per capability and
/// never abort the pipeline.
pub struct CleanupCapabilitiesStep;

#[async_trait::async_trait]
impl PipelineStep<BootcampDeletionContext> for CleanupCapabilitiesStep {
    fn name(&self) -> &'static str {
        "cleanup_capabilities"
    }

    fn should_execute(&self, context: &BootcampDeletionContext) -> bool {
        !context.capability_ids.is_empty()
    }

    async fn execute(&self, context: &mut BootcampDeletionContext) -> StepAction {
        context.transition_to(DeletionState::ProcessingCapabilities);

        let cleanup = CapabilityCleanup {
            bootcamp_id: context.bootcamp_id,
            trace_id: &context.trace_id,
            store: context.store.as_ref(),
            capability_ops: context.capability_ops.as_ref(),
            progress_tx: context.progress_tx.as_ref(),
        };
        let cancellation = &context.cancellation;

        let outcomes: Vec<_> = stream::iter(context.capability_ids.iter().copied())
            .map(|capability_id| {
                let cleanup = &cleanup;
                async move {
                    // a cancelled deletion finishes in-flight capabilities but starts no new ones
                    if cancellation.is_cancelled() {
                        tracing::info!(
                            trace_id = cleanup.trace_id,
                            "Deletion cancelled, not starting capability {}",
                            capability_id
                        );
                        return (capability_id, CapabilityOutcome::NotStarted);
                    }
                    (capability_id, cleanup.run(capability_id).await)
                }
            })
            .buffer_unordered(context.max_concurrent_capabilities)
            .collect()
            .await;

        context.outcomes.extend(outcomes);

        let failed = context
            .outcomes
            .values()
            .filter(|outcome| matches!(outcome, CapabilityOutcome::Failed { .. }))
            .count();
        tracing::info!(
            trace_id = %context.trace_id,
            capabilities = context.outcomes.len(),
            failed,
            "Capability cleanup finished for bootcamp {}",
            context.bootcamp_id
        );

        StepAction::Continue
    }
}

/// Step 3: Delete the bootcamp row and its links from the local store
///
/// Runs regardless of capability cleanup failures: an orphaned remote capability is
/// acceptable, an orphaned local bootcamp is not.
pub struct DeleteBootcampStep;

#[async_trait::async_trait]
impl PipelineStep<BootcampDeletionContext> for DeleteBootcampStep {
    fn name(&self) -> &'static str {
        "delete_bootcamp"
    }

    async fn execute(&self, context: &mut BootcampDeletionContext) -> StepAction {
        context.transition_to(DeletionState::DeletingBootcamp);

        match context
            .store
            .delete_bootcamp_cascade_local(context.bootcamp_id)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    trace_id = %context.trace_id,
                    "Deleted bootcamp {} and its capability links",
                    context.bootcamp_id
                );
            }
            Err(StoreError::NotFound(_)) => {
                tracing::warn!(
                    trace_id = %context.trace_id,
                    "Bootcamp {} was already deleted",
                    context.bootcamp_id
                );
                context.bootcamp_already_deleted = true;
            }
            Err(e) => {
                tracing::error!(
                    trace_id = %context.trace_id,
                    "Failed to delete bootcamp {}: {}",
                    context.bootcamp_id,
                    e
                );
                return StepAction::Abort(Error::BootcampDeletionFailed {
                    bootcamp_id: context.bootcamp_id,
                    error: e,
                });
            }
        }

        context.transition_to(DeletionState::Completed);
        context
            .send_event(DeletionEvent::BootcampDeleted {
                bootcamp_id: context.bootcamp_id,
                already_deleted: context.bootcamp_already_deleted,
            })
            .await;
        StepAction::Continue
    }
}
