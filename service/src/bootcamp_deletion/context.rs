use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_std::channel::{Receiver, Sender, TryRecvError};
use capability_client::CapabilityResourceOps;
use core_types::{BootcampId, CapabilityId, DeletionState, events::DeletionEvent};

use crate::{
    bootcamp_deletion::model::{CapabilityOutcome, DeletionReport},
    relationship_store::RelationshipStore,
};

/// Latches the first cancellation message received on the channel.
///
/// Only an explicit message cancels; dropping the sender does not.
#[derive(Debug, Default)]
pub struct CancellationSignal {
    cancel_rx: Option<Receiver<()>>,
    cancelled: AtomicBool,
}

impl CancellationSignal {
    pub fn new(cancel_rx: Option<Receiver<()>>) -> Self {
        Self {
            cancel_rx,
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        let Some(cancel_rx) = &self.cancel_rx else {
            return false;
        };
        match cancel_rx.try_recv() {
            Ok(()) => {
                self.cancelled.store(true, Ordering::SeqCst);
                true
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => false,
        }
    }
}

/// Context object that flows through the deletion pipeline, accumulating state
pub struct BootcampDeletionContext {
    pub bootcamp_id: BootcampId,
    pub trace_id: String,
    pub store: Arc<dyn RelationshipStore>,
    pub capability_ops: Arc<dyn CapabilityResourceOps>,
    pub max_concurrent_capabilities: usize,
    pub progress_tx: Option<Sender<DeletionEvent>>,
    pub cancellation: CancellationSignal,

    // Accumulated state as pipeline progresses
    pub state: DeletionState,
    pub capability_ids: Vec<CapabilityId>,
    pub outcomes: BTreeMap<CapabilityId, CapabilityOutcome>,
    pub bootcamp_already_deleted: bool,
}

impl BootcampDeletionContext {
    pub fn new(
        bootcamp_id: BootcampId,
        trace_id: &str,
        store: Arc<dyn RelationshipStore>,
        capability_ops: Arc<dyn CapabilityResourceOps>,
        max_concurrent_capabilities: usize,
    ) -> Self {
        Self {
            bootcamp_id,
            trace_id: trace_id.to_string(),
            store,
            capability_ops,
            max_concurrent_capabilities: max_concurrent_capabilities.max(1),
            progress_tx: None,
            cancellation: CancellationSignal::default(),
            state: DeletionState::Started,
            capability_ids: vec![],
            outcomes: BTreeMap::new(),
            bootcamp_already_deleted: false,
        }
    }

    pub fn with_progress(mut self, progress_tx: Option<Sender<DeletionEvent>>) -> Self {
        self.progress_tx = progress_tx;
        self
    }

    pub fn with_cancellation(mut self, cancel_rx: Option<Receiver<()>>) -> Self {
        self.cancellation = CancellationSignal::new(cancel_rx);
        self
    }

    pub fn transition_to(&mut self, state: DeletionState) {
        tracing::debug!(
            bootcamp_id = self.bootcamp_id,
            trace_id = %self.trace_id,
            "Deletion state {} -> {}",
            self.state,
            state
        );
        self.state = state;
    }

    pub async fn send_event(&self, event: DeletionEvent) {
        send_event(self.progress_tx.as_ref(), event).await;
    }

    pub fn to_report(&self) -> DeletionReport {
        DeletionReport {
            bootcamp_id: self.bootcamp_id,
            trace_id: self.trace_id.clone(),
            state: self.state,
            bootcamp_already_deleted: self.bootcamp_already_deleted,
            outcomes: self.outcomes.clone(),
        }
    }
}

pub async fn send_event(progress_tx: Option<&Sender<DeletionEvent>>, event: DeletionEvent) {
    if let Some(tx) = progress_tx {
        tx.send(event).await.ok();
    }
}

#[cfg(test)]
mod tests {
    use async_std::channel::unbounded;

    use super::*;

    #[test]
    fn test_cancellation_without_channel_never_cancels() {
        let signal = CancellationSignal::new(None);
        assert!(!signal.is_cancelled());
    }

    #[test]
    fn test_cancellation_latches_first_message() {
        let (cancel_tx, cancel_rx) = unbounded::<()>();
        let signal = CancellationSignal::new(Some(cancel_rx));

        assert!(!signal.is_cancelled());
        cancel_tx.try_send(()).unwrap();
        assert!(signal.is_cancelled());
        // message was consumed, the latch keeps reporting cancellation
        assert!(signal.is_cancelled());
    }

    #[test]
    fn test_dropped_sender_does_not_cancel() {
        let (cancel_tx, cancel_rx) = unbounded::<()>();
        let signal = CancellationSignal::new(Some(cancel_rx));
        drop(cancel_tx);
        assert!(!signal.is_cancelled());
    }
}
