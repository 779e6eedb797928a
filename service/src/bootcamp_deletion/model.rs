use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use capability_client::GatewayError;
use core_types::{BootcampId, CapabilityId, DeletionState, TechnologyId};

use crate::error::{CapabilityFailure, Error, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub enum CleanupFailure {
    Store(StoreError),
    Gateway(GatewayError),
}

impl Display for CleanupFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanupFailure::Store(error) => write!(f, "{}", error),
            CleanupFailure::Gateway(error) => write!(f, "{}", error),
        }
    }
}

/// What happened to one capability of the deleted bootcamp.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityOutcome {
    /// Capability was removed from the capability service, together with the
    /// technologies only it referenced
    Deleted {
        deleted_technologies: Vec<TechnologyId>,
        kept_technologies: Vec<TechnologyId>,
    },
    /// Another bootcamp still links to the capability; nothing was touched
    Shared,
    /// Cleanup stopped at `error`. Technologies deleted before the failure stay deleted.
    Failed {
        error: CleanupFailure,
        deleted_technologies: Vec<TechnologyId>,
    },
    /// Deletion was cancelled before this capability was started
    NotStarted,
}

impl CapabilityOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, CapabilityOutcome::Deleted { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletionReport {
    pub bootcamp_id: BootcampId,
    pub trace_id: String,
    pub state: DeletionState,
    /// The bootcamp row was already gone when the local delete ran
    pub bootcamp_already_deleted: bool,
    pub outcomes: BTreeMap<CapabilityId, CapabilityOutcome>,
}

impl DeletionReport {
    pub fn deleted_capabilities(&self) -> Vec<CapabilityId> {
        self.capabilities_where(|outcome| outcome.is_deleted())
    }

    pub fn shared_capabilities(&self) -> Vec<CapabilityId> {
        self.capabilities_where(|outcome| matches!(outcome, CapabilityOutcome::Shared))
    }

    pub fn not_started_capabilities(&self) -> Vec<CapabilityId> {
        self.capabilities_where(|outcome| matches!(outcome, CapabilityOutcome::NotStarted))
    }

    pub fn failed_capabilities(&self) -> Vec<CapabilityFailure> {
        self.outcomes
            .iter()
            .filter_map(|(capability_id, outcome)| match outcome {
                CapabilityOutcome::Failed { error, .. } => Some(CapabilityFailure {
                    capability_id: *capability_id,
                    reason: error.to_string(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_technologies(&self) -> Vec<TechnologyId> {
        let mut technologies: Vec<TechnologyId> = self
            .outcomes
            .values()
            .flat_map(|outcome| match outcome {
                CapabilityOutcome::Deleted {
                    deleted_technologies,
                    ..
                }
                | CapabilityOutcome::Failed {
                    deleted_technologies,
                    ..
                } => deleted_technologies.clone(),
                _ => vec![],
            })
            .collect();
        technologies.sort_unstable();
        technologies
    }

    /// True when every capability was either deleted or is still shared
    pub fn is_fully_cleaned(&self) -> bool {
        self.outcomes.values().all(|outcome| {
            matches!(
                outcome,
                CapabilityOutcome::Deleted { .. } | CapabilityOutcome::Shared
            )
        })
    }

    /// For callers that need confirmation of the downstream cleanup and not only of the
    /// bootcamp removal.
    pub fn ensure_fully_cleaned(self) -> Result<Self, Error> {
        if self.is_fully_cleaned() {
            return Ok(self);
        }

        let mut failed_capabilities = self.failed_capabilities();
        failed_capabilities.extend(self.not_started_capabilities().into_iter().map(
            |capability_id| CapabilityFailure {
                capability_id,
                reason: "cancelled before cleanup started".to_string(),
            },
        ));
        failed_capabilities.sort_by_key(|failure| failure.capability_id);

        Err(Error::IncompleteCleanup {
            bootcamp_id: self.bootcamp_id,
            failed_capabilities,
        })
    }

    fn capabilities_where(&self, predicate: impl Fn(&CapabilityOutcome) -> bool) -> Vec<CapabilityId> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .map(|(capability_id, _)| *capability_id)
            .collect()
    }
}
