use crate::{BootcampId, CapabilityId, TechnologyId};

#[derive(Debug, Clone, PartialEq)]
pub enum DeletionEvent {
    DeletionStarted {
        bootcamp_id: BootcampId,
    },
    CapabilitiesEnumerated {
        bootcamp_id: BootcampId,
        capability_count: usize,
    },
    CapabilitySkippedShared {
        capability_id: CapabilityId,
    },
    TechnologyDeleted {
        capability_id: CapabilityId,
        technology_id: TechnologyId,
    },
    TechnologyKept {
        capability_id: CapabilityId,
        technology_id: TechnologyId,
        usage_count: i64,
    },
    CapabilityDeleted {
        capability_id: CapabilityId,
    },
    CapabilityCleanupFailed {
        capability_id: CapabilityId,
        error: String,
    },
    BootcampDeleted {
        bootcamp_id: BootcampId,
        already_deleted: bool,
    },
    DeletionFailed {
        bootcamp_id: BootcampId,
        error: String,
    },
}
