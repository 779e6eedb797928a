pub mod events;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

pub type BootcampId = i64;
pub type CapabilityId = i64;
pub type TechnologyId = i64;

/// Lifecycle of a single bootcamp deletion request.
///
/// `Completed` and `Failed` are terminal. A request moves forward only; there
/// is no transition back to an earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum DeletionState {
    Started,
    #[strum(serialize = "Enumerating Capabilities")]
    EnumeratingCapabilities,
    #[strum(serialize = "Processing Capabilities")]
    ProcessingCapabilities,
    #[strum(serialize = "Deleting Bootcamp")]
    DeletingBootcamp,
    Completed,
    Failed,
}

impl DeletionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeletionState::Completed | DeletionState::Failed)
    }
}

/// Counts used to size report metrics for one bootcamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootcampMetrics {
    pub bootcamp_id: BootcampId,
    pub capability_count: i64,
    /// Capabilities that at least one other bootcamp also links to.
    pub shared_capability_count: i64,
    /// Distinct technologies across all capabilities of the bootcamp.
    pub technology_count: i64,
    pub enrollment_count: i64,
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_only_completed_and_failed_are_terminal() {
        let terminal: Vec<DeletionState> =
            DeletionState::iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(
            terminal,
            vec![DeletionState::Completed, DeletionState::Failed]
        );
    }

    #[test]
    fn test_deletion_state_display() {
        assert_eq!(
            DeletionState::EnumeratingCapabilities.to_string(),
            "Enumerating Capabilities"
        );
        assert_eq!(DeletionState::Completed.to_string(), "Completed");
    }

    #[test]
    fn test_metrics_serialize_as_flat_json() {
        let metrics = BootcampMetrics {
            bootcamp_id: 7,
            capability_count: 2,
            shared_capability_count: 1,
            technology_count: 5,
            enrollment_count: 30,
        };
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["bootcamp_id"], 7);
        assert_eq!(json["technology_count"], 5);
    }
}
