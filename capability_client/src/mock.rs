use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use core_types::{CapabilityId, TechnologyId};

use crate::{GatewayError, ops::CapabilityResourceOps};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    TechnologyIdsOf,
    TechnologyUsageCount,
    DeleteCapability,
    DeleteTechnology,
}

/// Internal state for MockCapabilityService.
///
/// Groups all mutable state into a single struct for simplified locking.
#[derive(Default)]
struct MockState {
    /// capability id -> technologies linked to it
    capabilities: BTreeMap<CapabilityId, BTreeSet<TechnologyId>>,
    technologies: BTreeSet<TechnologyId>,
    /// Every delete call in the order it was received, including failed ones
    capability_delete_calls: Vec<CapabilityId>,
    technology_delete_calls: Vec<TechnologyId>,
    deleted_capabilities: Vec<CapabilityId>,
    deleted_technologies: Vec<TechnologyId>,
    /// Operations that should fail for a specific id
    failures: HashMap<(MockOperation, i64), GatewayError>,
    trace_ids: BTreeSet<String>,
}

/// Mock implementation of CapabilityResourceOps for testing
///
/// This mock allows you to:
/// - Build a capability/technology graph that usage counts are derived from
/// - Test failure scenarios per operation and id
/// - Verify which deletions were attempted and performed
#[derive(Clone, Default)]
pub struct MockCapabilityService {
    state: Arc<Mutex<MockState>>,
}

impl MockCapabilityService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a capability linked to the given technologies, creating missing technologies
    pub fn add_capability(&self, capability_id: CapabilityId, technology_ids: &[TechnologyId]) {
        let mut state = self.state.lock().unwrap();
        state.technologies.extend(technology_ids.iter().copied());
        state
            .capabilities
            .entry(capability_id)
            .or_default()
            .extend(technology_ids.iter().copied());
    }

    /// Make an operation fail for a specific capability or technology id
    pub fn fail(&self, operation: MockOperation, id: i64, error: GatewayError) {
        let mut state = self.state.lock().unwrap();
        state.failures.insert((operation, id), error);
    }

    pub fn has_capability(&self, capability_id: CapabilityId) -> bool {
        let state = self.state.lock().unwrap();
        state.capabilities.contains_key(&capability_id)
    }

    pub fn has_technology(&self, technology_id: TechnologyId) -> bool {
        let state = self.state.lock().unwrap();
        state.technologies.contains(&technology_id)
    }

    pub fn deleted_capabilities(&self) -> Vec<CapabilityId> {
        let state = self.state.lock().unwrap();
        state.deleted_capabilities.clone()
    }

    pub fn deleted_technologies(&self) -> Vec<TechnologyId> {
        let state = self.state.lock().unwrap();
        state.deleted_technologies.clone()
    }

    /// Number of delete calls received for the capability, successful or not
    pub fn capability_delete_calls(&self, capability_id: CapabilityId) -> usize {
        let state = self.state.lock().unwrap();
        state
            .capability_delete_calls
            .iter()
            .filter(|id| **id == capability_id)
            .count()
    }

    /// Number of delete calls received for the technology, successful or not
    pub fn technology_delete_calls(&self, technology_id: TechnologyId) -> usize {
        let state = self.state.lock().unwrap();
        state
            .technology_delete_calls
            .iter()
            .filter(|id| **id == technology_id)
            .count()
    }

    /// Total number of delete calls of any kind
    pub fn delete_call_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.capability_delete_calls.len() + state.technology_delete_calls.len()
    }

    /// Trace ids seen on any call
    pub fn trace_ids(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.trace_ids.iter().cloned().collect()
    }

    /// Clear all state (useful between tests)
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        *state = MockState::default();
    }
}

impl MockState {
    fn check_failure(&self, operation: MockOperation, id: i64) -> Result<(), GatewayError> {
        match self.failures.get(&(operation, id)) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CapabilityResourceOps for MockCapabilityService {
    async fn technology_ids_of(
        &self,
        capability_id: CapabilityId,
        trace_id: &str,
    ) -> Result<Vec<TechnologyId>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.trace_ids.insert(trace_id.to_string());
        state.check_failure(MockOperation::TechnologyIdsOf, capability_id)?;

        state
            .capabilities
            .get(&capability_id)
            .map(|technologies| technologies.iter().copied().collect())
            .ok_or_else(|| GatewayError::NotFound(format!("capability {}", capability_id)))
    }

    async fn technology_usage_count(
        &self,
        technology_id: TechnologyId,
        trace_id: &str,
    ) -> Result<i64, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.trace_ids.insert(trace_id.to_string());
        state.check_failure(MockOperation::TechnologyUsageCount, technology_id)?;

        let count = state
            .capabilities
            .values()
            .filter(|technologies| technologies.contains(&technology_id))
            .count();
        Ok(count as i64)
    }

    async fn delete_capability(
        &self,
        capability_id: CapabilityId,
        trace_id: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.trace_ids.insert(trace_id.to_string());
        state.capability_delete_calls.push(capability_id);
        state.check_failure(MockOperation::DeleteCapability, capability_id)?;

        if state.capabilities.remove(&capability_id).is_none() {
            return Err(GatewayError::NotFound(format!(
                "capability {}",
                capability_id
            )));
        }
        state.deleted_capabilities.push(capability_id);
        Ok(())
    }

    async fn delete_technology(
        &self,
        technology_id: TechnologyId,
        trace_id: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.trace_ids.insert(trace_id.to_string());
        state.technology_delete_calls.push(technology_id);
        state.check_failure(MockOperation::DeleteTechnology, technology_id)?;

        if !state.technologies.remove(&technology_id) {
            return Err(GatewayError::NotFound(format!(
                "technology {}",
                technology_id
            )));
        }
        // the remote side drops the capability links of a deleted technology
        for technologies in state.capabilities.values_mut() {
            technologies.remove(&technology_id);
        }
        state.deleted_technologies.push(technology_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[async_std::test]
    async fn test_usage_count_is_derived_from_graph() {
        let mock = MockCapabilityService::new();
        mock.add_capability(1, &[10, 11]);
        mock.add_capability(2, &[11]);

        assert_eq!(mock.technology_usage_count(10, "t").await.unwrap(), 1);
        assert_eq!(mock.technology_usage_count(11, "t").await.unwrap(), 2);
        assert_eq!(mock.technology_usage_count(12, "t").await.unwrap(), 0);
    }

    #[async_std::test]
    async fn test_delete_capability_lowers_usage_count() {
        let mock = MockCapabilityService::new();
        mock.add_capability(1, &[11]);
        mock.add_capability(2, &[11]);

        mock.delete_capability(2, "t").await.unwrap();

        assert_eq!(mock.technology_usage_count(11, "t").await.unwrap(), 1);
        assert!(!mock.has_capability(2));
        assert_eq!(mock.deleted_capabilities(), vec![2]);
    }

    #[async_std::test]
    async fn test_second_delete_is_not_found() {
        let mock = MockCapabilityService::new();
        mock.add_capability(1, &[10]);

        mock.delete_technology(10, "t").await.unwrap();
        let second = mock.delete_technology(10, "t").await;

        assert!(matches!(second, Err(GatewayError::NotFound(_))));
        assert_eq!(mock.technology_delete_calls(10), 2);
        assert_eq!(mock.deleted_technologies(), vec![10]);
        assert_eq!(mock.technology_ids_of(1, "t").await.unwrap(), Vec::<i64>::new());
    }

    #[async_std::test]
    async fn test_configured_failure() {
        let mock = MockCapabilityService::new();
        mock.add_capability(1, &[]);
        mock.fail(
            MockOperation::DeleteCapability,
            1,
            GatewayError::Unreachable("connection reset".to_string()),
        );

        let result = mock.delete_capability(1, "t").await;

        assert_eq!(
            result,
            Err(GatewayError::Unreachable("connection reset".to_string()))
        );
        assert!(mock.has_capability(1));
        assert_eq!(mock.capability_delete_calls(1), 1);
    }

    #[async_std::test]
    async fn test_records_trace_ids_and_clear() {
        let mock = MockCapabilityService::new();
        mock.add_capability(1, &[10]);
        mock.technology_ids_of(1, "trace-a").await.unwrap();

        assert_eq!(mock.trace_ids(), vec!["trace-a".to_string()]);

        mock.clear();
        assert!(!mock.has_capability(1));
        assert!(mock.trace_ids().is_empty());
    }
}
