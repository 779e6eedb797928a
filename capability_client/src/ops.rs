use async_trait::async_trait;
use core_types::{CapabilityId, TechnologyId};

use crate::GatewayError;

/// Operations against the capability service.
///
/// Every call carries the trace id of the request that triggered it so that log lines
/// on both sides can be correlated.
#[async_trait]
pub trait CapabilityResourceOps: Send + Sync {
    /// Ids of the technologies linked to a capability, possibly empty
    async fn technology_ids_of(
        &self,
        capability_id: CapabilityId,
        trace_id: &str,
    ) -> Result<Vec<TechnologyId>, GatewayError>;

    /// Number of capabilities anywhere in the system currently linking to the technology
    async fn technology_usage_count(
        &self,
        technology_id: TechnologyId,
        trace_id: &str,
    ) -> Result<i64, GatewayError>;

    /// Delete a capability. Deleting a capability that is already gone yields `NotFound`.
    async fn delete_capability(
        &self,
        capability_id: CapabilityId,
        trace_id: &str,
    ) -> Result<(), GatewayError>;

    /// Delete a technology. Deleting a technology that is already gone yields `NotFound`.
    async fn delete_technology(
        &self,
        technology_id: TechnologyId,
        trace_id: &str,
    ) -> Result<(), GatewayError>;
}
