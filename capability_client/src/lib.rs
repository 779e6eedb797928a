// The capability service owns capabilities, technologies and the links between them.
// This crate is the only way the bootcamp side reaches those resources.

pub mod http_client;
pub mod mock;
pub mod ops;

pub use http_client::{CapabilityClientConfig, HttpCapabilityClient};
pub use ops::CapabilityResourceOps;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Capability service unreachable: {0}")]
    Unreachable(String),

    #[error("Rejected by capability service: {0}")]
    Rejected(String),
}
