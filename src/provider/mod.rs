//! Raw record access.
//!
//! The derivation engine never talks to storage directly; it is handed a
//! [`RecordProvider`] and reads snapshots through it. Providers only fetch
//! and decode rows, they never derive metrics.

#[cfg(test)]
pub mod memory;
pub mod snapshot;

pub use snapshot::SnapshotProvider;

use crate::models::{AreaCouncil, PartyResult, Ward, WardResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Failure to read raw records.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A row exists but cannot be decoded.
    #[error("malformed {entity} record {key}: {reason}")]
    Malformed {
        entity: &'static str,
        key: String,
        reason: String,
    },

    /// The record source cannot be read at all.
    #[allow(dead_code)] // Raised by lock-backed stores; snapshots are read up front
    #[error("record source unavailable: {0}")]
    Unavailable(String),
}

/// Everything recorded for one ward.
#[derive(Debug, Clone, PartialEq)]
pub struct WardRecords {
    pub ward: Ward,
    /// `None` until the ward has reported.
    pub result: Option<WardResult>,
    pub party_results: Vec<PartyResult>,
    /// Incident counts keyed by incident type.
    pub incidents_by_type: BTreeMap<String, u64>,
}

#[cfg(test)]
impl WardRecords {
    /// Records for a ward that has not submitted anything yet.
    pub fn unreported(ward: Ward) -> Self {
        Self {
            ward,
            result: None,
            party_results: Vec::new(),
            incidents_by_type: BTreeMap::new(),
        }
    }
}

/// One council and all of its ward records, fetched in a single read.
#[derive(Debug, Clone, PartialEq)]
pub struct CouncilRecords {
    pub council: AreaCouncil,
    pub wards: Vec<WardRecords>,
    pub configured_parties: Vec<String>,
}

/// Source of raw monitoring records.
#[async_trait]
pub trait RecordProvider: Send + Sync {
    async fn list_area_councils(&self) -> Result<Vec<AreaCouncil>, ProviderError>;

    #[allow(dead_code)] // Rollups read wards through load_council
    async fn list_wards(&self, council_id: &str) -> Result<Vec<Ward>, ProviderError>;

    async fn get_ward(&self, ward_id: &str) -> Result<Option<Ward>, ProviderError>;

    /// The latest submission for a ward, if any.
    async fn get_ward_result(&self, ward_id: &str) -> Result<Option<WardResult>, ProviderError>;

    async fn list_party_results(&self, ward_id: &str) -> Result<Vec<PartyResult>, ProviderError>;

    async fn count_incidents_by_type(
        &self,
        ward_id: &str,
    ) -> Result<BTreeMap<String, u64>, ProviderError>;

    /// Parties that should be listed for a council even at a zero score.
    async fn list_configured_parties(&self, council_id: &str)
        -> Result<Vec<String>, ProviderError>;

    /// Batched read of a whole council. Returns `None` for an unknown id.
    ///
    /// List and dashboard paths call this once per council instead of
    /// issuing per-ward reads.
    async fn load_council(&self, council_id: &str)
        -> Result<Option<CouncilRecords>, ProviderError>;
}
