//! Read paths over a record provider.
//!
//! Each request reads a fresh snapshot through the injected provider and
//! derives its views from scratch. Nothing is cached and nothing is written,
//! so requests can run concurrently without coordination.

pub mod context;

pub use context::RequestContext;

use crate::analysis::{aggregate_council, compile_dashboard, summarize_ward, WardOptions};
use crate::models::{AreaCouncil, AreaCouncilSummary, DashboardStats, WardSummary};
use crate::provider::{CouncilRecords, ProviderError, RecordProvider, WardRecords};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Failure of a monitoring request.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("area council not found: {0}")]
    CouncilNotFound(String),

    #[error("ward not found: {0}")]
    WardNotFound(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

/// Tuning for the service.
#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    /// Councils loaded at once by list and dashboard requests.
    pub concurrency: usize,
    pub ward: WardOptions,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            ward: WardOptions::default(),
        }
    }
}

/// A council summary together with its ward summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouncilDetail {
    pub summary: AreaCouncilSummary,
    pub wards: Vec<WardSummary>,
}

/// Monitoring read service over an injected provider.
pub struct MonitoringService<P> {
    provider: Arc<P>,
    options: ServiceOptions,
}

impl<P: RecordProvider> MonitoringService<P> {
    pub fn new(provider: Arc<P>, options: ServiceOptions) -> Self {
        Self { provider, options }
    }

    /// Ward summaries of one council, ordered by ward id.
    fn summarize_wards(&self, records: &CouncilRecords) -> Vec<WardSummary> {
        let mut wards: Vec<WardSummary> = records
            .wards
            .iter()
            .map(|w| summarize_ward(w, &records.configured_parties, &self.options.ward))
            .collect();
        wards.sort_by(|a, b| a.id.cmp(&b.id));
        wards
    }

    /// One batched read plus the full rollup for a council.
    pub async fn council_detail(
        &self,
        ctx: &RequestContext,
        council_id: &str,
    ) -> Result<CouncilDetail, MonitorError> {
        let records = ctx
            .run(self.provider.load_council(council_id))
            .await?
            .ok_or_else(|| MonitorError::CouncilNotFound(council_id.to_string()))?;

        let wards = self.summarize_wards(&records);
        let summary = aggregate_council(&records.council, &wards, &records.configured_parties);
        debug!(
            "Council {}: {}/{} wards reported, {} incidents",
            council_id, summary.wards_reported, summary.wards, summary.incident_count
        );

        Ok(CouncilDetail { summary, wards })
    }

    /// Ward summaries for a council, ordered by ward id.
    pub async fn ward_summaries(
        &self,
        ctx: &RequestContext,
        council_id: &str,
    ) -> Result<Vec<WardSummary>, MonitorError> {
        Ok(self.council_detail(ctx, council_id).await?.wards)
    }

    async fn load_all(
        &self,
        ctx: &RequestContext,
        councils: &[AreaCouncil],
    ) -> Result<Vec<CouncilDetail>, MonitorError> {
        stream::iter(councils)
            .map(|council| self.council_detail(ctx, &council.id))
            .buffered(self.options.concurrency.max(1))
            .try_collect()
            .await
    }

    /// Rollups for every council, in council id order.
    pub async fn council_summaries(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<AreaCouncilSummary>, MonitorError> {
        let start = Instant::now();
        let councils = ctx.run(self.provider.list_area_councils()).await?;
        let details = self.load_all(ctx, &councils).await?;

        info!(
            "Summarized {} area councils in {:.1}ms",
            details.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(details.into_iter().map(|d| d.summary).collect())
    }

    /// Drill-down view of one ward.
    pub async fn ward_detail(
        &self,
        ctx: &RequestContext,
        ward_id: &str,
    ) -> Result<WardSummary, MonitorError> {
        let ward = ctx
            .run(self.provider.get_ward(ward_id))
            .await?
            .ok_or_else(|| MonitorError::WardNotFound(ward_id.to_string()))?;

        let result = ctx.run(self.provider.get_ward_result(ward_id)).await?;
        let party_results = ctx.run(self.provider.list_party_results(ward_id)).await?;
        let incidents_by_type = ctx
            .run(self.provider.count_incidents_by_type(ward_id))
            .await?;
        let parties = ctx
            .run(self.provider.list_configured_parties(&ward.area_council_id))
            .await?;

        let records = WardRecords {
            ward,
            result,
            party_results,
            incidents_by_type,
        };
        Ok(summarize_ward(&records, &parties, &self.options.ward))
    }

    /// Global dashboard snapshot.
    pub async fn dashboard(&self, ctx: &RequestContext) -> Result<DashboardStats, MonitorError> {
        let start = Instant::now();
        let councils = ctx.run(self.provider.list_area_councils()).await?;
        let details = self.load_all(ctx, &councils).await?;

        let wards: Vec<WardSummary> = details.into_iter().flat_map(|d| d.wards).collect();
        let stats = compile_dashboard(&councils, &wards);

        info!(
            "Compiled dashboard over {} wards in {:.1}ms",
            stats.total_wards,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(stats)
    }
}
