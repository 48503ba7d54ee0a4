//! Per-ward metric derivation.
//!
//! Every read path that shows ward metrics goes through [`summarize_ward`],
//! so turnout, compliance and late-start are computed in exactly one place.

use crate::models::{
    IntegrityChecklist, RiskLevel, WardIntegrity, WardSummary, LATE_START_CATEGORIES,
};
use crate::provider::WardRecords;
use std::collections::BTreeMap;

/// Compliance weight of the EC8B-submitted flag.
pub const EC8B_WEIGHT: u32 = 30;
/// Compliance weight of the EC8C-collated flag.
pub const EC8C_WEIGHT: u32 = 30;
/// Compliance weight of the CSRVS-done flag.
pub const CSRVS_WEIGHT: u32 = 40;

/// Options for ward-level derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct WardOptions {
    /// Classify risk from the ward's own incident count instead of
    /// reporting the default "low".
    pub assess_risk: bool,
}

/// `votes_cast / registered_voters * 100`, or 0 when nobody is registered.
pub fn turnout_percent(votes_cast: u64, registered_voters: u64) -> f64 {
    if registered_voters == 0 {
        return 0.0;
    }
    votes_cast as f64 / registered_voters as f64 * 100.0
}

/// Weighted checklist score in `0..=100`.
pub fn compliance_score(checklist: &IntegrityChecklist) -> u32 {
    let mut score = 0;
    if checklist.ec8b_submitted {
        score += EC8B_WEIGHT;
    }
    if checklist.ec8c_collated {
        score += EC8C_WEIGHT;
    }
    if checklist.csrvs_done {
        score += CSRVS_WEIGHT;
    }
    score
}

/// Whether a collation-start category counts as a late start.
pub fn is_late_start(collation_start_time: &str) -> bool {
    LATE_START_CATEGORIES.contains(&collation_start_time)
}

/// Derive the summary for one ward.
///
/// A missing submission is not an error: every field falls back to zero,
/// false or empty. `configured_parties` are listed with a zero score when
/// the ward has no row for them.
pub fn summarize_ward(
    records: &WardRecords,
    configured_parties: &[String],
    options: &WardOptions,
) -> WardSummary {
    let ward = &records.ward;
    let result = records.result.as_ref();

    let checklist = result.map(|r| r.integrity).unwrap_or_default();
    let votes = result.map(|r| r.votes).unwrap_or_default();
    let start_category = result
        .map(|r| r.collation_start_time.clone())
        .unwrap_or_default();

    let mut party_results: BTreeMap<String, u64> = configured_parties
        .iter()
        .map(|party| (party.clone(), 0))
        .collect();
    for row in &records.party_results {
        party_results.insert(row.party_name.clone(), row.score);
    }

    let incident_count = records
        .incidents_by_type
        .values()
        .fold(0u64, |total, count| total.saturating_add(*count));
    let risk_level = if options.assess_risk {
        RiskLevel::from_incident_count(incident_count)
    } else {
        RiskLevel::Low
    };

    WardSummary {
        id: ward.id.clone(),
        lga_id: ward.area_council_id.clone(),
        name: ward.name.clone(),
        polling_units: ward.total_polling_units,
        registered_voters: ward.registered_voters,
        accredited_voters: votes.accredited_voters,
        votes_cast: votes.votes_cast,
        valid_votes: votes.valid_votes,
        rejected_votes: votes.rejected_votes,
        turnout_percent: turnout_percent(votes.votes_cast, ward.registered_voters),
        compliance_score: compliance_score(&checklist),
        incident_count,
        incident_breakdown: records.incidents_by_type.clone(),
        late_start: is_late_start(&start_category),
        security_present: result.map(|r| r.security_present).unwrap_or(false),
        risk_level,
        arrival_category: result.map(|r| r.arrival_time.clone()).unwrap_or_default(),
        start_category,
        reported: result.is_some(),
        updated_at: result.and_then(|r| r.updated_at),
        party_results,
        integrity: WardIntegrity::from(checklist),
    }
}
