//! Area Council rollups.
//!
//! Reduces the ward summaries of one council into an [`AreaCouncilSummary`].
//! Every field is a sum, count or ratio of sums, so the order in which ward
//! summaries arrive does not change the result.

use crate::analysis::ward::turnout_percent;
use crate::models::{AreaCouncil, AreaCouncilSummary, RiskLevel, WardSummary};
use std::collections::BTreeMap;

/// `round(part / whole * 100)`, or 0 for an empty whole.
pub fn rounded_percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

/// Add to a keyed counter, saturating at `u64::MAX`.
fn add_count(counts: &mut BTreeMap<String, u64>, key: &str, value: u64) {
    let entry = counts.entry(key.to_string()).or_insert(0);
    *entry = entry.saturating_add(value);
}

/// Roll up one council from its ward summaries.
///
/// Turnout is computed from the summed tallies, never as a mean of ward
/// percentages. Compliance is averaged over reporting wards only.
/// `configured_parties` appear in `party_results` even at a zero score.
/// Sums saturate at `u64::MAX` rather than overflow.
pub fn aggregate_council(
    council: &AreaCouncil,
    wards: &[WardSummary],
    configured_parties: &[String],
) -> AreaCouncilSummary {
    let mut summary = AreaCouncilSummary {
        id: council.id.clone(),
        name: council.name.clone(),
        state: council.state.clone(),
        ..Default::default()
    };

    for party in configured_parties {
        summary.party_results.entry(party.clone()).or_insert(0);
    }

    let mut security_count = 0u64;
    let mut total_compliance = 0u64;

    for ward in wards {
        summary.wards += 1;
        summary.registered_voters =
            summary.registered_voters.saturating_add(ward.registered_voters);
        summary.polling_units = summary.polling_units.saturating_add(ward.polling_units);
        summary.accredited_voters =
            summary.accredited_voters.saturating_add(ward.accredited_voters);
        summary.votes_cast = summary.votes_cast.saturating_add(ward.votes_cast);
        summary.valid_votes = summary.valid_votes.saturating_add(ward.valid_votes);
        summary.rejected_votes = summary.rejected_votes.saturating_add(ward.rejected_votes);

        if ward.reported {
            summary.wards_reported += 1;
            total_compliance = total_compliance.saturating_add(u64::from(ward.compliance_score));
        }
        if ward.security_present {
            security_count += 1;
        }
        if ward.late_start {
            summary.late_start_count += 1;
        }

        summary.incident_count = summary.incident_count.saturating_add(ward.incident_count);
        for (incident_type, count) in &ward.incident_breakdown {
            add_count(&mut summary.incident_breakdown, incident_type, *count);
        }
        for (party, score) in &ward.party_results {
            add_count(&mut summary.party_results, party, *score);
        }
    }

    summary.turnout_percent = turnout_percent(summary.votes_cast, summary.registered_voters);
    summary.security_present = rounded_percent(security_count, summary.wards);
    if summary.wards_reported > 0 {
        // Integer mean, truncating.
        summary.compliance_score = (total_compliance / summary.wards_reported) as u32;
    }
    summary.risk_level = RiskLevel::from_incident_count(summary.incident_count);

    summary
}
