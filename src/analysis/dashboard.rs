//! Global dashboard statistics.

use crate::models::{AreaCouncil, DashboardStats, PollingUnitBreakdown, WardSummary};
use std::collections::BTreeSet;

/// Compile the dashboard snapshot from every council and every ward summary.
///
/// A ward's polling units count as open once the ward has reported, and as
/// having minor issues when it has also logged at least one incident.
/// Polling-unit totals saturate at `u64::MAX`.
pub fn compile_dashboard(councils: &[AreaCouncil], wards: &[WardSummary]) -> DashboardStats {
    let mut stats = DashboardStats {
        total_lgas: councils.len() as u64,
        total_wards: wards.len() as u64,
        ..Default::default()
    };

    let mut reporting_councils: BTreeSet<&str> = BTreeSet::new();
    let mut minor_issues = 0u64;
    let mut fully_collated = 0u64;

    for ward in wards {
        stats.total_polling_units = stats.total_polling_units.saturating_add(ward.polling_units);

        if !ward.reported {
            continue;
        }
        stats.wards_reported += 1;
        stats.open_polling_units = stats.open_polling_units.saturating_add(ward.polling_units);
        reporting_councils.insert(ward.lga_id.as_str());

        if ward.incident_count > 0 {
            minor_issues = minor_issues.saturating_add(ward.polling_units);
        }
        if ward.integrity.ec8b_submitted && ward.integrity.ec8c_collated {
            fully_collated += 1;
        }
    }

    stats.lgas_reported = reporting_councils.len() as u64;
    if stats.wards_reported > 0 {
        stats.compliance_percent = fully_collated as f64 / stats.wards_reported as f64 * 100.0;
    }
    stats.polling_unit_breakdown = PollingUnitBreakdown {
        operational: stats.open_polling_units.saturating_sub(minor_issues),
        minor_issues,
        offline: stats.total_polling_units.saturating_sub(stats.open_polling_units),
        not_opened: 0,
    };

    stats
}
