//! Markdown and JSON rendering of monitoring views.
//!
//! JSON output is the bare view with its exact field set, ready for the
//! dashboard. Markdown output wraps the same numbers in a readable report.

use crate::models::{AreaCouncilSummary, DashboardStats, RiskLevel, WardSummary};
use crate::service::CouncilDetail;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A rendered-ready monitoring view.
#[derive(Debug, Clone)]
pub enum View {
    Dashboard(DashboardStats),
    Councils(Vec<AreaCouncilSummary>),
    Council(CouncilDetail),
    Wards(Vec<WardSummary>),
    Ward(WardSummary),
}

impl View {
    /// Highest risk level in the view, if it carries any.
    pub fn max_risk(&self) -> Option<RiskLevel> {
        match self {
            View::Councils(summaries) => summaries.iter().map(|s| s.risk_level).max(),
            View::Council(detail) => Some(detail.summary.risk_level),
            View::Wards(wards) => wards.iter().map(|w| w.risk_level).max(),
            View::Ward(ward) => Some(ward.risk_level),
            View::Dashboard(_) => None,
        }
    }
}

/// Report header details.
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    /// Where the records came from.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    /// List wards under a council drill-down.
    pub include_wards: bool,
}

/// Serialize the view as pretty JSON.
pub fn generate_json_report(view: &View) -> Result<String> {
    let json = match view {
        View::Dashboard(stats) => serde_json::to_string_pretty(stats)?,
        View::Councils(summaries) => serde_json::to_string_pretty(summaries)?,
        View::Council(detail) => serde_json::to_string_pretty(detail)?,
        View::Wards(wards) => serde_json::to_string_pretty(wards)?,
        View::Ward(ward) => serde_json::to_string_pretty(ward)?,
    };
    Ok(json)
}

/// Render the view as a Markdown report.
pub fn generate_markdown_report(view: &View, metadata: &ReportMetadata) -> String {
    let mut output = String::new();

    output.push_str("# WardWatch Report\n\n");
    output.push_str(&generate_metadata_section(metadata));

    match view {
        View::Dashboard(stats) => output.push_str(&generate_dashboard_section(stats)),
        View::Councils(summaries) => output.push_str(&generate_councils_section(summaries)),
        View::Council(detail) => {
            output.push_str(&generate_council_section(&detail.summary));
            if metadata.include_wards {
                output.push_str(&generate_wards_table(&detail.wards));
            }
        }
        View::Wards(wards) => output.push_str(&generate_wards_table(wards)),
        View::Ward(ward) => output.push_str(&generate_ward_section(ward)),
    }

    output.push_str(&generate_footer());
    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    section
}

fn generate_dashboard_section(stats: &DashboardStats) -> String {
    let mut section = String::new();
    let breakdown = &stats.polling_unit_breakdown;

    section.push_str("## Dashboard\n\n");
    section.push_str("| Metric | Value |\n");
    section.push_str("|:---|---:|\n");
    section.push_str(&format!(
        "| Area councils reporting | {} / {} |\n",
        stats.lgas_reported, stats.total_lgas
    ));
    section.push_str(&format!(
        "| Wards reporting | {} / {} |\n",
        stats.wards_reported, stats.total_wards
    ));
    section.push_str(&format!(
        "| Collation compliance | {:.1}% |\n",
        stats.compliance_percent
    ));
    section.push_str(&format!(
        "| Polling units open | {} / {} |\n\n",
        stats.open_polling_units, stats.total_polling_units
    ));

    section.push_str("### Polling Unit Status\n\n");
    section.push_str("| Operational | Minor issues | Offline | Not opened |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        breakdown.operational, breakdown.minor_issues, breakdown.offline, breakdown.not_opened
    ));

    section
}

fn generate_councils_section(summaries: &[AreaCouncilSummary]) -> String {
    let mut section = String::new();

    section.push_str("## Area Councils\n\n");
    if summaries.is_empty() {
        section.push_str("No area councils in the source.\n\n");
        return section;
    }

    section.push_str("| Council | Wards reported | Turnout | Compliance | Security ");
    section.push_str("| Late starts | Incidents | Risk |\n");
    section.push_str("|:---|:---:|---:|---:|---:|:---:|:---:|:---|\n");
    for s in summaries {
        section.push_str(&format!(
            "| {} | {}/{} | {:.2}% | {} | {}% | {} | {} | {} {} |\n",
            s.name,
            s.wards_reported,
            s.wards,
            s.turnout_percent,
            s.compliance_score,
            s.security_present,
            s.late_start_count,
            s.incident_count,
            s.risk_level.emoji(),
            s.risk_level
        ));
    }
    section.push('\n');

    section
}

fn generate_council_section(s: &AreaCouncilSummary) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {} ({})\n\n", s.name, s.state));
    section.push_str(&format!(
        "**Risk:** {} {} | **Incidents:** {}\n\n",
        s.risk_level.emoji(),
        s.risk_level,
        s.incident_count
    ));

    section.push_str("| Registered | Accredited | Cast | Valid | Rejected | Turnout |\n");
    section.push_str("|---:|---:|---:|---:|---:|---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} | {:.2}% |\n\n",
        s.registered_voters,
        s.accredited_voters,
        s.votes_cast,
        s.valid_votes,
        s.rejected_votes,
        s.turnout_percent
    ));

    section.push_str(&format!(
        "- Wards reported: {} of {} ({} polling units)\n",
        s.wards_reported, s.wards, s.polling_units
    ));
    section.push_str(&format!("- Compliance score: {}\n", s.compliance_score));
    section.push_str(&format!("- Security present: {}%\n", s.security_present));
    section.push_str(&format!("- Late starts: {}\n\n", s.late_start_count));

    section.push_str(&generate_count_table("Party Results", "Party", "Votes", &s.party_results));
    section.push_str(&generate_count_table(
        "Incidents by Type",
        "Type",
        "Count",
        &s.incident_breakdown,
    ));

    section
}

fn generate_wards_table(wards: &[WardSummary]) -> String {
    let mut section = String::new();

    section.push_str("### Wards\n\n");
    section.push_str("| Ward | Reported | Turnout | Compliance ");
    section.push_str("| Late start | Incidents | Risk |\n");
    section.push_str("|:---|:---:|---:|---:|:---:|:---:|:---|\n");
    for w in wards {
        section.push_str(&format!(
            "| {} | {} | {:.2}% | {} | {} | {} | {} {} |\n",
            w.name,
            yes_no(w.reported),
            w.turnout_percent,
            w.compliance_score,
            yes_no(w.late_start),
            w.incident_count,
            w.risk_level.emoji(),
            w.risk_level
        ));
    }
    section.push('\n');

    section
}

fn generate_ward_section(w: &WardSummary) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Ward {} ({})\n\n", w.name, w.lga_id));
    if !w.reported {
        section.push_str("*No submission received yet.*\n\n");
    }

    section.push_str(&format!("- Turnout: {:.2}%\n", w.turnout_percent));
    section.push_str(&format!("- Compliance score: {}\n", w.compliance_score));
    section.push_str(&format!(
        "- Arrival: {} | Collation start: {}{}\n",
        or_dash(&w.arrival_category),
        or_dash(&w.start_category),
        if w.late_start { " (late)" } else { "" }
    ));
    section.push_str(&format!("- Security present: {}\n", yes_no(w.security_present)));
    section.push_str(&format!(
        "- Risk: {} {}\n\n",
        w.risk_level.emoji(),
        w.risk_level
    ));

    let i = &w.integrity;
    section.push_str("### Integrity Checklist\n\n");
    for (label, done) in [
        ("EC8B submitted", i.ec8b_submitted),
        ("EC8C collated", i.ec8c_collated),
        ("CSRVS done", i.csrvs_done),
        ("Votes announced", i.votes_announced),
        ("Agents countersigned", i.agents_countersigned),
        ("EC60E displayed", i.ec60e_displayed),
    ] {
        section.push_str(&format!("- [{}] {}\n", if done { "x" } else { " " }, label));
    }
    section.push('\n');

    section.push_str(&generate_count_table("Party Results", "Party", "Votes", &w.party_results));
    section.push_str(&generate_count_table(
        "Incidents by Type",
        "Type",
        "Count",
        &w.incident_breakdown,
    ));

    section
}

fn generate_count_table(
    title: &str,
    key: &str,
    value: &str,
    counts: &BTreeMap<String, u64>,
) -> String {
    if counts.is_empty() {
        return String::new();
    }

    let mut rows: Vec<_> = counts.iter().collect();
    rows.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

    let mut section = format!("### {}\n\n| {} | {} |\n|:---|---:|\n", title, key, value);
    for (name, count) in rows {
        section.push_str(&format!("| {} | {} |\n", name, count));
    }
    section.push('\n');

    section
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn or_dash(category: &str) -> &str {
    if category.is_empty() {
        "-"
    } else {
        category
    }
}

fn generate_footer() -> String {
    "---\n\n*Report generated by WardWatch*\n".to_string()
}
