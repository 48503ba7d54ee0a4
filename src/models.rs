//! Data models for election-day monitoring.
//!
//! Raw records mirror what field observers submit per ward and serialize
//! with snake_case keys. Derived views are recomputed on every read and
//! serialize with the camelCase keys the dashboard consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Collation-start categories that count as a late start.
pub const LATE_START_CATEGORIES: [&str; 2] = ["not_started", "9_12am"];

/// Coarse risk classification driven by incident counts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classify an incident count. Thresholds are strict: more than 10 is
    /// high, more than 5 is medium.
    pub fn from_incident_count(count: u64) -> Self {
        if count > 10 {
            RiskLevel::High
        } else if count > 5 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Returns an emoji representation of the risk level.
    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🔴",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// An Area Council (LGA). Immutable reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaCouncil {
    pub id: String,
    pub name: String,
    pub state: String,
}

/// A ward inside an Area Council.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ward {
    pub id: String,
    pub area_council_id: String,
    pub name: String,
    pub total_polling_units: u64,
    pub registered_voters: u64,
}

/// The six procedural-integrity checkpoints of a ward collation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityChecklist {
    #[serde(default)]
    pub ec8b_submitted: bool,
    #[serde(default)]
    pub ec8c_collated: bool,
    #[serde(default)]
    pub csrvs_done: bool,
    #[serde(default)]
    pub votes_announced: bool,
    #[serde(default)]
    pub agents_countersigned: bool,
    #[serde(default)]
    pub ec60e_displayed: bool,
}

/// Vote tallies reported for a ward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    #[serde(default)]
    pub accredited_voters: u64,
    #[serde(default)]
    pub valid_votes: u64,
    #[serde(default)]
    pub rejected_votes: u64,
    #[serde(default)]
    pub votes_cast: u64,
}

/// The single live submission for a ward.
///
/// A later submission overwrites the earlier one; there is no history.
/// Every field defaults, since submissions arrive piecemeal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardResult {
    pub ward_id: String,
    #[serde(default)]
    pub arrival_time: String,
    #[serde(default)]
    pub collation_start_time: String,
    /// Electoral staff counted at the collation centre.
    #[serde(default, alias = "inec_staff")]
    pub staff_count: u64,
    #[serde(default)]
    pub security_present: bool,
    #[serde(default)]
    pub party_agents: u64,
    #[serde(flatten)]
    pub integrity: IntegrityChecklist,
    #[serde(flatten)]
    pub votes: VoteCounts,
    /// Time of the last submission. `None` when the source row carries none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
impl WardResult {
    /// An empty submission for a ward, stamped now.
    pub fn new(ward_id: impl Into<String>) -> Self {
        Self {
            ward_id: ward_id.into(),
            arrival_time: String::new(),
            collation_start_time: String::new(),
            staff_count: 0,
            security_present: false,
            party_agents: 0,
            integrity: IntegrityChecklist::default(),
            votes: VoteCounts::default(),
            updated_at: Some(Utc::now()),
        }
    }
}

/// Votes scored by one party in one ward. Unique on (ward, party).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyResult {
    pub ward_id: String,
    pub party_name: String,
    pub score: u64,
}

/// A security or process incident reported in a ward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub ward_id: String,
    #[serde(rename = "type")]
    pub incident_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Integrity checklist as exposed on the ward drill-down view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardIntegrity {
    pub ec8b_submitted: bool,
    pub ec8c_collated: bool,
    pub csrvs_done: bool,
    pub votes_announced: bool,
    pub agents_countersigned: bool,
    pub ec60e_displayed: bool,
}

impl From<IntegrityChecklist> for WardIntegrity {
    fn from(c: IntegrityChecklist) -> Self {
        Self {
            ec8b_submitted: c.ec8b_submitted,
            ec8c_collated: c.ec8c_collated,
            csrvs_done: c.csrvs_done,
            votes_announced: c.votes_announced,
            agents_countersigned: c.agents_countersigned,
            ec60e_displayed: c.ec60e_displayed,
        }
    }
}

/// Derived per-ward view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardSummary {
    pub id: String,
    pub lga_id: String,
    pub name: String,
    pub polling_units: u64,
    pub registered_voters: u64,
    pub accredited_voters: u64,
    pub votes_cast: u64,
    pub valid_votes: u64,
    pub rejected_votes: u64,
    pub turnout_percent: f64,
    pub compliance_score: u32,
    pub incident_count: u64,
    pub incident_breakdown: BTreeMap<String, u64>,
    pub late_start: bool,
    pub security_present: bool,
    pub risk_level: RiskLevel,
    pub arrival_category: String,
    pub start_category: String,
    /// Whether a submission exists for this ward.
    pub reported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub party_results: BTreeMap<String, u64>,
    pub integrity: WardIntegrity,
}

/// Derived Area Council rollup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaCouncilSummary {
    pub id: String,
    pub name: String,
    pub state: String,
    pub wards: u64,
    pub wards_reported: u64,
    pub polling_units: u64,
    pub registered_voters: u64,
    pub accredited_voters: u64,
    pub votes_cast: u64,
    pub valid_votes: u64,
    pub rejected_votes: u64,
    pub turnout_percent: f64,
    /// Percentage of wards with security present, rounded.
    pub security_present: u32,
    pub compliance_score: u32,
    pub incident_count: u64,
    pub incident_breakdown: BTreeMap<String, u64>,
    pub party_results: BTreeMap<String, u64>,
    pub late_start_count: u64,
    pub risk_level: RiskLevel,
}

/// Polling-unit status split on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollingUnitBreakdown {
    pub operational: u64,
    pub minor_issues: u64,
    pub offline: u64,
    /// Always zero: no source data separates "not opened" from "offline".
    pub not_opened: u64,
}

/// Global dashboard snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(rename = "totalLGAs")]
    pub total_lgas: u64,
    pub total_wards: u64,
    pub wards_reported: u64,
    #[serde(rename = "lgasReported")]
    pub lgas_reported: u64,
    pub compliance_percent: f64,
    pub total_polling_units: u64,
    pub open_polling_units: u64,
    pub polling_unit_breakdown: PollingUnitBreakdown,
}
