//! In-memory record store.
//!
//! Holds typed records behind a lock and accepts field submissions with the
//! same upsert behaviour as the collation backend: a ward has at most one
//! live result, and each submission only touches its own fields.

use super::{CouncilRecords, ProviderError, RecordProvider, WardRecords};
use crate::models::{
    AreaCouncil, Incident, IntegrityChecklist, PartyResult, VoteCounts, Ward, WardResult,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::debug;

/// Rejected write to the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown area council: {0}")]
    UnknownCouncil(String),

    #[error("unknown ward: {0}")]
    UnknownWard(String),

    #[error("record store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Default)]
struct Tables {
    councils: BTreeMap<String, AreaCouncil>,
    wards: BTreeMap<String, Ward>,
    results: BTreeMap<String, WardResult>,
    /// Keyed by (ward id, party name).
    party_scores: BTreeMap<(String, String), u64>,
    incidents: Vec<Incident>,
    configured_parties: BTreeMap<String, Vec<String>>,
}

impl Tables {
    fn wards_of<'a>(&'a self, council_id: &'a str) -> impl Iterator<Item = &'a Ward> + 'a {
        self.wards
            .values()
            .filter(move |w| w.area_council_id == council_id)
    }

    fn party_results_of(&self, ward_id: &str) -> Vec<PartyResult> {
        self.party_scores
            .iter()
            .filter(|((ward, _), _)| ward == ward_id)
            .map(|((ward, party), score)| PartyResult {
                ward_id: ward.clone(),
                party_name: party.clone(),
                score: *score,
            })
            .collect()
    }

    fn incidents_by_type(&self, ward_id: &str) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for incident in self.incidents.iter().filter(|i| i.ward_id == ward_id) {
            *counts.entry(incident.incident_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    fn ward_records(&self, ward: &Ward) -> WardRecords {
        WardRecords {
            ward: ward.clone(),
            result: self.results.get(&ward.id).cloned(),
            party_results: self.party_results_of(&ward.id),
            incidents_by_type: self.incidents_by_type(&ward.id),
        }
    }
}

/// Typed, lock-protected record store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }

    fn snapshot(&self) -> Result<RwLockReadGuard<'_, Tables>, ProviderError> {
        self.read()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))
    }

    /// Register an Area Council, replacing any previous record with its id.
    pub fn add_area_council(&self, council: AreaCouncil) -> Result<(), StoreError> {
        self.write()?.councils.insert(council.id.clone(), council);
        Ok(())
    }

    /// Register a ward under an existing council.
    pub fn add_ward(&self, ward: Ward) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.councils.contains_key(&ward.area_council_id) {
            return Err(StoreError::UnknownCouncil(ward.area_council_id));
        }
        tables.wards.insert(ward.id.clone(), ward);
        Ok(())
    }

    /// Replace the list of parties shown for a council.
    pub fn set_configured_parties(
        &self,
        council_id: &str,
        parties: Vec<String>,
    ) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.councils.contains_key(council_id) {
            return Err(StoreError::UnknownCouncil(council_id.to_string()));
        }
        tables
            .configured_parties
            .insert(council_id.to_string(), parties);
        Ok(())
    }

    fn upsert_result(
        &self,
        ward_id: &str,
        apply: impl FnOnce(&mut WardResult),
    ) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.wards.contains_key(ward_id) {
            return Err(StoreError::UnknownWard(ward_id.to_string()));
        }
        let result = tables
            .results
            .entry(ward_id.to_string())
            .or_insert_with(|| WardResult::new(ward_id));
        apply(result);
        result.updated_at = Some(Utc::now());
        debug!("Upserted result for ward {}", ward_id);
        Ok(())
    }

    /// Record arrival and collation-start categories.
    pub fn submit_logistics(
        &self,
        ward_id: &str,
        arrival_time: &str,
        collation_start_time: &str,
    ) -> Result<(), StoreError> {
        self.upsert_result(ward_id, |r| {
            r.arrival_time = arrival_time.to_string();
            r.collation_start_time = collation_start_time.to_string();
        })
    }

    /// Record staffing and security presence.
    pub fn submit_staffing(
        &self,
        ward_id: &str,
        staff_count: u64,
        security_present: bool,
        party_agents: u64,
    ) -> Result<(), StoreError> {
        self.upsert_result(ward_id, |r| {
            r.staff_count = staff_count;
            r.security_present = security_present;
            r.party_agents = party_agents;
        })
    }

    /// Record the procedural-integrity checklist.
    pub fn submit_integrity(
        &self,
        ward_id: &str,
        checklist: IntegrityChecklist,
    ) -> Result<(), StoreError> {
        self.upsert_result(ward_id, |r| r.integrity = checklist)
    }

    /// Record vote tallies. Party scores are stored separately and are not
    /// checked against `valid_votes`.
    pub fn submit_results(&self, ward_id: &str, votes: VoteCounts) -> Result<(), StoreError> {
        self.upsert_result(ward_id, |r| r.votes = votes)
    }

    /// Set a party's score in a ward, overwriting any earlier score.
    pub fn set_party_score(
        &self,
        ward_id: &str,
        party: &str,
        score: u64,
    ) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.wards.contains_key(ward_id) {
            return Err(StoreError::UnknownWard(ward_id.to_string()));
        }
        tables
            .party_scores
            .insert((ward_id.to_string(), party.to_string()), score);
        Ok(())
    }

    /// Append an incident report.
    pub fn record_incident(&self, incident: Incident) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.wards.contains_key(&incident.ward_id) {
            return Err(StoreError::UnknownWard(incident.ward_id));
        }
        tables.incidents.push(incident);
        Ok(())
    }
}

#[async_trait]
impl RecordProvider for MemoryStore {
    async fn list_area_councils(&self) -> Result<Vec<AreaCouncil>, ProviderError> {
        Ok(self.snapshot()?.councils.values().cloned().collect())
    }

    async fn list_wards(&self, council_id: &str) -> Result<Vec<Ward>, ProviderError> {
        Ok(self.snapshot()?.wards_of(council_id).cloned().collect())
    }

    async fn get_ward(&self, ward_id: &str) -> Result<Option<Ward>, ProviderError> {
        Ok(self.snapshot()?.wards.get(ward_id).cloned())
    }

    async fn get_ward_result(&self, ward_id: &str) -> Result<Option<WardResult>, ProviderError> {
        Ok(self.snapshot()?.results.get(ward_id).cloned())
    }

    async fn list_party_results(&self, ward_id: &str) -> Result<Vec<PartyResult>, ProviderError> {
        Ok(self.snapshot()?.party_results_of(ward_id))
    }

    async fn count_incidents_by_type(
        &self,
        ward_id: &str,
    ) -> Result<BTreeMap<String, u64>, ProviderError> {
        Ok(self.snapshot()?.incidents_by_type(ward_id))
    }

    async fn list_configured_parties(
        &self,
        council_id: &str,
    ) -> Result<Vec<String>, ProviderError> {
        Ok(self
            .snapshot()?
            .configured_parties
            .get(council_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn load_council(
        &self,
        council_id: &str,
    ) -> Result<Option<CouncilRecords>, ProviderError> {
        let tables = self.snapshot()?;
        let Some(council) = tables.councils.get(council_id) else {
            return Ok(None);
        };

        let wards = tables
            .wards_of(council_id)
            .map(|ward| tables.ward_records(ward))
            .collect();

        Ok(Some(CouncilRecords {
            council: council.clone(),
            wards,
            configured_parties: tables
                .configured_parties
                .get(council_id)
                .cloned()
                .unwrap_or_default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .add_area_council(AreaCouncil {
                id: "bwari".to_string(),
                name: "Bwari".to_string(),
                state: "FCT".to_string(),
            })
            .unwrap();
        for id in ["b2", "b1"] {
            store
                .add_ward(Ward {
                    id: id.to_string(),
                    area_council_id: "bwari".to_string(),
                    name: id.to_uppercase(),
                    total_polling_units: 10,
                    registered_voters: 1000,
                })
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_submissions_merge_into_one_result() {
        let store = seeded();
        store.submit_logistics("b1", "before_4pm", "4_6pm").unwrap();
        store.submit_staffing("b1", 5, true, 7).unwrap();
        store
            .submit_results(
                "b1",
                VoteCounts {
                    accredited_voters: 300,
                    valid_votes: 280,
                    rejected_votes: 10,
                    votes_cast: 290,
                },
            )
            .unwrap();

        let result = store.get_ward_result("b1").await.unwrap().unwrap();
        assert_eq!(result.arrival_time, "before_4pm");
        assert_eq!(result.staff_count, 5);
        assert!(result.security_present);
        assert_eq!(result.votes.votes_cast, 290);
        assert!(!result.integrity.ec8b_submitted);
        assert!(result.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_later_submission_overwrites_its_fields() {
        let store = seeded();
        store.submit_logistics("b1", "before_4pm", "not_started").unwrap();
        store.submit_logistics("b1", "4_5pm", "6_9pm").unwrap();

        let result = store.get_ward_result("b1").await.unwrap().unwrap();
        assert_eq!(result.arrival_time, "4_5pm");
        assert_eq!(result.collation_start_time, "6_9pm");
    }

    #[tokio::test]
    async fn test_party_score_upsert() {
        let store = seeded();
        store.set_party_score("b1", "PDP", 10).unwrap();
        store.set_party_score("b1", "PDP", 25).unwrap();
        store.set_party_score("b2", "PDP", 3).unwrap();

        let rows = store.list_party_results("b1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].score, 25);
    }

    #[test]
    fn test_unknown_references_rejected() {
        let store = seeded();
        assert_eq!(
            store.submit_staffing("nope", 1, false, 0),
            Err(StoreError::UnknownWard("nope".to_string()))
        );
        let orphan = Ward {
            id: "x".to_string(),
            area_council_id: "kuje".to_string(),
            name: "X".to_string(),
            total_polling_units: 1,
            registered_voters: 1,
        };
        assert_eq!(
            store.add_ward(orphan),
            Err(StoreError::UnknownCouncil("kuje".to_string()))
        );
    }

    #[tokio::test]
    async fn test_load_council_batches_everything() {
        let store = seeded();
        store.submit_staffing("b2", 3, false, 1).unwrap();
        store.set_party_score("b1", "APC", 12).unwrap();
        store
            .set_configured_parties("bwari", vec!["APC".to_string(), "LP".to_string()])
            .unwrap();
        for kind in ["Violence", "Violence", "Logistics"] {
            store
                .record_incident(Incident {
                    ward_id: "b1".to_string(),
                    incident_type: kind.to_string(),
                    title: String::new(),
                    description: String::new(),
                    severity: "Low".to_string(),
                    status: "reported".to_string(),
                    timestamp: Utc::now(),
                })
                .unwrap();
        }

        let records = store.load_council("bwari").await.unwrap().unwrap();
        let ids: Vec<&str> = records.wards.iter().map(|w| w.ward.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2"]);
        assert_eq!(records.wards[0].incidents_by_type.get("Violence"), Some(&2));
        assert_eq!(records.wards[0].party_results.len(), 1);
        assert!(records.wards[0].result.is_none());
        assert!(records.wards[1].result.is_some());
        assert_eq!(records.configured_parties.len(), 2);

        assert!(store.load_council("kuje").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_wards_ordered_by_id() {
        let store = seeded();
        let wards = store.list_wards("bwari").await.unwrap();
        let ids: Vec<&str> = wards.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2"]);

        assert!(store.list_wards("kuje").await.unwrap().is_empty());
        assert_eq!(store.get_ward("b2").await.unwrap().unwrap().name, "B2");
    }
}
