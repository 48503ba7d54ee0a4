//! JSON snapshot provider.
//!
//! Reads an export of the monitoring tables from disk. Reference data
//! (councils and wards) is decoded up front; submission rows are kept raw and
//! decoded on read, so one bad row fails the reads that touch its ward
//! instead of disappearing from the totals.

use super::{CouncilRecords, ProviderError, RecordProvider, WardRecords};
use crate::models::{AreaCouncil, Incident, PartyResult, Ward, WardResult};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// On-disk layout of a snapshot export.
#[derive(Debug, Default, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    area_councils: Vec<AreaCouncil>,
    #[serde(default)]
    wards: Vec<Ward>,
    #[serde(default)]
    ward_results: Vec<Value>,
    #[serde(default)]
    party_results: Vec<Value>,
    #[serde(default)]
    incidents: Vec<Value>,
    #[serde(default)]
    configured_parties: BTreeMap<String, Vec<String>>,
}

/// Read-only provider over a snapshot export.
#[derive(Debug, Default)]
pub struct SnapshotProvider {
    councils: BTreeMap<String, AreaCouncil>,
    wards: BTreeMap<String, Ward>,
    results: BTreeMap<String, Value>,
    party_rows: BTreeMap<String, Vec<Value>>,
    incident_rows: BTreeMap<String, Vec<Value>>,
    configured_parties: BTreeMap<String, Vec<String>>,
}

/// Extract the owning ward id of a raw row.
fn ward_key(row: &Value, entity: &str, index: usize) -> Result<String> {
    match row.get("ward_id").and_then(Value::as_str) {
        Some(id) => Ok(id.to_string()),
        None => bail!("{} row {} has no string ward_id", entity, index),
    }
}

fn decode<T: DeserializeOwned>(
    row: &Value,
    entity: &'static str,
    key: &str,
) -> Result<T, ProviderError> {
    T::deserialize(row).map_err(|e| ProviderError::Malformed {
        entity,
        key: key.to_string(),
        reason: e.to_string(),
    })
}

impl SnapshotProvider {
    /// Load a snapshot export from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;

        let provider = Self::from_json(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;

        info!(
            "Loaded snapshot with {} councils and {} wards",
            provider.councils.len(),
            provider.wards.len()
        );
        Ok(provider)
    }

    /// Build a provider from snapshot JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        let file: SnapshotFile = serde_json::from_str(content)?;
        let mut provider = Self {
            configured_parties: file.configured_parties,
            ..Default::default()
        };

        for council in file.area_councils {
            provider.councils.insert(council.id.clone(), council);
        }

        for ward in file.wards {
            if !provider.councils.contains_key(&ward.area_council_id) {
                bail!(
                    "ward {} references unknown area council {}",
                    ward.id,
                    ward.area_council_id
                );
            }
            provider.wards.insert(ward.id.clone(), ward);
        }

        for (index, row) in file.ward_results.into_iter().enumerate() {
            let ward_id = ward_key(&row, "ward_result", index)?;
            // Later rows win: a ward has one live result.
            if provider.results.insert(ward_id.clone(), row).is_some() {
                debug!("Ward {} has more than one result row; keeping the last", ward_id);
            }
        }

        for (index, row) in file.party_results.into_iter().enumerate() {
            let ward_id = ward_key(&row, "party_result", index)?;
            provider.party_rows.entry(ward_id).or_default().push(row);
        }

        for (index, row) in file.incidents.into_iter().enumerate() {
            let ward_id = ward_key(&row, "incident", index)?;
            provider.incident_rows.entry(ward_id).or_default().push(row);
        }

        let orphans = provider
            .results
            .keys()
            .chain(provider.party_rows.keys())
            .chain(provider.incident_rows.keys())
            .filter(|id| !provider.wards.contains_key(*id))
            .count();
        if orphans > 0 {
            warn!("{} submission rows reference unknown wards and will be ignored", orphans);
        }

        Ok(provider)
    }

    fn ward_result(&self, ward_id: &str) -> Result<Option<WardResult>, ProviderError> {
        self.results
            .get(ward_id)
            .map(|row| decode(row, "ward_result", ward_id))
            .transpose()
    }

    fn party_results(&self, ward_id: &str) -> Result<Vec<PartyResult>, ProviderError> {
        let mut by_party: BTreeMap<String, PartyResult> = BTreeMap::new();
        for row in self.party_rows.get(ward_id).into_iter().flatten() {
            let result: PartyResult = decode(row, "party_result", ward_id)?;
            by_party.insert(result.party_name.clone(), result);
        }
        Ok(by_party.into_values().collect())
    }

    fn incident_counts(&self, ward_id: &str) -> Result<BTreeMap<String, u64>, ProviderError> {
        let mut counts = BTreeMap::new();
        for row in self.incident_rows.get(ward_id).into_iter().flatten() {
            let incident: Incident = decode(row, "incident", ward_id)?;
            *counts.entry(incident.incident_type).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn wards_of<'a>(&'a self, council_id: &'a str) -> impl Iterator<Item = &'a Ward> + 'a {
        self.wards
            .values()
            .filter(move |w| w.area_council_id == council_id)
    }

    fn parties_of(&self, council_id: &str) -> Vec<String> {
        self.configured_parties
            .get(council_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordProvider for SnapshotProvider {
    async fn list_area_councils(&self) -> Result<Vec<AreaCouncil>, ProviderError> {
        Ok(self.councils.values().cloned().collect())
    }

    async fn list_wards(&self, council_id: &str) -> Result<Vec<Ward>, ProviderError> {
        Ok(self.wards_of(council_id).cloned().collect())
    }

    async fn get_ward(&self, ward_id: &str) -> Result<Option<Ward>, ProviderError> {
        Ok(self.wards.get(ward_id).cloned())
    }

    async fn get_ward_result(&self, ward_id: &str) -> Result<Option<WardResult>, ProviderError> {
        self.ward_result(ward_id)
    }

    async fn list_party_results(&self, ward_id: &str) -> Result<Vec<PartyResult>, ProviderError> {
        self.party_results(ward_id)
    }

    async fn count_incidents_by_type(
        &self,
        ward_id: &str,
    ) -> Result<BTreeMap<String, u64>, ProviderError> {
        self.incident_counts(ward_id)
    }

    async fn list_configured_parties(
        &self,
        council_id: &str,
    ) -> Result<Vec<String>, ProviderError> {
        Ok(self.parties_of(council_id))
    }

    async fn load_council(
        &self,
        council_id: &str,
    ) -> Result<Option<CouncilRecords>, ProviderError> {
        let Some(council) = self.councils.get(council_id) else {
            return Ok(None);
        };

        let wards = self
            .wards_of(council_id)
            .map(|ward| {
                Ok(WardRecords {
                    ward: ward.clone(),
                    result: self.ward_result(&ward.id)?,
                    party_results: self.party_results(&ward.id)?,
                    incidents_by_type: self.incident_counts(&ward.id)?,
                })
            })
            .collect::<Result<Vec<_>, ProviderError>>()?;

        Ok(Some(CouncilRecords {
            council: council.clone(),
            wards,
            configured_parties: self.parties_of(council_id),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "area_councils": [
            {"id": "kuje", "name": "Kuje", "state": "FCT"}
        ],
        "wards": [
            {"id": "k1", "area_council_id": "kuje", "name": "Chibiri",
             "total_polling_units": 14, "registered_voters": 9000},
            {"id": "k2", "area_council_id": "kuje", "name": "Gaube",
             "total_polling_units": 9, "registered_voters": 5000}
        ],
        "ward_results": [
            {"ward_id": "k1", "votes_cast": 100, "updated_at": "2026-02-21T17:00:00Z"},
            {"ward_id": "k1", "votes_cast": 250, "updated_at": "2026-02-21T19:00:00Z"}
        ],
        "party_results": [
            {"ward_id": "k1", "party_name": "APC", "score": 90},
            {"ward_id": "k1", "party_name": "APC", "score": 120}
        ],
        "incidents": [
            {"ward_id": "k2", "type": "Logistics", "timestamp": "2026-02-21T10:00:00Z"}
        ],
        "configured_parties": {"kuje": ["APC", "PDP"]}
    }"#;

    #[tokio::test]
    async fn test_latest_rows_win() {
        let provider = SnapshotProvider::from_json(SNAPSHOT).unwrap();

        let result = provider.get_ward_result("k1").await.unwrap().unwrap();
        assert_eq!(result.votes.votes_cast, 250);

        let parties = provider.list_party_results("k1").await.unwrap();
        assert_eq!(parties.len(), 1);
        assert_eq!(parties[0].score, 120);
    }

    #[tokio::test]
    async fn test_load_council_from_snapshot() {
        let provider = SnapshotProvider::from_json(SNAPSHOT).unwrap();
        let records = provider.load_council("kuje").await.unwrap().unwrap();

        assert_eq!(records.wards.len(), 2);
        assert!(records.wards[1].result.is_none());
        assert_eq!(records.wards[1].incidents_by_type.get("Logistics"), Some(&1));
        assert_eq!(records.configured_parties, vec!["APC", "PDP"]);
        assert!(provider.load_council("gwagwalada").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_row_surfaces_on_read() {
        let json = SNAPSHOT.replace(r#""votes_cast": 250"#, r#""votes_cast": "lots""#);
        let provider = SnapshotProvider::from_json(&json).unwrap();

        let err = provider.load_council("kuje").await.unwrap_err();
        match err {
            ProviderError::Malformed { entity, key, .. } => {
                assert_eq!(entity, "ward_result");
                assert_eq!(key, "k1");
            }
            other => panic!("unexpected error: {other}"),
        }
        // Wards without bad rows still read fine.
        assert!(provider.get_ward_result("k2").await.unwrap().is_none());
    }

    #[test]
    fn test_rejects_orphan_ward() {
        let json = r#"{"wards": [{"id": "x", "area_council_id": "nowhere", "name": "X",
            "total_polling_units": 1, "registered_voters": 1}]}"#;
        assert!(SnapshotProvider::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_row_without_ward_id() {
        let json = r#"{"incidents": [{"type": "Fraud"}]}"#;
        assert!(SnapshotProvider::from_json(json).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();

        let provider = SnapshotProvider::load(file.path()).unwrap();
        assert_eq!(provider.wards.len(), 2);
    }

    #[test]
    fn test_demo_snapshot_lists_wards_by_id() {
        let provider = SnapshotProvider::from_json(include_str!("../../demos/abuja.json")).unwrap();

        let wards = tokio_test::block_on(provider.list_wards("amac")).unwrap();
        let ids: Vec<&str> = wards.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["amac-01", "amac-02", "amac-03"]);

        assert!(tokio_test::block_on(provider.list_wards("gwagwalada")).unwrap().is_empty());
        let parties = tokio_test::block_on(provider.list_configured_parties("kuje")).unwrap();
        assert!(parties.is_empty());
    }

    #[tokio::test]
    async fn test_missing_timestamp_stays_missing() {
        let json = SNAPSHOT.replace(r#", "updated_at": "2026-02-21T19:00:00Z""#, "");
        let provider = SnapshotProvider::from_json(&json).unwrap();

        let first = provider.get_ward_result("k1").await.unwrap().unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = provider.get_ward_result("k1").await.unwrap().unwrap();

        assert_eq!(first.updated_at, None);
        assert_eq!(first, second);

        let records = provider.load_council("kuje").await.unwrap().unwrap();
        let summary = crate::analysis::summarize_ward(
            &records.wards[0],
            &records.configured_parties,
            &Default::default(),
        );
        assert!(summary.reported);
        assert!(summary.updated_at.is_none());
    }
}
