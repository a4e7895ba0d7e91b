// Sat Oct 17 2026 - Alex

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::TournamentError;
use crate::window::{is_world_cup, parse_date};

/// One row of the scraped tournament list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentRecord {
    pub id: u32,
    pub tournament: String,
    pub starts_on: String,
    #[serde(default)]
    pub ends_on: String,
    #[serde(default)]
    pub place: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TournamentRecord {
    pub fn start_date(&self) -> Option<NaiveDate> {
        parse_date(&self.starts_on).ok()
    }

    pub fn is_world_cup(&self) -> bool {
        is_world_cup(&self.tournament)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TournamentList {
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub tournaments: Vec<TournamentRecord>,
}

/// Read-only view over the scraper's JSON output.
pub struct TournamentStore {
    list: TournamentList,
}

impl TournamentStore {
    pub fn from_list(list: TournamentList) -> Self {
        Self { list }
    }

    /// A missing data file is an empty store; the scraper may simply not have run yet.
    pub fn load(path: &Path) -> Result<Self, TournamentError> {
        if !path.exists() {
            log::warn!("Tournament data not found at {}", path.display());
            return Ok(Self::from_list(TournamentList::default()));
        }

        let raw = fs::read_to_string(path).map_err(|e| TournamentError::Io(path.to_path_buf(), e))?;
        let list: TournamentList =
            serde_json::from_str(&raw).map_err(|e| TournamentError::Json(path.to_path_buf(), e))?;
        log::debug!("Loaded {} tournaments from {}", list.tournaments.len(), path.display());
        Ok(Self::from_list(list))
    }

    pub fn all(&self) -> &[TournamentRecord] {
        &self.list.tournaments
    }

    pub fn find(&self, id: u32) -> Option<&TournamentRecord> {
        self.list.tournaments.iter().find(|t| t.id == id)
    }

    /// World Cup 3-Cushion events starting after `today`, earliest first.
    /// Records with unparseable dates are skipped.
    pub fn upcoming_world_cups(&self, today: NaiveDate) -> Vec<&TournamentRecord> {
        let mut cups: Vec<(NaiveDate, &TournamentRecord)> = self
            .list
            .tournaments
            .iter()
            .filter(|t| t.is_world_cup())
            .filter_map(|t| t.start_date().map(|d| (d, t)))
            .filter(|(d, _)| *d > today)
            .collect();
        cups.sort_by_key(|(d, t)| (*d, t.id));
        cups.into_iter().map(|(_, t)| t).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, class: &str, starts_on: &str) -> TournamentRecord {
        TournamentRecord {
            id,
            tournament: class.to_string(),
            starts_on: starts_on.to_string(),
            ends_on: String::new(),
            place: "Bogota".to_string(),
            registration_start: None,
            url: None,
        }
    }

    #[test]
    fn test_upcoming_world_cups_filters_and_sorts() {
        let store = TournamentStore::from_list(TournamentList {
            metadata: serde_json::Value::Null,
            tournaments: vec![
                record(3, "World Cup 3-Cushion", "15-March-2026"),
                record(1, "World Cup 3-Cushion", "01-February-2026"),
                record(2, "World Championship 3-Cushion", "10-February-2026"),
                record(4, "World Cup 3-Cushion", "10-October-2025"),
                record(5, "World Cup 3-Cushion", "TBA"),
            ],
        });

        let today = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let ids: Vec<u32> = store.upcoming_world_cups(today).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_load_scraper_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("umb_tournaments.json");
        fs::write(
            &path,
            r#"{"metadata": {"scraped_at": "x"}, "tournaments": [
                {"id": 362, "tournament": "World Cup 3-Cushion", "starts_on": "15-March-2026",
                 "ends_on": "21-March-2026", "place": "Bogota",
                 "registration_start": "18-January-2026 à 12:00"}
            ]}"#,
        )
        .unwrap();

        let store = TournamentStore::load(&path).unwrap();
        let t = store.find(362).unwrap();
        assert!(t.is_world_cup());
        assert_eq!(t.registration_start.as_deref(), Some("18-January-2026 à 12:00"));
        assert!(store.find(1).is_none());
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TournamentStore::load(&dir.path().join("none.json")).unwrap();
        assert!(store.all().is_empty());
    }
}
