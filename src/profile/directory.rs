// Sat Oct 17 2026 - Alex

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use itertools::Itertools;

use super::{ProfileError, RegistrantProfile};
use crate::race::Strategy;
use crate::tournament::{MultiRaceConfig, PlayerEntry};

const TEMPLATE_NAME: &str = "template";

#[derive(Debug, Clone)]
pub struct PlayerSummary {
    pub name: String,
    pub full_name: String,
    pub email: String,
    pub federation: String,
    pub errors: Vec<String>,
}

impl PlayerSummary {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The `config/players` directory, one JSON file per registrant.
pub struct PlayerDirectory {
    dir: PathBuf,
}

impl PlayerDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn file_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    pub fn list(&self) -> Result<Vec<String>, ProfileError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| ProfileError::Io(self.dir.clone(), e))?;
        let names = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|x| x.to_str()) == Some("json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(|s| s.to_string()))
            .filter(|name| name != TEMPLATE_NAME)
            .sorted()
            .collect();
        Ok(names)
    }

    pub fn load(&self, name: &str) -> Result<RegistrantProfile, ProfileError> {
        RegistrantProfile::load_unchecked(&self.file_for(name))
    }

    pub fn validate_player(&self, name: &str) -> Vec<String> {
        match self.load(name) {
            Ok(profile) => profile.strict_errors(),
            Err(e) => vec![e.to_string()],
        }
    }

    pub fn validate_all(&self, names: &[String]) -> IndexMap<String, Vec<String>> {
        names
            .iter()
            .map(|n| (n.clone(), self.validate_player(n)))
            .collect()
    }

    pub fn summaries(&self) -> Result<Vec<PlayerSummary>, ProfileError> {
        let summaries = self
            .list()?
            .into_iter()
            .map(|name| match self.load(&name) {
                Ok(profile) => PlayerSummary {
                    full_name: profile.display_name(),
                    email: profile.email.clone(),
                    federation: profile.federation.clone(),
                    errors: profile.strict_errors(),
                    name,
                },
                Err(e) => PlayerSummary {
                    full_name: "unreadable".to_string(),
                    email: String::new(),
                    federation: String::new(),
                    errors: vec![e.to_string()],
                    name,
                },
            })
            .collect();
        Ok(summaries)
    }

    /// Builds a multi-agent config for the given players, refusing if any of them
    /// fails strict validation.
    pub fn build_multi_config(
        &self,
        tournament_id: u32,
        registration_date: &str,
        players: &[(String, Strategy)],
    ) -> Result<MultiRaceConfig, ProfileError> {
        let names: Vec<String> = players.iter().map(|(n, _)| n.clone()).collect();
        let invalid = self
            .validate_all(&names)
            .into_iter()
            .filter(|(_, errors)| !errors.is_empty())
            .map(|(name, errors)| format!("{}: {}", name, errors.join(", ")))
            .join("; ");

        if !invalid.is_empty() {
            return Err(ProfileError::Invalid(format!("invalid players: {}", invalid)));
        }

        let entries = players
            .iter()
            .map(|(name, strategy)| PlayerEntry {
                name: name.clone(),
                config_file: self.file_for(name),
                bot_type: *strategy,
            })
            .collect();

        Ok(MultiRaceConfig::new(tournament_id, registration_date, entries))
    }
}
