// Sat Oct 17 2026 - Alex

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ProfileError;

static DATE_OF_BIRTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap());

pub const REQUIRED_FIELDS: &[&str] = &["lastName", "firstName", "email"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Input,
    Select,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrantProfile {
    pub federation: String,
    pub last_name: String,
    pub first_name: String,
    pub player_id: String,
    pub nationality: String,
    pub date_of_birth: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(alias = "contactFax", skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,
    pub email: String,
}

#[derive(Deserialize)]
struct ProfileFile {
    player_data: Option<RegistrantProfile>,
}

impl RegistrantProfile {
    pub fn new(first_name: &str, last_name: &str, email: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            ..Self::default()
        }
    }

    /// Reads a profile file and checks the required subset.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let profile = Self::load_unchecked(path)?;
        let missing = profile.missing_required();
        if !missing.is_empty() {
            return Err(ProfileError::MissingFields {
                path: path.to_path_buf(),
                fields: missing.iter().map(|s| s.to_string()).collect(),
            });
        }
        Ok(profile)
    }

    pub fn load_unchecked(path: &Path) -> Result<Self, ProfileError> {
        if !path.exists() {
            return Err(ProfileError::NotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path).map_err(|e| ProfileError::Io(path.to_path_buf(), e))?;
        let file: ProfileFile =
            serde_json::from_str(&raw).map_err(|e| ProfileError::Json(path.to_path_buf(), e))?;
        file.player_data
            .ok_or_else(|| ProfileError::MissingPlayerData(path.to_path_buf()))
    }

    pub fn missing_required(&self) -> Vec<&'static str> {
        let values = [&self.last_name, &self.first_name, &self.email];
        REQUIRED_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProfileError::Invalid(format!(
                "missing required fields: {}",
                missing.join(", ")
            )))
        }
    }

    /// Stricter checks used when preparing multi-player configs.
    pub fn strict_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let checks = [
            ("lastName", &self.last_name),
            ("firstName", &self.first_name),
            ("email", &self.email),
            ("federation", &self.federation),
            ("nationality", &self.nationality),
            ("country", &self.country),
        ];
        for (name, value) in checks {
            if value.trim().is_empty() {
                errors.push(format!("missing required field: {}", name));
            }
        }

        if !self.email.is_empty() && !self.email.contains('@') {
            errors.push("invalid email format".to_string());
        }

        if !self.date_of_birth.is_empty() && !DATE_OF_BIRTH.is_match(&self.date_of_birth) {
            errors.push("invalid date of birth (expected DD/MM/YYYY)".to_string());
        }

        errors
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Field values keyed by the registration form's input names.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        vec![
            ("ddlFedration", self.federation.clone()),
            ("txtLName", self.last_name.clone()),
            ("txtFName", self.first_name.clone()),
            ("txtRankID", self.player_id.clone()),
            ("ddlNationality", self.nationality.clone()),
            ("txtDOB", self.date_of_birth.clone()),
            ("ddlCountry", self.country.clone()),
            ("txtCity", opt(&self.city)),
            ("txtAddress", opt(&self.address)),
            ("txtPhone", opt(&self.phone)),
            ("txtEmail", self.email.clone()),
            ("txtFax", opt(&self.fax)),
        ]
    }

    /// The fields a browser run fills, in page order. Empty values are skipped by the caller.
    pub fn browser_fields(&self) -> Vec<(&'static str, String, FieldKind)> {
        vec![
            ("ddlFedration", self.federation.clone(), FieldKind::Select),
            ("txtLName", self.last_name.clone(), FieldKind::Input),
            ("txtFName", self.first_name.clone(), FieldKind::Input),
            ("txtRankID", self.player_id.clone(), FieldKind::Input),
            ("ddlNationality", self.nationality.clone(), FieldKind::Select),
            ("txtDOB", self.date_of_birth.clone(), FieldKind::Input),
            ("ddlCountry", self.country.clone(), FieldKind::Select),
            ("txtEmail", self.email.clone(), FieldKind::Input),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> RegistrantProfile {
        RegistrantProfile {
            federation: "FFB".to_string(),
            last_name: "Dupont".to_string(),
            first_name: "Marie".to_string(),
            player_id: "1234".to_string(),
            nationality: "FRA".to_string(),
            date_of_birth: "01/02/1990".to_string(),
            country: "FRA".to_string(),
            city: Some("Lyon".to_string()),
            address: None,
            phone: None,
            fax: Some("0400".to_string()),
            email: "marie@example.org".to_string(),
        }
    }

    #[test]
    fn test_parse_player_data_with_legacy_fax_key() {
        let json = r#"{"player_data": {"lastName": "Dupont", "firstName": "Marie",
            "email": "m@x.org", "contactFax": "0400", "federation": "FFB"}}"#;
        let file: ProfileFile = serde_json::from_str(json).unwrap();
        let profile = file.player_data.unwrap();
        assert_eq!(profile.fax.as_deref(), Some("0400"));
        assert_eq!(profile.federation, "FFB");
        assert!(profile.player_id.is_empty());
    }

    #[test]
    fn test_missing_required_fields() {
        let profile = RegistrantProfile::new("Marie", "", " ");
        assert_eq!(profile.missing_required(), vec!["lastName", "email"]);
        assert!(profile.validate().is_err());
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn test_strict_errors() {
        assert!(complete().strict_errors().is_empty());

        let mut profile = complete();
        profile.email = "not-an-email".to_string();
        profile.date_of_birth = "1990-02-01".to_string();
        profile.country.clear();
        let errors = profile.strict_errors();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("country")));
    }

    #[test]
    fn test_form_fields_mapping() {
        let fields = complete().form_fields();
        let get = |k: &str| fields.iter().find(|(n, _)| *n == k).map(|(_, v)| v.clone());
        assert_eq!(fields.len(), 12);
        assert_eq!(get("txtLName").as_deref(), Some("Dupont"));
        assert_eq!(get("ddlFedration").as_deref(), Some("FFB"));
        assert_eq!(get("txtAddress").as_deref(), Some(""));
        assert_eq!(get("txtFax").as_deref(), Some("0400"));
    }

    #[test]
    fn test_load_reports_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        fs::write(&path, r#"{"player_data": {"firstName": "Marie"}}"#).unwrap();
        match RegistrantProfile::load(&path) {
            Err(ProfileError::MissingFields { fields, .. }) => {
                assert_eq!(fields, vec!["lastName".to_string(), "email".to_string()]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_load_without_player_data_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        fs::write(&path, r#"{"lastName": "Dupont"}"#).unwrap();
        assert!(matches!(
            RegistrantProfile::load(&path),
            Err(ProfileError::MissingPlayerData(_))
        ));
    }
}
