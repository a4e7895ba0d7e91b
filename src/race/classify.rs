// Sat Oct 17 2026 - Alex

use std::fmt;

use super::outcome::RaceStatus;
use super::page;
use super::submit::SubmissionResponse;
use crate::config::{AmbiguousPolicy, BotSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    HttpStatus(u16),
    SuccessMarker(String),
    ErrorMarker(String),
    BackOnForm,
    NoMarkers,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::HttpStatus(code) => write!(f, "HTTP {}", code),
            Reason::SuccessMarker(m) => write!(f, "success marker '{}'", m),
            Reason::ErrorMarker(m) => write!(f, "error marker '{}'", m),
            Reason::BackOnForm => write!(f, "returned to the registration form"),
            Reason::NoMarkers => write!(f, "no known marker"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: RaceStatus,
    pub reason: Reason,
}

/// Maps a submission response to a status. Checks run in a fixed order and the first hit wins.
#[derive(Debug, Clone)]
pub struct ResponseClassifier {
    success_markers: Vec<String>,
    error_markers: Vec<String>,
    policy: AmbiguousPolicy,
}

impl ResponseClassifier {
    pub fn new(success_markers: &[String], error_markers: &[String], policy: AmbiguousPolicy) -> Self {
        let lower = |markers: &[String]| {
            markers
                .iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect()
        };
        Self {
            success_markers: lower(success_markers),
            error_markers: lower(error_markers),
            policy,
        }
    }

    pub fn from_settings(settings: &BotSettings) -> Self {
        Self::new(&settings.success_markers, &settings.error_markers, settings.ambiguous_policy)
    }

    pub fn classify(&self, response: &SubmissionResponse) -> Classification {
        if let Some(code) = response.http_status {
            if !(200..300).contains(&code) {
                return Self::verdict(RaceStatus::Failed, Reason::HttpStatus(code));
            }
        }

        let body = response.body.to_lowercase();
        if let Some(marker) = self.success_markers.iter().find(|m| body.contains(m.as_str())) {
            return Self::verdict(RaceStatus::Success, Reason::SuccessMarker(marker.clone()));
        }
        if let Some(marker) = self.error_markers.iter().find(|m| body.contains(m.as_str())) {
            return Self::verdict(RaceStatus::Failed, Reason::ErrorMarker(marker.clone()));
        }
        if page::is_form_url(&response.final_url) && page::has_form_markers(&response.body) {
            return Self::verdict(RaceStatus::Failed, Reason::BackOnForm);
        }

        let status = match self.policy {
            AmbiguousPolicy::AssumeSuccess => RaceStatus::Ambiguous,
            AmbiguousPolicy::TreatAsFailed => RaceStatus::Failed,
        };
        Self::verdict(status, Reason::NoMarkers)
    }

    fn verdict(status: RaceStatus, reason: Reason) -> Classification {
        Classification { status, reason }
    }
}
