// Sat Oct 17 2026 - Alex

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use thiserror::Error;

use super::classify::ResponseClassifier;
use super::clock::{seconds_between, Clock};
use super::monitor::AvailabilityMonitor;
use super::outcome::{RaceOutcome, RaceStatus};
use super::tokens::FormTokens;
use crate::browser::BrowserError;
use crate::config::BotSettings;
use crate::net::{HttpClient, NetError};
use crate::output::DiagnosticsWriter;
use crate::profile::RegistrantProfile;

pub const SUBMIT_BUTTON: (&str, &str) = ("btnSave", "Submit");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResponse {
    /// `None` when the page came from a browser, which hides the status code.
    pub http_status: Option<u16>,
    pub final_url: String,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Net(#[from] NetError),
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error("Registration page redirected to {0}")]
    Redirected(String),
}

/// One way of getting a filled form to the server.
pub trait FormSubmitter: Send {
    fn name(&self) -> &'static str;

    /// Called once before monitoring starts.
    fn prepare(&mut self) -> Result<(), SubmitError> {
        Ok(())
    }

    fn submit(
        &mut self,
        url: &str,
        tokens: &FormTokens,
        profile: &RegistrantProfile,
        timeout: Duration,
    ) -> Result<SubmissionResponse, SubmitError>;

    /// Called on every exit path after `prepare`.
    fn shutdown(&mut self) {}
}

/// The full urlencoded registration form, in page order.
pub fn build_payload(tokens: &FormTokens, profile: &RegistrantProfile) -> Vec<(String, String)> {
    let mut payload = vec![
        ("__EVENTTARGET".to_string(), String::new()),
        ("__EVENTARGUMENT".to_string(), String::new()),
    ];
    payload.extend(tokens.form_fields());
    payload.extend(profile.form_fields().into_iter().map(|(k, v)| (k.to_string(), v)));
    payload.push((SUBMIT_BUTTON.0.to_string(), SUBMIT_BUTTON.1.to_string()));
    payload
}

fn origin_of(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.origin().ascii_serialization(),
        Err(_) => url.to_string(),
    }
}

pub struct HttpSubmitter {
    client: Arc<dyn HttpClient>,
}

impl HttpSubmitter {
    /// Share the client used for polling so the session cookie travels with the POST.
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }
}

impl FormSubmitter for HttpSubmitter {
    fn name(&self) -> &'static str {
        "http"
    }

    fn submit(
        &mut self,
        url: &str,
        tokens: &FormTokens,
        profile: &RegistrantProfile,
        timeout: Duration,
    ) -> Result<SubmissionResponse, SubmitError> {
        let payload = build_payload(tokens, profile);
        let headers = vec![
            ("Origin".to_string(), origin_of(url)),
            ("Referer".to_string(), url.to_string()),
        ];
        let response = self.client.post_form(url, &payload, &headers, timeout)?;
        Ok(SubmissionResponse {
            http_status: Some(response.status),
            final_url: response.final_url,
            body: response.body,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries until success or cancellation.
    pub max_attempts: Option<u32>,
    pub pause: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &BotSettings) -> Self {
        Self {
            max_attempts: settings.max_submit_attempts,
            pause: settings.retry_pause(),
        }
    }

    pub fn allows_another(&self, attempts_made: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts_made < max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitDecision {
    Finished(RaceOutcome),
    /// Tokens were discarded; poll again and resubmit after the pause.
    Retry,
}

pub struct SubmissionEngine {
    registrant_id: String,
    url: String,
    submitter: Box<dyn FormSubmitter>,
    classifier: ResponseClassifier,
    retry: RetryPolicy,
    timeout: Duration,
    clock: Arc<dyn Clock>,
    /// Elapsed times are measured from here, normally the registration opening instant.
    reference: DateTime<Utc>,
    diagnostics: Option<DiagnosticsWriter>,
    attempts: u32,
}

impl SubmissionEngine {
    pub fn new(
        registrant_id: impl Into<String>,
        url: impl Into<String>,
        submitter: Box<dyn FormSubmitter>,
        settings: &BotSettings,
        clock: Arc<dyn Clock>,
        reference: DateTime<Utc>,
    ) -> Self {
        Self {
            registrant_id: registrant_id.into(),
            url: url.into(),
            submitter,
            classifier: ResponseClassifier::from_settings(settings),
            retry: RetryPolicy::from_settings(settings),
            timeout: settings.submit_timeout(),
            clock,
            reference,
            diagnostics: None,
            attempts: 0,
        }
    }

    pub fn with_diagnostics(mut self, writer: DiagnosticsWriter) -> Self {
        self.diagnostics = Some(writer);
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn strategy_name(&self) -> &'static str {
        self.submitter.name()
    }

    pub fn prepare(&mut self) -> Result<(), SubmitError> {
        self.submitter.prepare()
    }

    pub fn shutdown(&mut self) {
        self.submitter.shutdown();
    }

    fn elapsed(&self) -> f64 {
        seconds_between(self.reference, self.clock.now())
    }

    /// One submission attempt with the given tokens. Never retries by itself.
    pub fn submit(&mut self, tokens: &FormTokens, profile: &RegistrantProfile) -> RaceOutcome {
        self.attempts += 1;
        info!(
            "Submitting attempt #{} via {} (tokens captured {:.0} ms ago)",
            self.attempts,
            self.submitter.name(),
            seconds_between(tokens.captured_at, self.clock.now()) * 1000.0
        );

        let result = self.submitter.submit(&self.url, tokens, profile, self.timeout);
        let elapsed = self.elapsed();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                error!("Submission attempt #{} failed: {}", self.attempts, e);
                return RaceOutcome::new(&self.registrant_id, RaceStatus::Failed, elapsed)
                    .with_attempts(self.attempts);
            }
        };

        let verdict = self.classifier.classify(&response);
        match verdict.status {
            RaceStatus::Success => info!("Registration confirmed ({})", verdict.reason),
            RaceStatus::Ambiguous => warn!("Registration status unclear ({}), flagged for review", verdict.reason),
            _ => error!("Registration rejected ({})", verdict.reason),
        }

        let diagnostic = match (&self.diagnostics, verdict.status) {
            (Some(writer), RaceStatus::Failed | RaceStatus::Ambiguous) => writer.write(
                &self.registrant_id,
                verdict.status.label(),
                self.clock.now(),
                &response.body,
            ),
            _ => None,
        };

        RaceOutcome::new(&self.registrant_id, verdict.status, elapsed)
            .with_http_status(response.http_status)
            .with_attempts(self.attempts)
            .with_diagnostic(diagnostic)
    }

    /// Decides what happens after an attempt. Failed and ambiguous attempts always
    /// invalidate the monitor's tokens.
    pub fn settle(&self, outcome: RaceOutcome, monitor: &mut AvailabilityMonitor) -> SubmitDecision {
        match outcome.status {
            RaceStatus::Success | RaceStatus::Cancelled => SubmitDecision::Finished(outcome),
            RaceStatus::Ambiguous => {
                monitor.discard_tokens();
                SubmitDecision::Finished(outcome)
            }
            RaceStatus::Failed => {
                monitor.discard_tokens();
                if self.retry.allows_another(self.attempts) {
                    warn!("Attempt #{} failed, polling for fresh tokens", self.attempts);
                    SubmitDecision::Retry
                } else {
                    error!("Giving up after {} attempts", self.attempts);
                    SubmitDecision::Finished(outcome)
                }
            }
        }
    }
}
