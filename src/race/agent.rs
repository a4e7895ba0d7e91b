// Sat Oct 17 2026 - Alex

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use super::clock::{seconds_between, sleep_for, CancelToken, Clock, SystemClock};
use super::error::RaceError;
use super::monitor::AvailabilityMonitor;
use super::outcome::RaceOutcome;
use super::submit::{FormSubmitter, HttpSubmitter, SubmissionEngine, SubmitDecision, SubmitError};
use crate::browser::{BrowserDriver, BrowserSubmitter, WebDriverClient};
use crate::config::{registration_url, BotSettings};
use crate::net::{HtmlParser, HttpClient, ReqwestClient, ScraperHtmlParser};
use crate::output::DiagnosticsWriter;
use crate::profile::RegistrantProfile;
use crate::tournament::TournamentRaceConfig;
use crate::window::{TournamentWindow, WindowCalculator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    #[default]
    #[serde(rename = "http", alias = "curl")]
    PureHttp,
    #[serde(rename = "browser", alias = "selenium")]
    BrowserAutomation,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::PureHttp => "http",
            Strategy::BrowserAutomation => "browser",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "curl" => Ok(Strategy::PureHttp),
            "browser" | "selenium" => Ok(Strategy::BrowserAutomation),
            other => Err(format!("unknown strategy '{}' (expected http or browser)", other)),
        }
    }
}

/// One registrant, one tournament, one strategy: wait, poll, submit, report.
pub struct RaceAgent {
    registrant_id: String,
    profile: RegistrantProfile,
    window: TournamentWindow,
    url: String,
    settings: BotSettings,
    strategy: Strategy,
    client: Arc<dyn HttpClient>,
    parser: Arc<dyn HtmlParser>,
    clock: Arc<dyn Clock>,
    cancel: CancelToken,
    driver: Option<Box<dyn BrowserDriver>>,
    diagnostics: Option<DiagnosticsWriter>,
}

impl RaceAgent {
    /// Validates everything a run depends on. No network traffic happens here.
    pub fn new(
        registrant_id: impl Into<String>,
        profile: RegistrantProfile,
        config: &TournamentRaceConfig,
        settings: &BotSettings,
        strategy: Strategy,
    ) -> Result<Self, RaceError> {
        let registrant_id = registrant_id.into();
        profile.validate()?;
        settings.validate()?;

        let problems = config.validate();
        if !problems.is_empty() {
            return Err(RaceError::Configuration(problems.join("; ")));
        }

        let calculator = WindowCalculator::new(settings.timezone()?);
        let window = config.window(&calculator)?;

        Ok(Self {
            registrant_id,
            profile,
            window,
            url: registration_url(config.tournament_id),
            settings: settings.clone(),
            strategy,
            client: Arc::new(ReqwestClient::new()?),
            parser: Arc::new(ScraperHtmlParser::new()),
            clock: Arc::new(SystemClock),
            cancel: CancelToken::new(),
            driver: None,
            diagnostics: None,
        })
    }

    pub fn with_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = client;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_driver(mut self, driver: Box<dyn BrowserDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn with_diagnostics(mut self, writer: DiagnosticsWriter) -> Self {
        self.diagnostics = Some(writer);
        self
    }

    pub fn window(&self) -> &TournamentWindow {
        &self.window
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn registrant_id(&self) -> &str {
        &self.registrant_id
    }

    fn build_submitter(&mut self) -> Result<Box<dyn FormSubmitter>, RaceError> {
        let submitter: Box<dyn FormSubmitter> = match self.strategy {
            Strategy::PureHttp => Box::new(HttpSubmitter::new(self.client.clone())),
            Strategy::BrowserAutomation => {
                let driver: Box<dyn BrowserDriver> = match self.driver.take() {
                    Some(driver) => driver,
                    None => Box::new(WebDriverClient::new(
                        &self.settings.webdriver_url,
                        self.settings.browser_headless,
                    )?),
                };
                Box::new(BrowserSubmitter::new(driver, self.clock.clone(), &self.settings))
            }
        };
        Ok(submitter)
    }

    fn cancelled(&self, attempts: u32) -> RaceOutcome {
        warn!("Race cancelled for {}", self.registrant_id);
        RaceOutcome::cancelled(
            &self.registrant_id,
            seconds_between(self.window.registration_opens_at, self.clock.now()),
            attempts,
        )
    }

    /// Runs the race to a terminal outcome. Errors are reserved for setup problems;
    /// cancellation yields a `Cancelled` outcome.
    pub fn run(&mut self) -> Result<RaceOutcome, RaceError> {
        let tz = self.settings.timezone()?;
        info!(
            "Racing tournament {} for {} via {}",
            self.window.tournament_id,
            self.profile.display_name(),
            self.strategy
        );
        info!(
            "Registration opens {} / monitoring from {}",
            self.window.opens_at_in(tz).format("%d-%m-%Y %H:%M:%S %Z"),
            self.window.monitoring_starts_in(tz).format("%H:%M:%S")
        );

        let mut monitor = AvailabilityMonitor::new(
            self.url.clone(),
            self.window,
            self.client.clone(),
            self.parser.clone(),
            self.clock.clone(),
            self.cancel.clone(),
            &self.settings,
        );

        match monitor.wait_for_start() {
            Ok(()) => {}
            Err(RaceError::Cancelled) => return Ok(self.cancelled(0)),
            Err(e) => return Err(e),
        }

        let submitter = self.build_submitter()?;
        let mut engine = SubmissionEngine::new(
            self.registrant_id.clone(),
            self.url.clone(),
            submitter,
            &self.settings,
            self.clock.clone(),
            self.window.registration_opens_at,
        );
        if let Some(writer) = &self.diagnostics {
            engine = engine.with_diagnostics(writer.clone());
        }

        if let Err(e) = engine.prepare() {
            engine.shutdown();
            return Err(match e {
                SubmitError::Browser(b) => RaceError::Browser(b),
                SubmitError::Net(n) => RaceError::Network(n),
                SubmitError::Redirected(url) => RaceError::Configuration(format!("unexpected redirect to {}", url)),
            });
        }

        let result = self.race(&mut monitor, &mut engine);
        engine.shutdown();

        if let Ok(outcome) = &result {
            info!(
                "Finished: {} after {} attempt(s), {:+.3}s from opening, {} polls",
                outcome.status,
                outcome.attempts,
                outcome.elapsed_seconds,
                monitor.polls()
            );
        }
        result
    }

    fn race(&self, monitor: &mut AvailabilityMonitor, engine: &mut SubmissionEngine) -> Result<RaceOutcome, RaceError> {
        loop {
            match monitor.run_until_ready() {
                Ok(()) => {}
                Err(RaceError::Cancelled) => return Ok(self.cancelled(engine.attempts())),
                Err(e) => return Err(e),
            }

            let Some(tokens) = monitor.begin_submission() else {
                error!("Form detected without cached tokens, polling again");
                continue;
            };

            let outcome = engine.submit(&tokens, &self.profile);
            match engine.settle(outcome, monitor) {
                SubmitDecision::Finished(outcome) => return Ok(outcome),
                SubmitDecision::Retry => {
                    let pause = engine.retry_policy().pause;
                    if !sleep_for(self.clock.as_ref(), pause, &self.cancel) {
                        monitor.give_up();
                        return Ok(self.cancelled(engine.attempts()));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::FakeDriver;
    use crate::net::{HttpResponse, NetError};
    use crate::race::outcome::RaceStatus;
    use crate::race::testing::{closed_response, form_response, ScriptedHttpClient, VirtualClock};

    fn profile() -> RegistrantProfile {
        let mut p = RegistrantProfile::new("Marie", "Dupont", "marie@example.org");
        p.federation = "FFB".to_string();
        p.nationality = "FRA".to_string();
        p.country = "FRA".to_string();
        p
    }

    fn config() -> TournamentRaceConfig {
        TournamentRaceConfig::new(362, "18-January-2026")
    }

    fn agent(client: Arc<ScriptedHttpClient>, clock: Arc<VirtualClock>, strategy: Strategy) -> RaceAgent {
        RaceAgent::new("marie", profile(), &config(), &BotSettings::default(), strategy)
            .unwrap()
            .with_client(client)
            .with_clock(clock)
    }

    fn confirmed() -> Result<HttpResponse, NetError> {
        Ok(HttpResponse::new(200, "https://files.umb-carom.org/public/Done.aspx", "Registration confirmed"))
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!("curl".parse::<Strategy>().unwrap(), Strategy::PureHttp);
        assert_eq!("Selenium".parse::<Strategy>().unwrap(), Strategy::BrowserAutomation);
        assert!("carrier-pigeon".parse::<Strategy>().is_err());

        let parsed: Vec<Strategy> = serde_json::from_str(r#"["http","curl","browser","selenium"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![Strategy::PureHttp, Strategy::PureHttp, Strategy::BrowserAutomation, Strategy::BrowserAutomation]
        );
        assert_eq!(serde_json::to_string(&Strategy::BrowserAutomation).unwrap(), "\"browser\"");
    }

    #[test]
    fn test_missing_required_field_is_configuration_error() {
        let mut p = profile();
        p.email.clear();
        let err = RaceAgent::new("marie", p, &config(), &BotSettings::default(), Strategy::PureHttp)
            .err()
            .unwrap();
        assert!(matches!(err, RaceError::Profile(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_bad_registration_date_is_rejected() {
        let config = TournamentRaceConfig::new(362, "31-Februrary-2026");
        let err = RaceAgent::new("marie", profile(), &config, &BotSettings::default(), Strategy::PureHttp)
            .err()
            .unwrap();
        assert!(matches!(err, RaceError::Configuration(_) | RaceError::InvalidDate(_)));
    }

    #[test]
    fn test_http_race_end_to_end() {
        let clock = Arc::new(VirtualClock::at("2026-01-18T10:59:00Z"));
        let client = Arc::new(
            ScriptedHttpClient::new()
                .on_get_times(closed_response(), 20)
                .on_get(Ok(form_response("vs", "ev")))
                .on_post(confirmed()),
        );
        let mut agent = agent(client.clone(), clock.clone(), Strategy::PureHttp);

        let outcome = agent.run().unwrap();
        assert_eq!(outcome.status, RaceStatus::Success);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(client.get_count(), 21);
        assert_eq!(client.posted().len(), 1);
        assert!(clock.now() >= agent.window().monitoring_starts_at);
    }

    #[test]
    fn test_failed_submission_polls_for_fresh_tokens() {
        let clock = Arc::new(VirtualClock::at("2026-01-18T11:00:00Z"));
        let client = Arc::new(
            ScriptedHttpClient::new()
                .on_get(Ok(form_response("vs-1", "ev-1")))
                .on_get(Ok(form_response("vs-2", "ev-2")))
                .on_post(Ok(HttpResponse::new(200, "https://x/Result.aspx", "Error: session expired")))
                .on_post(confirmed()),
        );
        let mut agent = agent(client.clone(), clock, Strategy::PureHttp);

        let outcome = agent.run().unwrap();
        assert_eq!(outcome.status, RaceStatus::Success);
        assert_eq!(outcome.attempts, 2);

        let posted = client.posted();
        let view_state = |form: &Vec<(String, String)>| {
            form.iter().find(|(k, _)| k == "__VIEWSTATE").map(|(_, v)| v.clone()).unwrap()
        };
        assert_eq!(view_state(&posted[0]), "vs-1");
        assert_eq!(view_state(&posted[1]), "vs-2");
    }

    #[test]
    fn test_cancelled_before_start() {
        let clock = Arc::new(VirtualClock::at("2026-01-18T09:00:00Z"));
        let client = Arc::new(ScriptedHttpClient::new());
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut agent = agent(client.clone(), clock, Strategy::PureHttp).with_cancel(cancel);

        let outcome = agent.run().unwrap();
        assert_eq!(outcome.status, RaceStatus::Cancelled);
        assert_eq!(outcome.exit_code(), 130);
        assert_eq!(client.get_count(), 0);
    }

    #[test]
    fn test_browser_race_uses_driver() {
        let clock = Arc::new(VirtualClock::at("2026-01-18T11:00:00Z"));
        let client = Arc::new(ScriptedHttpClient::new().on_get(Ok(form_response("vs", "ev"))));
        let driver = FakeDriver::new("https://files.umb-carom.org/public/PlayerModify.aspx?tourID=362")
            .after_click("https://files.umb-carom.org/public/Done.aspx", "<p>Thank you</p>");
        let log = driver.log();
        let mut agent = agent(client.clone(), clock, Strategy::BrowserAutomation).with_driver(Box::new(driver));

        let outcome = agent.run().unwrap();
        assert_eq!(outcome.status, RaceStatus::Success);
        assert!(client.posted().is_empty());

        let calls = log.lock().clone();
        assert_eq!(calls.first().map(String::as_str), Some("start"));
        assert!(calls.contains(&"select ddlFedration=FFB".to_string()));
        assert!(calls.contains(&"fill txtLName=Dupont".to_string()));
        assert!(calls.contains(&"click btnSave".to_string()));
        assert_eq!(calls.last().map(String::as_str), Some("quit"));
    }
}
