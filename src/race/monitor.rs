// Sat Oct 17 2026 - Alex

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use super::clock::{seconds_between, sleep_for, sleep_until, CancelToken, Clock};
use super::error::RaceError;
use super::page::{self, PageKind};
use super::tokens::{FormTokens, TokenCache};
use crate::config::BotSettings;
use crate::net::{HtmlParser, HttpClient};
use crate::window::TournamentWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Waiting,
    Polling,
    FormDetected,
    Submitting,
    GivingUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    FormReady,
    RedirectOrClosed,
    /// Form markers present but the hidden state fields are empty.
    MissingTokens,
    Unrecognized,
    HttpError(u16),
    NetworkError(String),
}

impl PollStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollStatus::FormReady)
    }
}

impl fmt::Display for PollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollStatus::FormReady => write!(f, "FORM_READY"),
            PollStatus::RedirectOrClosed => write!(f, "REDIRECT_OR_CLOSED"),
            PollStatus::MissingTokens => write!(f, "MISSING_TOKENS"),
            PollStatus::Unrecognized => write!(f, "UNRECOGNIZED"),
            PollStatus::HttpError(code) => write!(f, "HTTP_ERROR({})", code),
            PollStatus::NetworkError(e) => write!(f, "NETWORK_ERROR({})", e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalPolicy {
    pub normal: Duration,
    pub critical: Duration,
    pub critical_window: Duration,
}

impl IntervalPolicy {
    pub fn from_settings(settings: &BotSettings) -> Self {
        Self {
            normal: settings.normal_interval(),
            critical: settings.critical_interval(),
            critical_window: settings.critical_window(),
        }
    }

    /// `seconds_to_open` is negative once the opening instant has passed.
    pub fn interval_for(&self, seconds_to_open: f64) -> Duration {
        if seconds_to_open > self.critical_window.as_secs_f64() {
            self.normal
        } else {
            self.critical
        }
    }
}

/// Polls one registration URL until the form is served. Owns the token cache for its run.
pub struct AvailabilityMonitor {
    url: String,
    window: TournamentWindow,
    client: Arc<dyn HttpClient>,
    parser: Arc<dyn HtmlParser>,
    clock: Arc<dyn Clock>,
    cancel: CancelToken,
    intervals: IntervalPolicy,
    poll_timeout: Duration,
    progress_every: u64,
    state: MonitorState,
    tokens: TokenCache,
    polls: u64,
    target_reached: bool,
}

impl AvailabilityMonitor {
    pub fn new(
        url: impl Into<String>,
        window: TournamentWindow,
        client: Arc<dyn HttpClient>,
        parser: Arc<dyn HtmlParser>,
        clock: Arc<dyn Clock>,
        cancel: CancelToken,
        settings: &BotSettings,
    ) -> Self {
        Self {
            url: url.into(),
            window,
            client,
            parser,
            clock,
            cancel,
            intervals: IntervalPolicy::from_settings(settings),
            poll_timeout: settings.poll_timeout(),
            progress_every: settings.progress_log_every.max(1),
            state: MonitorState::Idle,
            tokens: TokenCache::new(),
            polls: 0,
            target_reached: false,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn token_cache(&self) -> &TokenCache {
        &self.tokens
    }

    pub fn window(&self) -> &TournamentWindow {
        &self.window
    }

    fn transition(&mut self, next: MonitorState) {
        if self.state == next {
            return;
        }
        info!(
            "[{}] Monitor {:?} -> {:?}",
            self.clock.now().format("%H:%M:%S%.3f"),
            self.state,
            next
        );
        self.state = next;
    }

    /// Blocks until monitoring should start. Returns `Cancelled` if interrupted.
    pub fn wait_for_start(&mut self) -> Result<(), RaceError> {
        let start = self.window.monitoring_starts_at;
        if self.clock.now() < start {
            self.transition(MonitorState::Waiting);
            info!(
                "Waiting {:.1}s until monitoring starts",
                seconds_between(self.clock.now(), start)
            );
            if !sleep_until(self.clock.as_ref(), start, &self.cancel) {
                self.give_up();
                return Err(RaceError::Cancelled);
            }
        }
        self.transition(MonitorState::Polling);
        Ok(())
    }

    /// One GET and its classification. Stores tokens on `FormReady`.
    pub fn poll_once(&mut self) -> PollStatus {
        self.polls += 1;
        let sent_at = self.clock.now();
        let result = self.client.get(&self.url, self.poll_timeout);
        let received_at = self.clock.now();
        let latency_ms = seconds_between(sent_at, received_at) * 1000.0;

        let status = match result {
            Err(e) => PollStatus::NetworkError(e.to_string()),
            Ok(response) if !response.is_success() => PollStatus::HttpError(response.status),
            Ok(response) => match page::classify_page(&response.final_url, &response.body) {
                PageKind::RegistrationForm => {
                    let tokens = FormTokens::extract(self.parser.as_ref(), &response.body, received_at);
                    if tokens.is_usable() {
                        self.tokens.store(tokens);
                        PollStatus::FormReady
                    } else {
                        PollStatus::MissingTokens
                    }
                }
                PageKind::Closed => PollStatus::RedirectOrClosed,
                PageKind::Unknown => PollStatus::Unrecognized,
            },
        };

        if !self.target_reached && received_at >= self.window.registration_opens_at {
            self.target_reached = true;
            info!("Target time reached after {} polls", self.polls);
        }

        match &status {
            PollStatus::FormReady => {
                info!("Form detected on poll #{} ({:.1} ms)", self.polls, latency_ms)
            }
            PollStatus::MissingTokens => warn!("Form served without usable tokens on poll #{}", self.polls),
            _ if self.polls % self.progress_every == 0 => info!(
                "Poll #{}: {} ({:.1} ms), T{:+.2}s",
                self.polls,
                status,
                latency_ms,
                -self.window.seconds_until_open(received_at)
            ),
            _ => debug!("Poll #{}: {} ({:.1} ms)", self.polls, status, latency_ms),
        }

        status
    }

    /// Polls until the form is ready, leaving the monitor in `FormDetected`.
    pub fn run_until_ready(&mut self) -> Result<(), RaceError> {
        if matches!(self.state, MonitorState::Idle | MonitorState::Waiting) {
            self.wait_for_start()?;
        }
        self.transition(MonitorState::Polling);

        loop {
            if self.cancel.is_cancelled() {
                self.give_up();
                return Err(RaceError::Cancelled);
            }
            if self.poll_once().is_ready() {
                self.transition(MonitorState::FormDetected);
                return Ok(());
            }
            let interval = self
                .intervals
                .interval_for(self.window.seconds_until_open(self.clock.now()));
            if !sleep_for(self.clock.as_ref(), interval, &self.cancel) {
                self.give_up();
                return Err(RaceError::Cancelled);
            }
        }
    }

    /// Hands the freshly captured tokens to the submitter.
    pub fn begin_submission(&mut self) -> Option<FormTokens> {
        if self.state != MonitorState::FormDetected {
            return None;
        }
        self.transition(MonitorState::Submitting);
        self.tokens.current().cloned()
    }

    /// Drops the cached tokens so the next attempt needs a fresh poll.
    pub fn discard_tokens(&mut self) {
        self.tokens.clear();
        if self.state == MonitorState::Submitting {
            self.transition(MonitorState::Polling);
        }
    }

    pub fn give_up(&mut self) {
        self.transition(MonitorState::GivingUp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{NetError, ScraperHtmlParser};
    use crate::race::testing::{closed_response, form_response, ScriptedHttpClient, VirtualClock, FORM_URL};
    use crate::window::WindowCalculator;

    fn window() -> TournamentWindow {
        // 18 January 2026 12:00 Paris is 11:00 UTC.
        WindowCalculator::new(chrono_tz::Europe::Paris)
            .from_registration(362, "18-January-2026", "12:00:00")
            .unwrap()
    }

    fn monitor(
        client: Arc<ScriptedHttpClient>,
        clock: Arc<VirtualClock>,
        cancel: CancelToken,
    ) -> AvailabilityMonitor {
        monitor_for(window(), client, clock, cancel)
    }

    fn monitor_for(
        window: TournamentWindow,
        client: Arc<ScriptedHttpClient>,
        clock: Arc<VirtualClock>,
        cancel: CancelToken,
    ) -> AvailabilityMonitor {
        AvailabilityMonitor::new(
            FORM_URL,
            window,
            client,
            Arc::new(ScraperHtmlParser::new()),
            clock,
            cancel,
            &BotSettings::default(),
        )
    }

    #[test]
    fn test_interval_policy() {
        let policy = IntervalPolicy::from_settings(&BotSettings::default());
        assert_eq!(policy.interval_for(60.0), Duration::from_millis(500));
        assert_eq!(policy.interval_for(10.0), Duration::from_millis(50));
        assert_eq!(policy.interval_for(-3.0), Duration::from_millis(50));
    }

    #[test]
    fn test_wait_for_start_sleeps_until_monitoring_start() {
        let clock = Arc::new(VirtualClock::at("2026-01-18T10:58:00Z"));
        let client = Arc::new(ScriptedHttpClient::new());
        let mut m = monitor(client.clone(), clock.clone(), CancelToken::new());

        m.wait_for_start().unwrap();
        assert_eq!(m.state(), MonitorState::Polling);
        assert_eq!(clock.now(), window().monitoring_starts_at);
        assert_eq!(client.get_count(), 0);
    }

    #[test]
    fn test_detects_form_after_closed_polls() {
        let clock = Arc::new(VirtualClock::at("2026-01-18T10:59:55Z"));
        let client = Arc::new(
            ScriptedHttpClient::new()
                .on_get_times(closed_response(), 4)
                .on_get(Err(NetError::Timeout))
                .on_get(Ok(form_response("vs-fresh", "ev-fresh"))),
        );
        let mut m = monitor(client.clone(), clock.clone(), CancelToken::new());

        m.run_until_ready().unwrap();

        assert_eq!(m.state(), MonitorState::FormDetected);
        assert_eq!(client.get_count(), 6);
        let tokens = m.token_cache().current().unwrap();
        assert_eq!(tokens.view_state, "vs-fresh");
        assert_eq!(tokens.event_validation, "ev-fresh");
        // Inside the critical window every gap is the short interval.
        assert!(clock.sleeps().iter().all(|d| *d <= Duration::from_millis(50)));
    }

    #[test]
    fn test_readiness_detected_within_one_interval() {
        let clock = Arc::new(VirtualClock::at("2026-01-18T10:59:00Z"));
        let k = 7;
        let client = Arc::new(
            ScriptedHttpClient::new()
                .on_get_times(closed_response(), k)
                .on_get(Ok(form_response("vs", "ev"))),
        );
        let mut m = monitor(client.clone(), clock.clone(), CancelToken::new());
        m.wait_for_start().unwrap();

        let mut kth_poll_at = None;
        for _ in 0..k {
            assert_eq!(m.poll_once(), PollStatus::RedirectOrClosed);
            kth_poll_at = Some(clock.now());
            clock.advance(Duration::from_millis(50));
        }
        m.run_until_ready().unwrap();

        let detected_at = m.token_cache().current().unwrap().captured_at;
        let gap = seconds_between(kth_poll_at.unwrap(), detected_at);
        assert!(gap <= 0.5, "gap {}", gap);
        assert_eq!(m.polls(), (k + 1) as u64);
    }

    #[test]
    fn test_normal_interval_far_from_target() {
        let clock = Arc::new(VirtualClock::at("2026-01-18T10:59:00Z"));
        let client = Arc::new(
            ScriptedHttpClient::new()
                .on_get_times(closed_response(), 3)
                .on_get(Ok(form_response("vs", "ev"))),
        );
        let early = WindowCalculator::new(chrono_tz::Europe::Paris)
            .with_lead_time(60)
            .from_registration(362, "18-January-2026", "12:00:00")
            .unwrap();
        let mut m = monitor_for(early, client, clock.clone(), CancelToken::new());
        m.run_until_ready().unwrap();

        // 60s before opening: three normal gaps, each sliced into 100ms sleeps.
        let total: Duration = clock.sleeps().iter().sum();
        assert_eq!(total, Duration::from_millis(1500));
    }

    #[test]
    fn test_form_without_tokens_is_not_ready() {
        let clock = Arc::new(VirtualClock::at("2026-01-18T10:59:58Z"));
        let client = Arc::new(
            ScriptedHttpClient::new()
                .on_get(Ok(form_response("", "")))
                .on_get(Ok(form_response("vs", "ev"))),
        );
        let mut m = monitor(client, clock, CancelToken::new());
        m.wait_for_start().unwrap();

        assert_eq!(m.poll_once(), PollStatus::MissingTokens);
        assert!(m.token_cache().is_empty());
        assert_eq!(m.poll_once(), PollStatus::FormReady);
    }

    #[test]
    fn test_http_error_status() {
        let clock = Arc::new(VirtualClock::at("2026-01-18T10:59:58Z"));
        let client = Arc::new(
            ScriptedHttpClient::new().on_get(Ok(crate::net::HttpResponse::new(503, FORM_URL, "busy"))),
        );
        let mut m = monitor(client, clock, CancelToken::new());
        assert_eq!(m.poll_once(), PollStatus::HttpError(503));
    }

    #[test]
    fn test_cancel_gives_up() {
        let clock = Arc::new(VirtualClock::at("2026-01-18T10:59:58Z"));
        let client = Arc::new(ScriptedHttpClient::new().on_get(Ok(closed_response())));
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut m = monitor(client.clone(), clock, cancel);

        assert!(matches!(m.run_until_ready(), Err(RaceError::Cancelled)));
        assert_eq!(m.state(), MonitorState::GivingUp);
        assert_eq!(client.get_count(), 0);
    }

    #[test]
    fn test_submission_and_discard() {
        let clock = Arc::new(VirtualClock::at("2026-01-18T10:59:58Z"));
        let client = Arc::new(ScriptedHttpClient::new().on_get(Ok(form_response("vs", "ev"))));
        let mut m = monitor(client, clock, CancelToken::new());
        m.run_until_ready().unwrap();

        let tokens = m.begin_submission().unwrap();
        assert_eq!(tokens.view_state, "vs");
        assert_eq!(m.state(), MonitorState::Submitting);

        m.discard_tokens();
        assert!(m.token_cache().is_empty());
        assert_eq!(m.state(), MonitorState::Polling);
        assert!(m.begin_submission().is_none());
    }
}
