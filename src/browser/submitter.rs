// Sat Oct 17 2026 - Alex

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use super::BrowserDriver;
use crate::config::BotSettings;
use crate::profile::{FieldKind, RegistrantProfile};
use crate::race::clock::{seconds_between, Clock};
use crate::race::page::{self, FORM_BUTTON_MARKER, FORM_FIELD_MARKER};
use crate::race::submit::{FormSubmitter, SubmissionResponse, SubmitError};
use crate::race::FormTokens;

/// Fills the form in a real browser. The page carries its own hidden state,
/// so the monitor's tokens only serve as the go signal.
pub struct BrowserSubmitter {
    driver: Box<dyn BrowserDriver>,
    clock: Arc<dyn Clock>,
    form_timeout: Duration,
    settle: Duration,
    started: bool,
}

impl BrowserSubmitter {
    pub fn new(driver: Box<dyn BrowserDriver>, clock: Arc<dyn Clock>, settings: &BotSettings) -> Self {
        Self {
            driver,
            clock,
            form_timeout: Duration::from_secs_f64(settings.browser_form_timeout_seconds.max(0.0)),
            settle: Duration::from_secs_f64(settings.browser_settle_seconds.max(0.0)),
            started: false,
        }
    }

    fn fill(&mut self, profile: &RegistrantProfile) -> Result<(), SubmitError> {
        for (name, value, kind) in profile.browser_fields() {
            if value.is_empty() {
                continue;
            }
            match kind {
                FieldKind::Select => self.driver.select_option(name, &value)?,
                FieldKind::Input => self.driver.fill_input(name, &value)?,
            }
        }
        Ok(())
    }
}

impl FormSubmitter for BrowserSubmitter {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn prepare(&mut self) -> Result<(), SubmitError> {
        self.driver.start()?;
        self.started = true;
        Ok(())
    }

    fn submit(
        &mut self,
        url: &str,
        _tokens: &FormTokens,
        profile: &RegistrantProfile,
        _timeout: Duration,
    ) -> Result<SubmissionResponse, SubmitError> {
        let started = self.clock.now();
        self.driver.navigate(url)?;
        let navigated = self.clock.now();

        self.driver.wait_for_named(FORM_FIELD_MARKER, self.form_timeout)?;
        let landed = self.driver.current_url()?;
        if !page::is_form_url(&landed) {
            warn!("Browser was redirected to {}", landed);
            return Err(SubmitError::Redirected(landed));
        }
        let form_ready = self.clock.now();

        self.fill(profile)?;
        let filled = self.clock.now();

        self.driver.click(FORM_BUTTON_MARKER)?;
        let clicked = self.clock.now();

        info!(
            "Form submitted in {:.2}s (navigation {:.2}s, form {:.2}s, fill {:.2}s, click {:.2}s)",
            seconds_between(started, clicked),
            seconds_between(started, navigated),
            seconds_between(navigated, form_ready),
            seconds_between(form_ready, filled),
            seconds_between(filled, clicked)
        );

        self.clock.sleep(self.settle);

        Ok(SubmissionResponse {
            http_status: None,
            final_url: self.driver.current_url()?,
            body: self.driver.page_source()?,
        })
    }

    fn shutdown(&mut self) {
        if self.started {
            self.driver.quit();
            self.started = false;
        }
    }
}
