// Sat Oct 17 2026 - Alex

use chrono::{DateTime, Utc};

use crate::net::HtmlParser;

pub const VIEW_STATE: &str = "__VIEWSTATE";
pub const EVENT_VALIDATION: &str = "__EVENTVALIDATION";
pub const VIEW_STATE_GENERATOR: &str = "__VIEWSTATEGENERATOR";

/// Hidden ASP.NET state a registration POST must echo back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormTokens {
    pub view_state: String,
    pub event_validation: String,
    pub generator: String,
    pub captured_at: DateTime<Utc>,
}

impl FormTokens {
    pub fn extract(parser: &dyn HtmlParser, html: &str, captured_at: DateTime<Utc>) -> Self {
        let value = |name| parser.input_value(html, name).unwrap_or_default();
        Self {
            view_state: value(VIEW_STATE),
            event_validation: value(EVENT_VALIDATION),
            generator: value(VIEW_STATE_GENERATOR),
            captured_at,
        }
    }

    /// The generator is optional; the other two are not.
    pub fn is_usable(&self) -> bool {
        !self.view_state.is_empty() && !self.event_validation.is_empty()
    }

    pub fn form_fields(&self) -> Vec<(String, String)> {
        vec![
            (VIEW_STATE.to_string(), self.view_state.clone()),
            (EVENT_VALIDATION.to_string(), self.event_validation.clone()),
            (VIEW_STATE_GENERATOR.to_string(), self.generator.clone()),
        ]
    }
}

/// Holds at most one set of tokens, valid for exactly one submission attempt.
#[derive(Debug, Default)]
pub struct TokenCache {
    current: Option<FormTokens>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, tokens: FormTokens) {
        self.current = Some(tokens);
    }

    pub fn current(&self) -> Option<&FormTokens> {
        self.current.as_ref()
    }

    pub fn take(&mut self) -> Option<FormTokens> {
        self.current.take()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}
