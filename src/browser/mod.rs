// Sat Oct 17 2026 - Alex

pub mod driver;
pub mod submitter;
pub mod webdriver;

pub use driver::BrowserDriver;
pub use submitter::BrowserSubmitter;
pub use webdriver::WebDriverClient;

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("WebDriver unreachable at {0}: {1}")]
    Unreachable(String, String),
    #[error("WebDriver command '{command}' failed: {error} ({message})")]
    Command {
        command: String,
        error: String,
        message: String,
    },
    #[error("No browser session is open")]
    NoSession,
    #[error("Element '{0}' did not appear within {1:?}")]
    Timeout(String, Duration),
    #[error("Unexpected WebDriver reply: {0}")]
    Protocol(String),
}

impl BrowserError {
    pub fn is_no_such_element(&self) -> bool {
        matches!(self, BrowserError::Command { error, .. } if error == "no such element")
    }
}
