// Sat Oct 17 2026 - Alex

pub mod client;
pub mod html;

pub use client::{HttpClient, HttpResponse, ReqwestClient, USER_AGENT};
pub use html::{HtmlParser, ScraperHtmlParser};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    #[error("Request timed out")]
    Timeout,
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Could not build HTTP client: {0}")]
    Build(String),
}

impl From<reqwest::Error> for NetError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NetError::Timeout
        } else if e.is_connect() {
            NetError::Connect(e.to_string())
        } else {
            NetError::Request(e.to_string())
        }
    }
}
