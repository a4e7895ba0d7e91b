// Sat Oct 17 2026 - Alex

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::{json, Value};

use super::{BrowserDriver, BrowserError};
use crate::net::USER_AGENT;

/// W3C element reference key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const FIND_RETRY: Duration = Duration::from_millis(100);

/// Minimal W3C WebDriver client (chromedriver or compatible) over blocking HTTP.
pub struct WebDriverClient {
    base_url: String,
    headless: bool,
    http: Client,
    session: Option<String>,
}

impl WebDriverClient {
    pub fn new(base_url: &str, headless: bool) -> Result<Self, BrowserError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BrowserError::Unreachable(base_url.to_string(), e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            headless,
            http,
            session: None,
        })
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_deref()
    }

    fn capabilities(&self) -> Value {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--disable-extensions".to_string(),
            "--window-size=1920,1080".to_string(),
            format!("--user-agent={}", USER_AGENT),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "pageLoadStrategy": "eager",
                    "goog:chromeOptions": {
                        "args": args,
                        "prefs": {
                            "profile.managed_default_content_settings.images": 2,
                            "profile.default_content_setting_values.notifications": 2,
                            "profile.managed_default_content_settings.media_stream": 2
                        }
                    }
                }
            }
        })
    }

    fn session_path(&self, suffix: &str) -> Result<String, BrowserError> {
        let id = self.session.as_ref().ok_or(BrowserError::NoSession)?;
        Ok(format!("/session/{}{}", id, suffix))
    }

    /// Sends one command and unwraps the `value` member of the reply.
    fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, BrowserError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .map_err(|e| BrowserError::Unreachable(self.base_url.clone(), e.to_string()))?;
        let status = response.status();
        let reply: Value = response
            .json()
            .map_err(|e| BrowserError::Protocol(format!("{} {}: {}", method, path, e)))?;
        let value = reply.get("value").cloned().unwrap_or(Value::Null);

        if !status.is_success() {
            let field = |key: &str| value.get(key).and_then(Value::as_str).unwrap_or("").to_string();
            return Err(BrowserError::Command {
                command: format!("{} {}", method, path),
                error: field("error"),
                message: field("message"),
            });
        }
        Ok(value)
    }

    fn find(&self, css: &str) -> Result<String, BrowserError> {
        let path = self.session_path("/element")?;
        let value = self.command(Method::POST, &path, Some(json!({"using": "css selector", "value": css})))?;
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .ok_or_else(|| BrowserError::Protocol(format!("no element reference for {}", css)))
    }

    fn element_command(&self, element: &str, action: &str, body: Value) -> Result<(), BrowserError> {
        let path = self.session_path(&format!("/element/{}/{}", element, action))?;
        self.command(Method::POST, &path, Some(body))?;
        Ok(())
    }

    fn by_name(name: &str) -> String {
        format!("[name=\"{}\"]", name.replace('"', "\\\""))
    }
}

impl BrowserDriver for WebDriverClient {
    fn start(&mut self) -> Result<(), BrowserError> {
        if self.session.is_some() {
            return Ok(());
        }
        let value = self.command(Method::POST, "/session", Some(self.capabilities()))?;
        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::Protocol("session reply without sessionId".to_string()))?;
        info!("Browser session {} opened", id);
        self.session = Some(id.to_string());
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let path = self.session_path("/url")?;
        self.command(Method::POST, &path, Some(json!({ "url": url })))?;
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, BrowserError> {
        let path = self.session_path("/url")?;
        let value = self.command(Method::GET, &path, None)?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| BrowserError::Protocol("url is not a string".to_string()))
    }

    fn wait_for_named(&mut self, name: &str, timeout: Duration) -> Result<(), BrowserError> {
        let started = Instant::now();
        loop {
            match self.find(&Self::by_name(name)) {
                Ok(_) => return Ok(()),
                Err(e) if e.is_no_such_element() => {
                    if started.elapsed() >= timeout {
                        return Err(BrowserError::Timeout(name.to_string(), timeout));
                    }
                    thread::sleep(FIND_RETRY);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn fill_input(&mut self, name: &str, value: &str) -> Result<(), BrowserError> {
        let element = self.find(&Self::by_name(name))?;
        self.element_command(&element, "clear", json!({}))?;
        self.element_command(&element, "value", json!({ "text": value }))
    }

    fn select_option(&mut self, name: &str, value: &str) -> Result<(), BrowserError> {
        let css = format!("select{} option[value=\"{}\"]", Self::by_name(name), value.replace('"', "\\\""));
        let option = self.find(&css)?;
        self.element_command(&option, "click", json!({}))
    }

    fn click(&mut self, name: &str) -> Result<(), BrowserError> {
        let element = self.find(&Self::by_name(name))?;
        self.element_command(&element, "click", json!({}))
    }

    fn page_source(&mut self) -> Result<String, BrowserError> {
        let path = self.session_path("/source")?;
        let value = self.command(Method::GET, &path, None)?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| BrowserError::Protocol("source is not a string".to_string()))
    }

    fn quit(&mut self) {
        let Some(id) = self.session.take() else {
            return;
        };
        match self.command(Method::DELETE, &format!("/session/{}", id), None) {
            Ok(_) => debug!("Browser session {} closed", id),
            Err(e) => warn!("Could not close browser session {}: {}", id, e),
        }
    }
}

impl Drop for WebDriverClient {
    fn drop(&mut self) {
        self.quit();
    }
}
