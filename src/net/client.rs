// Sat Oct 17 2026 - Alex

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;

use super::NetError;

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// URL after redirects.
    pub final_url: String,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, final_url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            final_url: final_url.into(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport used by the poll loop and the HTTP submitter. Implementations must not
/// retry on their own; retry policy belongs to the caller.
pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, NetError>;

    fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, NetError>;
}

/// Blocking reqwest client with a shared cookie jar so the ASP.NET session cookie
/// captured while polling is sent back with the POST.
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, NetError> {
        let client = Client::builder()
            .default_headers(browser_headers())
            .cookie_store(true)
            .redirect(Policy::limited(10))
            .pool_max_idle_per_host(20)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| NetError::Build(e.to_string()))?;
        Ok(Self { client })
    }

    fn finish(response: reqwest::blocking::Response) -> Result<HttpResponse, NetError> {
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().map_err(NetError::from)?;
        Ok(HttpResponse { status, final_url, body })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, NetError> {
        let response = self.client.get(url).timeout(timeout).send()?;
        Self::finish(response)
    }

    fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, NetError> {
        let mut request = self.client.post(url).timeout(timeout).form(form);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request.send()?;
        Self::finish(response)
    }
}

fn browser_headers() -> HeaderMap {
    let pairs = [
        ("user-agent", USER_AGENT),
        ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
        ("accept-language", "en-US,en;q=0.5"),
        ("upgrade-insecure-requests", "1"),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "same-origin"),
        ("cache-control", "max-age=0"),
    ];

    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::thread;

    fn serve_once<F>(handler: F) -> (String, thread::JoinHandle<()>)
    where
        F: FnOnce(tiny_http::Request) + Send + 'static,
    {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let handle = thread::spawn(move || {
            if let Ok(request) = server.recv() {
                handler(request);
            }
        });
        (format!("http://127.0.0.1:{}", port), handle)
    }

    #[test]
    fn test_get_returns_status_and_body() {
        let (base, handle) = serve_once(|request| {
            let has_agent = request
                .headers()
                .iter()
                .any(|h| h.field.equiv("User-Agent") && h.value.as_str() == USER_AGENT);
            let body = if has_agent { "form txtLName" } else { "no agent" };
            request.respond(tiny_http::Response::from_string(body)).unwrap();
        });

        let client = ReqwestClient::new().unwrap();
        let response = client
            .get(&format!("{}/public/PlayerModify.aspx?tourID=1", base), Duration::from_secs(2))
            .unwrap();
        handle.join().unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "form txtLName");
        assert!(response.final_url.contains("PlayerModify.aspx"));
    }

    #[test]
    fn test_post_form_sends_urlencoded_body() {
        let (base, handle) = serve_once(|mut request| {
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body).unwrap();
            let referer = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Referer"))
                .map(|h| h.value.as_str().to_string())
                .unwrap_or_default();
            let reply = format!("{}|{}", body, referer);
            request
                .respond(tiny_http::Response::from_string(reply).with_status_code(201))
                .unwrap();
        });

        let client = ReqwestClient::new().unwrap();
        let form = vec![
            ("txtLName".to_string(), "Dupont".to_string()),
            ("btnSave".to_string(), "Submit".to_string()),
        ];
        let headers = vec![("Referer".to_string(), "http://example.org/form".to_string())];
        let response = client
            .post_form(&base, &form, &headers, Duration::from_secs(2))
            .unwrap();
        handle.join().unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.body, "txtLName=Dupont&btnSave=Submit|http://example.org/form");
    }

    #[test]
    fn test_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = ReqwestClient::new().unwrap();
        let err = client
            .get(&format!("http://127.0.0.1:{}/", port), Duration::from_millis(500))
            .unwrap_err();
        assert!(matches!(err, NetError::Connect(_) | NetError::Timeout | NetError::Request(_)));
    }
}
