use crate::error::ESResult;
use crate::progress::new_progress_bar;
use derive_more::Display;
use error_stack::{Report, ResultExt};
use serde::de::DeserializeOwned;
use std::error::Error;
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, warn};

const MAX_RETRIES: u32 = 3;

/// Catalog bodies are buffered in full. GitHub release listings run to several megabytes.
const MAX_BODY_SIZE: u64 = 256 * 1024 * 1024;

#[derive(Debug, Display)]
pub enum HttpError {
    #[display("HTTP request failed")]
    Transport,
    #[display("HTTP request returned status {_0}")]
    Status(u16),
    #[display("Could not decode HTTP response body")]
    Decode,
    #[display("Could not write HTTP response body")]
    Write,
}

impl Error for HttpError {}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Raw value of the `Link` header, if any.
    pub link: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> ESResult<T, HttpError> {
        serde_json::from_slice(&self.body)
            .change_context(HttpError::Decode)
            .attach_with(|| format!("Status: {}", self.status))
    }

    /// The `rel="next"` target of a GitHub-style `Link` header.
    pub fn next_link(&self) -> Option<String> {
        let link = self.link.as_deref()?;
        link.split(',').find_map(|part| {
            let (target, params) = part.split_once(';')?;
            let is_next = params
                .split(';')
                .any(|p| p.trim().replace(' ', "") == "rel=\"next\"");
            if !is_next {
                return None;
            }
            let target = target.trim();
            Some(
                target
                    .strip_prefix('<')
                    .and_then(|t| t.strip_suffix('>'))
                    .unwrap_or(target)
                    .to_string(),
            )
        })
    }

    /// Fail with [`HttpError::Status`] unless the status is 2xx.
    pub fn error_for_status(self) -> ESResult<Self, HttpError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Report::new(HttpError::Status(self.status)))
        }
    }
}

/// The blocking HTTP surface resolvers talk to.
pub trait HttpClient {
    /// Fetch `url`, returning the response whatever its status.
    fn get(&self, url: &str, headers: &[(String, String)]) -> ESResult<HttpResponse, HttpError>;

    /// Probe `url` with a HEAD request and return the status code.
    fn head(&self, url: &str) -> ESResult<u16, HttpError>;

    /// Stream the body of `url` into `sink`, returning the number of bytes written.
    fn download(&self, url: &str, sink: &mut dyn Write) -> ESResult<u64, HttpError>;
}

/// Headers for GitHub API requests that should return raw file content.
pub fn github_headers(token: Option<&str>) -> Vec<(String, String)> {
    let mut headers = vec![(
        "accept".to_string(),
        "application/vnd.github.VERSION.raw".to_string(),
    )];
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        headers.push(("authorization".to_string(), format!("token {}", token)));
    }
    headers
}

pub struct UreqHttpClient {
    agent: ureq::Agent,
    retry_delay: Duration,
}

impl UreqHttpClient {
    pub fn new() -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(5)))
            .timeout_recv_response(Some(Duration::from_secs(30)))
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
                " (",
                env!("CARGO_PKG_REPOSITORY"),
                ")",
            ))
            .https_only(true)
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            retry_delay: Duration::from_secs(2),
        }
    }

    /// Run `request` until it yields a non-5xx response, retrying transport failures and
    /// server errors up to [`MAX_RETRIES`] times.
    fn with_retry(
        &self,
        url: &str,
        request: impl Fn() -> Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    ) -> ESResult<ureq::http::Response<ureq::Body>, HttpError> {
        let mut attempt = 0;
        loop {
            let outcome = request();
            let retryable = match &outcome {
                Ok(response) => response.status().is_server_error(),
                Err(_) => true,
            };
            if !retryable || attempt >= MAX_RETRIES {
                return outcome
                    .change_context(HttpError::Transport)
                    .attach_with(|| format!("URL: {}", url));
            }
            attempt += 1;
            match &outcome {
                Ok(response) => warn!(
                    "{} returned {}, retrying ({}/{})",
                    url,
                    response.status(),
                    attempt,
                    MAX_RETRIES
                ),
                Err(err) => warn!(
                    "Request to {} failed: {}, retrying ({}/{})",
                    url, err, attempt, MAX_RETRIES
                ),
            }
            std::thread::sleep(self.retry_delay * attempt);
        }
    }
}

impl Default for UreqHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for UreqHttpClient {
    fn get(&self, url: &str, headers: &[(String, String)]) -> ESResult<HttpResponse, HttpError> {
        debug!("GET {}", url);
        let response = self.with_retry(url, || {
            let mut request = self.agent.get(url);
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }
            request.call()
        })?;
        let status = response.status().as_u16();
        let link = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .into_body()
            .with_config()
            .limit(MAX_BODY_SIZE)
            .read_to_vec()
            .change_context(HttpError::Transport)
            .attach_with(|| format!("URL: {}", url))?;
        Ok(HttpResponse { status, link, body })
    }

    fn head(&self, url: &str) -> ESResult<u16, HttpError> {
        debug!("HEAD {}", url);
        let response = self.with_retry(url, || self.agent.head(url).call())?;
        Ok(response.status().as_u16())
    }

    fn download(&self, url: &str, sink: &mut dyn Write) -> ESResult<u64, HttpError> {
        debug!("Downloading {}", url);
        let response = self.with_retry(url, || self.agent.get(url).call())?;
        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(Report::new(HttpError::Status(status)).attach(format!("URL: {}", url)));
        }
        let mut body = response.into_body();
        let progress = new_progress_bar(body.content_length());
        let mut reader = progress.wrap_read(body.as_reader());
        let mut buffer = [0u8; 64 * 1024];
        let mut written = 0u64;
        loop {
            let read = reader
                .read(&mut buffer)
                .change_context(HttpError::Transport)
                .attach_with(|| format!("URL: {}", url))?;
            if read == 0 {
                break;
            }
            sink.write_all(&buffer[..read])
                .change_context(HttpError::Write)?;
            written += read as u64;
        }
        progress.finish_and_clear();
        Ok(written)
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Canned responses keyed by exact URL. Unknown URLs answer 404.
    #[derive(Default)]
    pub struct FakeHttpClient {
        responses: HashMap<String, HttpResponse>,
        heads: HashMap<String, u16>,
        pub requests: RefCell<Vec<(String, Vec<(String, String)>)>>,
    }

    impl FakeHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(mut self, url: &str, status: u16, body: &[u8]) -> Self {
            self.responses.insert(
                url.to_string(),
                HttpResponse {
                    status,
                    link: None,
                    body: body.to_vec(),
                },
            );
            self
        }

        pub fn with_json(self, url: &str, body: &str) -> Self {
            self.with_response(url, 200, body.as_bytes())
        }

        pub fn with_link(mut self, url: &str, body: &str, link: &str) -> Self {
            self.responses.insert(
                url.to_string(),
                HttpResponse {
                    status: 200,
                    link: Some(link.to_string()),
                    body: body.as_bytes().to_vec(),
                },
            );
            self
        }

        pub fn with_head(mut self, url: &str, status: u16) -> Self {
            self.heads.insert(url.to_string(), status);
            self
        }

        pub fn requested_urls(&self) -> Vec<String> {
            self.requests
                .borrow()
                .iter()
                .map(|(url, _)| url.clone())
                .collect()
        }
    }

    impl HttpClient for FakeHttpClient {
        fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> ESResult<HttpResponse, HttpError> {
            self.requests
                .borrow_mut()
                .push((url.to_string(), headers.to_vec()));
            Ok(self.responses.get(url).cloned().unwrap_or(HttpResponse {
                status: 404,
                link: None,
                body: Vec::new(),
            }))
        }

        fn head(&self, url: &str) -> ESResult<u16, HttpError> {
            self.requests.borrow_mut().push((url.to_string(), Vec::new()));
            Ok(self.heads.get(url).copied().unwrap_or(404))
        }

        fn download(&self, url: &str, sink: &mut dyn Write) -> ESResult<u64, HttpError> {
            let response = self.get(url, &[])?.error_for_status()?;
            sink.write_all(&response.body)
                .change_context(HttpError::Write)?;
            Ok(response.body.len() as u64)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn response_with_link(link: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            link: Some(link.to_string()),
            body: Vec::new(),
        }
    }

    #[test]
    fn test_next_link() {
        let response = response_with_link(
            "<https://api.github.com/repositories/1/releases?page=2>; rel=\"next\", \
             <https://api.github.com/repositories/1/releases?page=5>; rel=\"last\"",
        );
        assert_eq!(
            Some("https://api.github.com/repositories/1/releases?page=2".to_string()),
            response.next_link()
        );
    }

    #[test]
    fn test_next_link_absent() {
        let response = response_with_link(
            "<https://api.github.com/repositories/1/releases?page=1>; rel=\"prev\"",
        );
        assert_eq!(None, response.next_link());
        let no_header = HttpResponse {
            status: 200,
            link: None,
            body: Vec::new(),
        };
        assert_eq!(None, no_header.next_link());
    }

    #[test]
    fn test_json_decode_failure() {
        let response = HttpResponse {
            status: 200,
            link: None,
            body: b"not json".to_vec(),
        };
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err.current_context(), HttpError::Decode));
    }

    #[test]
    fn test_github_headers() {
        assert_eq!(
            vec![(
                "accept".to_string(),
                "application/vnd.github.VERSION.raw".to_string()
            )],
            github_headers(None)
        );
        assert_eq!(
            vec![
                (
                    "accept".to_string(),
                    "application/vnd.github.VERSION.raw".to_string()
                ),
                ("authorization".to_string(), "token abc".to_string()),
            ],
            github_headers(Some("abc"))
        );
        assert_eq!(1, github_headers(Some("")).len());
    }
}
