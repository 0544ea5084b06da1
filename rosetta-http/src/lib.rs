//! Minimal HTTP client with safe logging and retries.
//!
//! - Request options: headers, query params, timeout, retries
//! - Redacts passwords and tokens in query/form logging
//! - Retries network failures, 429 and 5xx with exponential backoff and `Retry-After`
//! - Keeps a cookie store so a wiki login survives across requests
//! - Optional *raw* request/response logging via `ROSETTA_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```no_run
//! # async fn demo() -> Result<(), rosetta_http::HttpError> {
//! let client = rosetta_http::HttpClient::new("http://rosettacode.org")?;
//! let html = client
//!     .get_text("wiki/100_doors", rosetta_http::RequestOpts::default())
//!     .await?;
//! # let _ = html;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), retries and final errors, plus
//! raw curl lines (target `http.raw`) when `ROSETTA_HTTP_RAW=1`.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

const RAW_ENV: &str = "ROSETTA_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const USER_AGENT: &str = concat!("rosetta-robot/", env!("CARGO_PKG_VERSION"));

const SECRET_KEYS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "token",
    "secret",
    "client_secret",
    "bearer",
    "password",
    "lgpassword",
    "lgtoken",
    "logintoken",
];

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret(key: &str) -> bool {
    SECRET_KEYS.contains(&key.to_ascii_lowercase().as_str())
}

fn redact_pairs<'a, I>(pairs: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| {
            let v = if is_secret(k) { "<redacted>" } else { v };
            (k.to_string(), v.to_string())
        })
        .collect()
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, form: Option<&[(&str, &str)]>) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in headers.iter() {
        let mut v = val.to_str().unwrap_or("").to_string();
        if name.as_str().eq_ignore_ascii_case("authorization") || name.as_str().eq_ignore_ascii_case("cookie") {
            v = "<redacted>".into();
        }
        parts.push(format!(
            "-H '{}: {}'",
            name.as_str(),
            v.replace('\'', r"'\''")
        ));
    }
    if let Some(pairs) = form {
        for (k, v) in redact_pairs(pairs.iter().copied()) {
            let mut v = v;
            if v.len() > RAW_MAX_BODY {
                v.truncate(RAW_MAX_BODY);
                v.push('…');
            }
            parts.push(format!("--data-urlencode '{}={}'", k, v.replace('\'', r"'\''")));
        }
    }
    let (host_path, query) = redact_query(url);
    let query = query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let scheme = url.scheme();
    if query.is_empty() {
        parts.push(format!("'{scheme}://{host_path}'"));
    } else {
        parts.push(format!("'{scheme}://{host_path}?{query}'"));
    }
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("authorization") || key.eq_ignore_ascii_case("set-cookie") {
                val = "<redacted>".into();
            }
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

// ==============================
// Request Options
// ==============================

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use rosetta_http::RequestOpts;
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     retries: Some(1),
///     query: Some(vec![("action", Cow::Borrowed("query"))]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    /// Otherwise a `path` resolving off the base's origin is an `HttpError::Url`.
    pub allow_absolute: bool,
}

impl<'a> RequestOpts<'a> {
    /// Options for following a fully qualified URL scraped from a page.
    pub fn absolute() -> Self {
        Self {
            allow_absolute: true,
            ..Default::default()
        }
    }
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use rosetta_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("http://rosettacode.org")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Override the default retry budget returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use rosetta_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("http://rosettacode.org")?.with_retries(5);
    /// assert_eq!(client.max_retries, 5);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET a page and return its body decoded as (lossy) UTF-8.
    pub async fn get_text(&self, path: &str, opts: RequestOpts<'_>) -> Result<String, HttpError> {
        let bytes = self.send(Method::GET, path, None, opts).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// GET JSON with per-request options (headers/query/timeout/retries).
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let bytes = self.send(Method::GET, path, None, opts).await?;
        decode_json(&bytes)
    }

    /// POST an `application/x-www-form-urlencoded` body and decode a JSON reply.
    pub async fn post_form_json<T>(
        &self,
        path: &str,
        form: &[(&str, &str)],
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let bytes = self.send(Method::POST, path, Some(form), opts).await?;
        decode_json(&bytes)
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute && let Ok(abs) = Url::parse(path) {
            return Ok(abs);
        }
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;
        // `join` lets an absolute input replace the base entirely.
        if url.origin() != self.base.origin() {
            return Err(HttpError::Url(format!(
                "{path} leaves {}; set allow_absolute to follow it",
                self.base
            )));
        }
        Ok(url)
    }

    // ==============================
    // Core request implementation
    // ==============================

    async fn send(
        &self,
        method: Method,
        path: &str,
        form: Option<&[(&str, &str)]>,
        opts: RequestOpts<'_>,
    ) -> Result<Vec<u8>, HttpError> {
        let url = self.resolve(path, opts.allow_absolute)?;

        let mut attempt = 0usize;
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let req_id = format!("r{}", REQUEST_SEQ.fetch_add(1, Ordering::Relaxed));

        loop {
            // ----- Build request -----
            let mut rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(timeout);

            if let Some(q) = &opts.query {
                let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
                rb = rb.query(&pairs);
            }
            if let Some(pairs) = form {
                rb = rb.form(pairs);
            }
            if let Some(hdrs) = &opts.headers {
                rb = rb.headers(hdrs.clone());
            }

            // ----- Safe request logging (pre-send) -----
            let (host_path, url_query) = redact_query(&url);
            let redacted_q = redact_pairs(
                opts.query
                    .iter()
                    .flatten()
                    .map(|(k, v)| (*k, &**v)),
            );
            let redacted_form = form
                .map(|pairs| redact_pairs(pairs.iter().copied()))
                .unwrap_or_default();

            tracing::debug!(
                req_id=%req_id,
                attempt=attempt + 1,
                max_retries,
                method=%method,
                host_path=%host_path,
                url_query=?url_query,
                query=?redacted_q,
                form=?redacted_form,
                timeout_ms=timeout.as_millis() as u64,
                "http.request.start"
            );

            if raw_enabled() {
                let merged = opts.headers.clone().unwrap_or_default();
                let curl = make_curl(&method, &url, &merged, form);
                tracing::debug!(target: "http.raw", %req_id, %curl, "request");
            }

            // ----- Send -----
            let t0 = std::time::Instant::now();
            let resp = match rb.send().await {
                Ok(resp) => resp,
                Err(err) => {
                    let message = err.to_string();
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            max_retries,
                            backoff_ms=delay.as_millis() as u64,
                            message=%message,
                            "http.retrying.network_send"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(
                        req_id=%req_id,
                        attempt,
                        max_retries,
                        message=%message,
                        "http.network_error.send"
                    );
                    return Err(HttpError::Network(message));
                }
            };
            let status = resp.status();
            let headers = resp.headers().clone();
            let bytes = match resp.bytes().await {
                Ok(bytes) => bytes,
                Err(err) => {
                    let message = err.to_string();
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            max_retries,
                            backoff_ms=delay.as_millis() as u64,
                            message=%message,
                            "http.retrying.network_body"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(
                        req_id=%req_id,
                        attempt,
                        max_retries,
                        message=%message,
                        "http.network_error.body"
                    );
                    return Err(HttpError::Network(message));
                }
            };
            let dur_ms = t0.elapsed().as_millis() as u64;

            let req_hdr_id = headers
                .get("x-request-id")
                .or_else(|| headers.get("x-correlation-id"))
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");

            tracing::debug!(
                req_id=%req_id,
                %status,
                duration_ms=dur_ms,
                body_len=bytes.len(),
                x_request_id=%req_hdr_id,
                "http.response.headers"
            );

            if raw_enabled() {
                let hdrs = redact_headers(&headers);
                let truncated = bytes.len() > RAW_MAX_BODY;
                let text = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
                tracing::info!(
                    target:"http.raw",
                    %req_id,
                    status=%status,
                    duration_ms=dur_ms,
                    headers=?hdrs,
                    body=%text,
                    truncated
                );
            }

            let snippet = snip_body(&bytes);
            tracing::trace!(
                req_id=%req_id,
                body_snippet=%snippet,
                "http.response.body_snippet"
            );

            if status.is_success() {
                return Ok(bytes.to_vec());
            }

            // ----- Non-success: maybe retry -----
            let message = extract_error_message(&bytes);
            let request_id = req_hdr_id.to_string();

            let is_429 = status == StatusCode::TOO_MANY_REQUESTS;
            let is_5xx = status.is_server_error();

            if (is_429 || is_5xx) && attempt < max_retries {
                attempt += 1;
                let delay = if let Some(secs) = retry_after_delay_secs(&headers) {
                    Duration::from_secs(secs)
                } else if is_429 {
                    // default floor for 429 when no Retry-After is present
                    backoff(attempt).max(Duration::from_millis(1100))
                } else {
                    backoff(attempt)
                };
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    attempt,
                    max_retries,
                    backoff_ms=delay.as_millis() as u64,
                    message=%message,
                    "http.retrying"
                );
                sleep(delay).await;
                continue;
            }

            tracing::warn!(
                req_id=%req_id,
                %status,
                message=%message,
                x_request_id=%request_id,
                body_snippet=%snippet,
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id,
            });
        }
    }
}

// ==============================
// Helpers
// ==============================

fn backoff(attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(200u64.saturating_mul(1 << shift))
}

fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, HttpError> {
    serde_json::from_slice::<T>(bytes).map_err(|e| {
        let snippet = snip_body(bytes);
        tracing::warn!(
            serde_line=%e.line(),
            serde_col=%e.column(),
            serde_err=%e.to_string(),
            body_snippet=%snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

fn extract_error_message(body: &[u8]) -> String {
    // MediaWiki: {"error":{"code":"...","info":"..."}}
    #[derive(Deserialize)]
    struct WikiEnv {
        error: WikiDetail,
    }
    #[derive(Deserialize)]
    struct WikiDetail {
        #[serde(default)]
        code: String,
        #[serde(default)]
        info: String,
    }

    // Generic: {"message":"..."} or {"detail":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
    }

    if let Ok(env) = serde_json::from_slice::<WikiEnv>(body) {
        return match (env.error.code.is_empty(), env.error.info.is_empty()) {
            (false, false) => format!("{}: {}", env.error.code, env.error.info),
            (true, false) => env.error.info,
            _ => env.error.code,
        };
    }
    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        if !m.message.is_empty() {
            return m.message;
        }
        if !m.detail.is_empty() {
            return m.detail;
        }
    }
    snip_body(body)
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        let mut cut = 500;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    // "host + path" string and redacted query list for logging
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let secret = is_secret(&k);
            (k.into_owned(), if secret { "<redacted>".into() } else { v.into_owned() })
        })
        .collect::<Vec<_>>();
    (host_path, redacted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn secrets_are_redacted_case_insensitively() {
        let pairs = redact_pairs([("lgname", "robot"), ("lgPassword", "hunter2"), ("token", "abc+\\")]);
        assert_eq!(
            pairs,
            vec![
                ("lgname".to_string(), "robot".to_string()),
                ("lgPassword".to_string(), "<redacted>".to_string()),
                ("token".to_string(), "<redacted>".to_string()),
            ]
        );
    }

    #[test]
    fn query_redaction_keeps_host_and_path() {
        let url = Url::parse("http://rosettacode.org/mw/index.php?title=100_doors&token=xyz").unwrap();
        let (host_path, q) = redact_query(&url);
        assert_eq!(host_path, "rosettacode.org/mw/index.php");
        assert_eq!(q[0], ("title".to_string(), "100_doors".to_string()));
        assert_eq!(q[1], ("token".to_string(), "<redacted>".to_string()));
    }

    #[test]
    fn curl_never_contains_password() {
        let url = Url::parse("http://rosettacode.org/mw/api.php").unwrap();
        let curl = make_curl(
            &Method::POST,
            &url,
            &HeaderMap::new(),
            Some(&[("lgname", "robot"), ("lgpassword", "hunter2")][..]),
        );
        assert!(curl.starts_with("curl -XPOST"));
        assert!(curl.contains("lgname=robot"));
        assert!(!curl.contains("hunter2"));
        assert!(curl.ends_with("'http://rosettacode.org/mw/api.php'"));
    }

    #[test]
    fn wiki_error_messages_are_extracted() {
        let body = br#"{"error":{"code":"badtoken","info":"Invalid CSRF token."}}"#;
        assert_eq!(extract_error_message(body), "badtoken: Invalid CSRF token.");

        let body = br#"{"message":"slow down"}"#;
        assert_eq!(extract_error_message(body), "slow down");

        assert_eq!(extract_error_message(b"<html>oops</html>"), "<html>oops</html>");
    }

    #[test]
    fn retry_after_parses_seconds_only() {
        let mut h = HeaderMap::new();
        assert_eq!(retry_after_delay_secs(&h), None);
        h.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_after_delay_secs(&h), Some(3));
        h.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after_delay_secs(&h), None);
    }

    #[test]
    fn snippets_are_truncated_on_char_boundaries() {
        let body = "é".repeat(400);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= 503);
    }

    #[test]
    fn backoff_grows_exponentially() {
        assert_eq!(backoff(1), Duration::from_millis(200));
        assert_eq!(backoff(2), Duration::from_millis(400));
        assert_eq!(backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn absolute_paths_need_opt_in() {
        let client = HttpClient::new("http://rosettacode.org").unwrap();
        let abs = "http://example.org/wiki/x";
        assert_eq!(client.resolve(abs, true).unwrap().as_str(), abs);
        assert!(matches!(client.resolve(abs, false), Err(HttpError::Url(_))));
        assert!(matches!(
            client.resolve("//example.org/wiki/x", false),
            Err(HttpError::Url(_))
        ));
        assert_eq!(
            client.resolve("wiki/100_doors", false).unwrap().as_str(),
            "http://rosettacode.org/wiki/100_doors"
        );
    }

    #[test]
    fn same_origin_absolute_urls_resolve_without_opt_in() {
        let client = HttpClient::new("http://rosettacode.org").unwrap();
        let same = "http://rosettacode.org/mw/api.php";
        assert_eq!(client.resolve(same, false).unwrap().as_str(), same);
    }
}
