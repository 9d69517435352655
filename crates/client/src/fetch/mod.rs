//! Hand-rolled HTTP/1.1 fetch pipeline with a persistent response cache.
//!
//! ### Wire Format
//! - One connection per request, `Connection: close`, GET only
//! - Response framed by connection close: no chunked or length-based framing
//! - Headers lowercased, later duplicates win
//!
//! ### Redirects
//! - Any 3xx with a `Location` header is followed while budget remains (default: 5)
//! - A 3xx without `Location`, or with the budget spent, is returned as final
//!
//! ### Caching
//! - Exact-URL lookup before any network activity
//! - Only the final response is stored, under the URL the caller asked for
//! - Failures to fetch or parse cache nothing

pub mod redirect;
pub mod request;
pub mod response;
pub mod tls;
pub mod transport;
pub mod url;

use ::url::Url;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use textweb_core::{AppConfig, Error, Response, ResponseCache};

pub use redirect::{is_redirect, resolve_location};
pub use request::Request;
pub use response::{parse as parse_response, read_all};
pub use tls::TlsPolicy;
pub use transport::{Connection, TcpTransport, Target, Transport};
pub use self::url::{UrlError, parse_url};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: Firefox 123 on Linux)
    pub user_agent: String,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: u32,

    /// Connect, handshake, and read timeout (default: 30s)
    pub timeout: Duration,

    /// Maximum response size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Server certificate policy (default: accept invalid)
    pub tls: TlsPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_redirects: config.max_redirects,
            timeout: config.timeout(),
            max_bytes: config.max_bytes,
            tls: TlsPolicy::from_accept_invalid(config.accept_invalid_certs),
        }
    }
}

/// Result of a fetch, with diagnostics.
#[derive(Debug)]
pub struct FetchOutcome {
    /// The URL requested, exactly as given
    pub url: String,
    /// The URL the final response came from
    pub final_url: String,
    /// The final response
    pub response: Response,
    /// Whether the response came from the cache
    pub from_cache: bool,
    /// Number of redirects followed
    pub redirects_followed: u32,
    /// Time taken in milliseconds
    pub fetch_ms: u64,
    /// Set when the response could not be written to the cache file
    pub cache_error: Option<Error>,
}

/// HTTP client with a response cache.
#[derive(Clone)]
pub struct FetchClient {
    transport: Arc<dyn Transport>,
    cache: ResponseCache,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a client that talks to real sockets.
    pub fn new(config: FetchConfig, cache: ResponseCache) -> Result<Self, Error> {
        let transport = TcpTransport::new(config.tls, config.timeout, config.max_bytes)?;
        Ok(Self::with_transport(config, cache, Arc::new(transport)))
    }

    /// Create a client over any transport.
    pub fn with_transport(config: FetchConfig, cache: ResponseCache, transport: Arc<dyn Transport>) -> Self {
        Self { transport, cache, config }
    }

    /// Fetch `url` with the configured redirect budget.
    pub async fn fetch(&self, url: &str) -> Result<FetchOutcome, Error> {
        self.fetch_with_redirects(url, self.config.max_redirects).await
    }

    /// Fetch `url`, following at most `budget` redirects.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` for a bad URL or redirect target,
    /// `Error::Connection`/`Error::Timeout`/`Error::TooLarge` for transport
    /// failures, and `Error::Parse` for malformed responses. A cache write
    /// failure is reported in `FetchOutcome::cache_error`, not here.
    pub async fn fetch_with_redirects(&self, url: &str, budget: u32) -> Result<FetchOutcome, Error> {
        let start = Instant::now();

        if let Some(response) = self.cache.get(url).await {
            tracing::debug!("cache hit for {}", url);
            return Ok(FetchOutcome {
                url: url.to_string(),
                final_url: url.to_string(),
                response,
                from_cache: true,
                redirects_followed: 0,
                fetch_ms: start.elapsed().as_millis() as u64,
                cache_error: None,
            });
        }

        tracing::debug!("cache miss for {}", url);

        let mut current = parse_url(url)?;
        let mut remaining = budget;
        let mut redirects_followed = 0;

        let response = loop {
            let response = self.exchange(&current).await?;

            if !is_redirect(&response) {
                break response;
            }

            if remaining == 0 {
                tracing::debug!("redirect budget spent at {}", current);
                break response;
            }

            let Some(next) = resolve_location(&response, &current)? else {
                tracing::debug!("{} from {} has no location, treating as final", response.status_code, current);
                break response;
            };

            tracing::debug!("following {} redirect {} -> {}", response.status_code, current, next);
            current = next;
            remaining -= 1;
            redirects_followed += 1;
        };

        let cache_error = match self.cache.put(url, response.clone()).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("failed to cache response for {}: {}", url, e);
                Some(e)
            }
        };

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} redirects, {} bytes)",
            url,
            current,
            fetch_ms,
            redirects_followed,
            response.body.len()
        );

        Ok(FetchOutcome {
            url: url.to_string(),
            final_url: current.to_string(),
            response,
            from_cache: false,
            redirects_followed,
            fetch_ms,
            cache_error,
        })
    }

    /// Fetch `url` and return only the final response.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.fetch(url).await.map(|outcome| outcome.response)
    }

    /// Like `get`, with an explicit redirect budget.
    pub async fn get_with_redirects(&self, url: &str, budget: u32) -> Result<Response, Error> {
        self.fetch_with_redirects(url, budget)
            .await
            .map(|outcome| outcome.response)
    }

    /// Fetch `url` and decode a JSON body.
    ///
    /// Returns `Ok(None)` when the response is not `application/json` or the
    /// body does not decode as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, Error> {
        let response = self.get(url).await?;

        let is_json = response
            .content_type()
            .is_some_and(|ct| ct.contains("application/json"));
        if !is_json {
            return Ok(None);
        }

        match serde_json::from_str(&response.body) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("failed to decode JSON from {}: {}", url, e);
                Ok(None)
            }
        }
    }

    /// Get reference to the response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// One request/response round trip, no redirects.
    async fn exchange(&self, url: &Url) -> Result<Response, Error> {
        let request = Request::get(url.clone(), &self.config.user_agent);
        let raw = self.transport.exchange(url, &request.to_bytes()).await?;
        parse_response(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned raw responses keyed by URL and records every request.
    #[derive(Default)]
    struct ScriptedTransport {
        routes: HashMap<String, Vec<u8>>,
        requests: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl ScriptedTransport {
        fn route(mut self, url: &str, raw: &str) -> Self {
            self.routes.insert(url.to_string(), raw.as_bytes().to_vec());
            self
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn requested_urls(&self) -> Vec<String> {
            self.requests.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn exchange(&self, url: &Url, request: &[u8]) -> Result<Vec<u8>, Error> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), request.to_vec()));
            self.routes
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| Error::Connection(format!("no route to {url}")))
        }
    }

    fn client(transport: ScriptedTransport) -> (FetchClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let client =
            FetchClient::with_transport(FetchConfig::default(), ResponseCache::in_memory(), transport.clone());
        (client, transport)
    }

    const OK_HELLO: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhello";

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, textweb_core::config::DEFAULT_USER_AGENT);
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.timeout, Duration::from_millis(30_000));
        assert_eq!(config.max_bytes, 10_485_760);
        assert_eq!(config.tls, TlsPolicy::AcceptInvalidCerts);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { max_redirects: 2, accept_invalid_certs: false, timeout_ms: 1500, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.max_redirects, 2);
        assert_eq!(config.tls, TlsPolicy::Verify);
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default(), ResponseCache::in_memory());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_get_parses_response() {
        let (client, _) = client(ScriptedTransport::default().route("http://example.com/", OK_HELLO));

        let response = client.get("http://example.com/").await.unwrap();
        assert_eq!(response, Response::new(200, [("content-type", "text/plain")], "hello"));
    }

    #[tokio::test]
    async fn test_sends_serialized_request() {
        let (client, transport) =
            client(ScriptedTransport::default().route("http://example.com/search?q=rust", OK_HELLO));

        client.get("http://example.com/search?q=rust").await.unwrap();

        let requests = transport.requests.lock().unwrap();
        let sent = String::from_utf8(requests[0].1.clone()).unwrap();
        assert!(sent.starts_with("GET /search?q=rust HTTP/1.1\r\n"));
        assert!(sent.contains("\r\nConnection: close\r\n"));
        assert!(sent.contains("\r\nHost: example.com\r\n"));
        assert!(sent.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_second_fetch_hits_cache() {
        let (client, transport) = client(ScriptedTransport::default().route("http://example.com/", OK_HELLO));

        let first = client.fetch("http://example.com/").await.unwrap();
        let second = client.fetch("http://example.com/").await.unwrap();

        assert_eq!(first.response, second.response);
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_needs_no_network() {
        let cache = ResponseCache::in_memory();
        let stored = Response::new(200, [("content-type", "text/html")], "<p>cached</p>");
        cache.put("http://offline.example/", stored.clone()).await.unwrap();

        let transport = Arc::new(ScriptedTransport::default());
        let client = FetchClient::with_transport(FetchConfig::default(), cache, transport.clone());

        assert_eq!(client.get("http://offline.example/").await.unwrap(), stored);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_follows_relative_redirect() {
        let (client, transport) = client(
            ScriptedTransport::default()
                .route("http://example.com/a", "HTTP/1.1 301 Moved Permanently\r\nLocation: /next\r\n\r\n")
                .route("http://example.com/next", OK_HELLO),
        );

        let outcome = client.fetch("http://example.com/a").await.unwrap();

        assert_eq!(outcome.response.status_code, 200);
        assert_eq!(outcome.response.body, "hello");
        assert_eq!(outcome.final_url, "http://example.com/next");
        assert_eq!(outcome.redirects_followed, 1);
        assert_eq!(transport.requested_urls(), vec!["http://example.com/a", "http://example.com/next"]);
    }

    #[tokio::test]
    async fn test_redirect_chain_cached_under_original_url_only() {
        let (client, _) = client(
            ScriptedTransport::default()
                .route("http://example.com/a", "HTTP/1.1 302 Found\r\nLocation: /b\r\n\r\n")
                .route("http://example.com/b", "HTTP/1.1 302 Found\r\nLocation: https://other.example/c\r\n\r\n")
                .route("https://other.example/c", OK_HELLO),
        );

        let response = client.get("http://example.com/a").await.unwrap();
        assert_eq!(response.body, "hello");

        let cache = client.cache();
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("http://example.com/a").await, Some(response));
        assert!(cache.get("http://example.com/b").await.is_none());
        assert!(cache.get("https://other.example/c").await.is_none());
    }

    #[tokio::test]
    async fn test_zero_budget_returns_redirect() {
        let raw = "HTTP/1.1 302 Found\r\nLocation: /loop\r\n\r\npartial";
        let (client, transport) = client(ScriptedTransport::default().route("http://example.com/loop", raw));

        let response = client.get_with_redirects("http://example.com/loop", 0).await.unwrap();

        assert_eq!(response.status_code, 302);
        assert_eq!(response.body, "partial");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_budget_ignores_unusable_location() {
        let raw = "HTTP/1.1 302 Found\r\nLocation: ftp://files.example/x\r\n\r\npartial";
        let (client, transport) = client(ScriptedTransport::default().route("http://example.com/loop", raw));

        let outcome = client.fetch_with_redirects("http://example.com/loop", 0).await.unwrap();

        assert_eq!(outcome.response.status_code, 302);
        assert_eq!(outcome.response.body, "partial");
        assert_eq!(outcome.final_url, "http://example.com/loop");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_unusable_location_with_budget_is_invalid_url() {
        let raw = "HTTP/1.1 302 Found\r\nLocation: ftp://files.example/x\r\n\r\n";
        let (client, _) = client(ScriptedTransport::default().route("http://example.com/loop", raw));

        let result = client.get("http://example.com/loop").await;

        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_redirect_loop_bounded_by_budget() {
        let raw = "HTTP/1.1 302 Found\r\nLocation: /loop\r\n\r\n";
        let (client, transport) = client(ScriptedTransport::default().route("http://example.com/loop", raw));

        let outcome = client.fetch_with_redirects("http://example.com/loop", 3).await.unwrap();

        assert_eq!(outcome.response.status_code, 302);
        assert_eq!(outcome.redirects_followed, 3);
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn test_each_redirect_consumes_one_unit() {
        let (client, transport) = client(
            ScriptedTransport::default()
                .route("http://example.com/1", "HTTP/1.1 301 Moved\r\nLocation: /2\r\n\r\n")
                .route("http://example.com/2", "HTTP/1.1 301 Moved\r\nLocation: /3\r\n\r\n")
                .route("http://example.com/3", OK_HELLO),
        );

        let outcome = client.fetch_with_redirects("http://example.com/1", 1).await.unwrap();

        assert_eq!(outcome.response.status_code, 301);
        assert_eq!(outcome.final_url, "http://example.com/2");
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_redirect_without_location_is_final() {
        let raw = "HTTP/1.1 304 Not Modified\r\nETag: \"abc\"\r\n\r\n";
        let (client, transport) = client(ScriptedTransport::default().route("http://example.com/", raw));

        let outcome = client.fetch("http://example.com/").await.unwrap();

        assert_eq!(outcome.response.status_code, 304);
        assert_eq!(outcome.redirects_followed, 0);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_parse_error_caches_nothing() {
        let (client, _) = client(ScriptedTransport::default().route("http://example.com/", "garbage without framing"));

        let result = client.get("http://example.com/").await;

        assert!(matches!(result, Err(Error::Parse(_))));
        assert!(client.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_connection_error_caches_nothing() {
        let (client, _) = client(ScriptedTransport::default());

        let result = client.get("http://unreachable.example/").await;

        assert!(matches!(result, Err(Error::Connection(_))));
        assert!(client.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let (client, transport) = client(ScriptedTransport::default());

        let result = client.get("not a url").await;

        assert!(matches!(result, Err(Error::InvalidUrl(_))));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_save_failure_still_returns_response() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        tokio::fs::create_dir(&path).await.unwrap();
        let cache = ResponseCache::load(&path).await;

        let transport = Arc::new(ScriptedTransport::default().route("http://example.com/", OK_HELLO));
        let client = FetchClient::with_transport(FetchConfig::default(), cache, transport.clone());

        let outcome = client.fetch("http://example.com/").await.unwrap();
        assert_eq!(outcome.response.body, "hello");
        assert!(matches!(outcome.cache_error, Some(Error::CacheSave(_))));

        // The in-memory entry still serves the next call.
        client.get("http://example.com/").await.unwrap();
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let transport = Arc::new(ScriptedTransport::default().route("http://example.com/", OK_HELLO));
        let client = FetchClient::with_transport(FetchConfig::default(), ResponseCache::load(&path).await, transport);
        client.get("http://example.com/").await.unwrap();

        let reloaded = ResponseCache::load(&path).await;
        let cached = reloaded.get("http://example.com/").await.unwrap();
        assert_eq!(cached.body, "hello");
    }

    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Status {
        ok: bool,
    }

    #[tokio::test]
    async fn test_get_json() {
        let (client, _) = client(
            ScriptedTransport::default()
                .route(
                    "http://api.example/status",
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json; charset=utf-8\r\n\r\n{\"ok\": true}",
                )
                .route("http://api.example/page", "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n{\"ok\": true}")
                .route(
                    "http://api.example/broken",
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{not json",
                ),
        );

        let status: Option<Status> = client.get_json("http://api.example/status").await.unwrap();
        assert_eq!(status, Some(Status { ok: true }));

        let html: Option<Status> = client.get_json("http://api.example/page").await.unwrap();
        assert_eq!(html, None);

        let broken: Option<Status> = client.get_json("http://api.example/broken").await.unwrap();
        assert_eq!(broken, None);
    }

    #[tokio::test]
    async fn test_end_to_end_over_loopback() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            for _ in 0..2 {
                let (mut sock, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.ends_with(b"\r\n\r\n") {
                    let n = sock.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }
                let reply: &[u8] = if request.starts_with(b"GET /old ") {
                    b"HTTP/1.1 301 Moved Permanently\r\nLocation: /new\r\n\r\n"
                } else {
                    b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<h1>New</h1>"
                };
                sock.write_all(reply).await.unwrap();
                sock.shutdown().await.unwrap();
            }
        });

        let client = FetchClient::new(FetchConfig::default(), ResponseCache::in_memory()).unwrap();
        let url = format!("http://127.0.0.1:{port}/old");

        let outcome = client.fetch(&url).await.unwrap();
        assert_eq!(outcome.response.status_code, 200);
        assert_eq!(outcome.response.body, "<h1>New</h1>");
        assert_eq!(outcome.final_url, format!("http://127.0.0.1:{port}/new"));

        server.await.unwrap();

        // Listener is gone; this must come from the cache.
        let again = client.get(&url).await.unwrap();
        assert_eq!(again.body, "<h1>New</h1>");
    }
}
