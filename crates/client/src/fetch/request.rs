//! HTTP/1.1 request serialization.

use url::Url;

/// An outgoing bodiless `GET`: absolute target and ordered headers.
#[derive(Debug, Clone)]
pub struct Request {
    url: Url,
    headers: Vec<(String, String)>,
}

impl Request {
    /// Build a request with the fixed header set.
    ///
    /// `Connection: close` is always sent; the response reader relies on the
    /// server closing the stream to find the end of the response.
    pub fn get(url: Url, user_agent: &str) -> Self {
        let host = url.host_str().unwrap_or_default().to_string();
        let headers = vec![
            ("Connection".to_string(), "close".to_string()),
            ("Host".to_string(), host),
            ("User-Agent".to_string(), user_agent.to_string()),
        ];
        Self { url, headers }
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Origin-form request target: path plus query, never the fragment.
    pub fn target(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }

    /// Render the request line, headers, and terminating blank line.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("GET {} HTTP/1.1\r\n", self.target());
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out.into_bytes()
    }
}
