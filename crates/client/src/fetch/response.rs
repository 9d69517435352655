//! Response reading and HTTP/1.1 framing.
//!
//! The reader has no chunked or `Content-Length` framing: it relies on the
//! server closing the connection (the request always says `Connection: close`)
//! and treats end-of-stream as end-of-response.

use std::collections::BTreeMap;
use textweb_core::{Error, Response};
use tokio::io::{AsyncRead, AsyncReadExt};

const READ_CHUNK: usize = 8 * 1024;

/// Read every byte until the peer closes the stream.
///
/// An `UnexpectedEof` after some data has arrived counts as a normal close:
/// many TLS servers drop the socket without sending `close_notify`.
pub async fn read_all<R>(stream: &mut R, max_bytes: usize) -> Result<Vec<u8>, Error>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut received = Vec::new();
    let mut buf = [0u8; READ_CHUNK];

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof && !received.is_empty() => {
                tracing::debug!("peer closed without close_notify after {} bytes", received.len());
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if received.len() + n > max_bytes {
            return Err(Error::TooLarge(format!("response exceeds {max_bytes} bytes")));
        }
        received.extend_from_slice(&buf[..n]);
    }

    Ok(received)
}

/// Parse a complete raw response.
///
/// The bytes are split on the first `\r\n\r\n` into header block and body.
/// The first header line is the status line; every later line is a
/// `Name: Value` pair split on the first colon, name lowercased, later
/// duplicates overwriting earlier ones.
///
/// # Errors
///
/// Returns `Error::Parse` when the blank-line separator is missing or the
/// status line is malformed.
pub fn parse(raw: &[u8]) -> Result<Response, Error> {
    let text = String::from_utf8_lossy(raw);

    let (head, body) = text
        .split_once("\r\n\r\n")
        .ok_or_else(|| Error::Parse(format!("no blank line after headers ({} bytes received)", raw.len())))?;

    let mut lines = head.split("\r\n");
    let status_code = parse_status_line(lines.next().unwrap_or_default())?;

    let mut headers = BTreeMap::new();
    for line in lines {
        match line.split_once(':') {
            Some((name, value)) if !name.is_empty() && !name.contains(char::is_whitespace) => {
                headers.insert(name.to_ascii_lowercase(), value.trim().to_string());
            }
            _ => tracing::debug!("skipping malformed header line: {:?}", line),
        }
    }

    Ok(Response { status_code, headers, body: body.to_string() })
}

/// Extract the status code from `HTTP/<version> <code>[ <reason>]`.
fn parse_status_line(line: &str) -> Result<u16, Error> {
    let mut parts = line.splitn(3, ' ');

    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(Error::Parse(format!("invalid status line: {line:?}")));
    }

    let code = parts.next().unwrap_or_default();
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Parse(format!("invalid status code in status line: {line:?}")));
    }

    code.parse::<u16>()
        .map_err(|e| Error::Parse(format!("invalid status code {code:?}: {e}")))
}
