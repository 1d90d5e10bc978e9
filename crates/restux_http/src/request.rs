use bytes::{Buf, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, header};
use tokio::io::AsyncReadExt;
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::responses::{send_400, send_408, send_411, send_413, send_431};
use crate::sink::ClientStream;

const MAX_HEADER_COUNT: usize = 64;

/// One fully read HTTP/1.1 request: head plus materialized body.
#[derive(Debug)]
pub struct ParsedRequest {
    pub method: String,
    /// Request target as sent by the client (path plus optional query).
    pub path: String,
    pub http_version: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub close_after: bool,
}

impl ParsedRequest {
    /// First value of a header as a string, if present and valid UTF-8.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn is_head(&self) -> bool {
        self.method == "HEAD"
    }
}

/// Read limits applied while parsing a request off the socket.
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    pub max_headers_bytes: usize,
    pub max_body_bytes: usize,
    pub read_timeout: Duration,
}

enum ReadOutcome {
    Timeout,
    Read(usize),
}

async fn read_more(
    stream: &mut dyn ClientStream,
    buf: &mut BytesMut,
    timeout_dur: Duration,
) -> anyhow::Result<ReadOutcome> {
    let mut tmp = [0u8; 4096];
    match tokio::time::timeout(timeout_dur, stream.read(&mut tmp)).await {
        Ok(res) => {
            let n = res?;
            if n > 0 {
                buf.extend_from_slice(&tmp[..n]);
            }
            Ok(ReadOutcome::Read(n))
        }
        Err(_) => Ok(ReadOutcome::Timeout),
    }
}

fn find_headers_end(buf: &BytesMut) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Reads a full HTTP request:
/// - Reads until `\r\n\r\n` (end of headers)
/// - Parses the request line and headers
/// - Reads the full Content-Length body
/// - Returns `None` after answering the client when the request is unusable
pub async fn read_http_request(
    stream: &mut dyn ClientStream,
    buf: &mut BytesMut,
    limits: RequestLimits,
    idle_timeout: Duration,
) -> anyhow::Result<Option<ParsedRequest>> {
    let headers_end = loop {
        if let Some(pos) = find_headers_end(buf) {
            break pos;
        }

        if limits.max_headers_bytes > 0 && buf.len() > limits.max_headers_bytes {
            send_431(stream).await?;
            return Ok(None);
        }

        let timeout_dur = if buf.is_empty() {
            idle_timeout
        } else {
            limits.read_timeout
        };
        match read_more(stream, buf, timeout_dur).await? {
            ReadOutcome::Timeout => {
                if buf.is_empty() {
                    return Ok(None);
                }
                send_408(stream).await?;
                return Ok(None);
            }
            ReadOutcome::Read(0) => return Ok(None),
            ReadOutcome::Read(_) => {}
        }
    };

    let head_len = headers_end + 4;
    let mut header_storage = [httparse::EMPTY_HEADER; MAX_HEADER_COUNT];
    let mut parsed = httparse::Request::new(&mut header_storage);

    match parsed.parse(&buf[..head_len]) {
        Ok(httparse::Status::Complete(_)) => {}
        other => {
            warn!(
                target: "restux::http",
                outcome = ?other,
                "Invalid request head"
            );
            send_400(stream).await?;
            return Ok(None);
        }
    }

    let (Some(method), Some(path), Some(version)) = (parsed.method, parsed.path, parsed.version)
    else {
        send_400(stream).await?;
        return Ok(None);
    };
    let method = method.to_string();
    let path = path.to_string();
    let http_version = format!("HTTP/1.{version}");

    let mut headers = HeaderMap::new();
    for h in parsed.headers.iter() {
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(h.name.as_bytes()),
            HeaderValue::from_bytes(h.value),
        ) else {
            send_400(stream).await?;
            return Ok(None);
        };
        headers.append(name, value);
    }

    debug!(
        target: "restux::http",
        %method,
        %path,
        head_len,
        "Parsed HTTP request head"
    );

    // No chunked request bodies: this API only accepts sized payloads.
    let chunked = headers
        .get(header::TRANSFER_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"));
    if chunked {
        send_411(stream).await?;
        return Ok(None);
    }

    let content_length = match headers.get(header::CONTENT_LENGTH) {
        None => 0,
        Some(v) => match v.to_str().ok().and_then(|v| v.trim().parse::<usize>().ok()) {
            Some(len) => len,
            None => {
                send_400(stream).await?;
                return Ok(None);
            }
        },
    };

    if limits.max_body_bytes > 0 && content_length > limits.max_body_bytes {
        send_413(stream).await?;
        return Ok(None);
    }

    while buf.len() < head_len + content_length {
        match read_more(stream, buf, limits.read_timeout).await? {
            ReadOutcome::Timeout => {
                send_408(stream).await?;
                return Ok(None);
            }
            ReadOutcome::Read(0) => return Ok(None),
            ReadOutcome::Read(_) => {}
        }
    }

    let body = buf[head_len..head_len + content_length].to_vec();

    let connection = headers
        .get(header::CONNECTION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase());
    let close_after = match connection.as_deref() {
        Some(v) => v.contains("close"),
        None => version == 0,
    };

    // Leave any pipelined follow-up request in the buffer.
    buf.advance(head_len + content_length);

    Ok(Some(ParsedRequest {
        method,
        path,
        http_version,
        headers,
        body,
        close_after,
    }))
}
