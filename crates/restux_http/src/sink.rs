//! Response sink abstraction.
//!
//! Everything that emits a response goes through [`ResponseSink`]: a header
//! map built up before the status line is written, then a status write, then
//! a body write. `ClientSink` is the passthrough variant that serializes
//! HTTP/1.1 onto the client socket; decorators wrap it without the callers
//! noticing.

use async_trait::async_trait;
use http::{HeaderMap, StatusCode, header};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::warn;

pub trait ClientStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> ClientStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Output capability for one HTTP response.
#[async_trait]
pub trait ResponseSink: Send {
    /// Header map that will be sent along with the status line.
    fn headers(&mut self) -> &mut HeaderMap;

    /// Emit the status line and the header block.
    async fn write_status(&mut self, status: StatusCode) -> anyhow::Result<()>;

    /// Emit body bytes. Writes the head first (200) if no status was written.
    async fn write_body(&mut self, body: &[u8]) -> anyhow::Result<usize>;
}

/// Passthrough sink writing HTTP/1.1 to the client socket.
pub struct ClientSink<'a> {
    stream: &'a mut dyn ClientStream,
    headers: HeaderMap,
    head_sent: bool,
    keep_alive: bool,
}

impl<'a> ClientSink<'a> {
    pub fn new(stream: &'a mut dyn ClientStream, keep_alive: bool) -> Self {
        Self {
            stream,
            headers: HeaderMap::new(),
            head_sent: false,
            keep_alive,
        }
    }

    pub fn head_sent(&self) -> bool {
        self.head_sent
    }

    fn serialize_head(&self, status: StatusCode) -> Vec<u8> {
        let mut head = Vec::with_capacity(256);
        head.extend_from_slice(
            format!(
                "HTTP/1.1 {} {}\r\n",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .as_bytes(),
        );

        for (name, value) in &self.headers {
            head.extend_from_slice(name.as_str().as_bytes());
            head.extend_from_slice(b": ");
            head.extend_from_slice(value.as_bytes());
            head.extend_from_slice(b"\r\n");
        }

        // Wire-level headers the handlers never manage themselves.
        if !self.headers.contains_key(header::SERVER) {
            head.extend_from_slice(b"Server: restux/0.1.0\r\n");
        }
        if !self.headers.contains_key(header::CONNECTION) {
            if self.keep_alive {
                head.extend_from_slice(b"Connection: keep-alive\r\n");
            } else {
                head.extend_from_slice(b"Connection: close\r\n");
            }
        }

        head.extend_from_slice(b"\r\n");
        head
    }
}

#[async_trait]
impl ResponseSink for ClientSink<'_> {
    fn headers(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    async fn write_status(&mut self, status: StatusCode) -> anyhow::Result<()> {
        if self.head_sent {
            warn!(
                target: "restux::http",
                status = %status,
                "Head already written; ignoring superfluous status write"
            );
            return Ok(());
        }

        let head = self.serialize_head(status);
        self.stream.write_all(&head).await?;
        self.head_sent = true;
        Ok(())
    }

    async fn write_body(&mut self, body: &[u8]) -> anyhow::Result<usize> {
        if !self.head_sent {
            self.write_status(StatusCode::OK).await?;
        }
        self.stream.write_all(body).await?;
        self.stream.flush().await?;
        Ok(body.len())
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory sink used by handler and cache tests.

    use super::*;

    #[derive(Default)]
    pub struct MockSink {
        pub headers: HeaderMap,
        pub status: Option<StatusCode>,
        pub body: Vec<u8>,
        pub body_writes: usize,
    }

    impl MockSink {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl ResponseSink for MockSink {
        fn headers(&mut self) -> &mut HeaderMap {
            &mut self.headers
        }

        async fn write_status(&mut self, status: StatusCode) -> anyhow::Result<()> {
            self.status = Some(status);
            Ok(())
        }

        async fn write_body(&mut self, body: &[u8]) -> anyhow::Result<usize> {
            self.body.extend_from_slice(body);
            self.body_writes += 1;
            Ok(body.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;

    #[tokio::test]
    async fn head_is_serialized_once() {
        let mut wire: Vec<u8> = Vec::new();
        {
            let mut cursor = std::io::Cursor::new(&mut wire);
            let mut sink = ClientSink::new(&mut cursor, false);
            sink.headers()
                .insert(CONTENT_TYPE, "text/plain".parse().unwrap());
            sink.write_status(StatusCode::OK).await.unwrap();
            sink.write_status(StatusCode::NOT_FOUND).await.unwrap();
            sink.write_body(b"hi").await.unwrap();
        }

        let text = String::from_utf8(wire).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(!text.contains("404"));
        assert!(text.contains("content-type: text/plain\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\nhi"));
    }

    #[tokio::test]
    async fn body_write_defaults_to_200() {
        let mut wire: Vec<u8> = Vec::new();
        {
            let mut cursor = std::io::Cursor::new(&mut wire);
            let mut sink = ClientSink::new(&mut cursor, true);
            sink.write_body(b"x").await.unwrap();
        }

        let text = String::from_utf8(wire).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Connection: keep-alive\r\n"));
    }
}
