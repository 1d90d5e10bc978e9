use std::sync::Arc;

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use restux_http::{ParsedRequest, ResponseSink};

use crate::entry::CachedResponse;
use crate::headers::merge_missing;
use crate::key::make_key;
use crate::store::ResponseStore;

/// Sink decorator used on the miss path: whatever the handler writes reaches
/// the client untouched and is mirrored into the store under the request's
/// key.
///
/// The capture is committed on each body write, and the body is *replaced*
/// each time, not appended: a handler that writes in several chunks leaves
/// only its final chunk in the store. Headers are re-read from the wrapped
/// sink at status-write time and again at body-write time, so headers set
/// directly on the real sink after the status still end up captured.
pub struct CacheWriter<'a> {
    sink: &'a mut (dyn ResponseSink + 'a),
    store: Arc<ResponseStore>,
    resource: String,
    response: CachedResponse,
}

impl<'a> CacheWriter<'a> {
    pub fn new(
        sink: &'a mut (dyn ResponseSink + 'a),
        store: Arc<ResponseStore>,
        req: &ParsedRequest,
    ) -> Self {
        Self {
            sink,
            store,
            resource: make_key(Some(req)),
            response: CachedResponse::new(),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

#[async_trait]
impl ResponseSink for CacheWriter<'_> {
    /// The in-progress capture's headers, not the wrapped sink's.
    fn headers(&mut self) -> &mut HeaderMap {
        &mut self.response.headers
    }

    async fn write_status(&mut self, status: StatusCode) -> anyhow::Result<()> {
        merge_missing(&mut self.response.headers, self.sink.headers());
        self.response.status = status;
        // Install the merged set on the wrapped sink before it serializes the
        // head, so the live response carries the same headers as the capture.
        *self.sink.headers() = self.response.headers.clone();
        self.sink.write_status(status).await
    }

    async fn write_body(&mut self, body: &[u8]) -> anyhow::Result<usize> {
        // Last write wins; earlier chunks are dropped from the capture.
        self.response.body = body.to_vec();
        merge_missing(&mut self.response.headers, self.sink.headers());
        self.store.set(&self.resource, Some(self.response.clone()));
        self.sink.write_body(body).await
    }
}

#[cfg(test)]
mod tests {
    use super::CacheWriter;
    use crate::store::ResponseStore;
    use async_trait::async_trait;
    use http::header::{CONTENT_TYPE, SERVER};
    use http::{HeaderMap, StatusCode};
    use restux_http::{ParsedRequest, ResponseSink};
    use std::sync::Arc;

    #[derive(Default)]
    struct MockSink {
        headers: HeaderMap,
        status: Option<StatusCode>,
        body: Vec<u8>,
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
            Ok(body.len())
        }
    }

    fn request(path: &str) -> ParsedRequest {
        ParsedRequest {
            method: "GET".into(),
            path: path.into(),
            http_version: "HTTP/1.1".into(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            close_after: false,
        }
    }

    #[tokio::test]
    async fn captures_and_forwards_a_response() {
        let store = Arc::new(ResponseStore::new());
        let mut sink = MockSink::default();
        let req = request("/test/url?with=params");

        let mut writer = CacheWriter::new(&mut sink, Arc::clone(&store), &req);
        assert_eq!(writer.resource(), "/test/url?with=params");

        writer
            .headers()
            .insert(CONTENT_TYPE, "application/json".parse().unwrap());
        writer.write_status(StatusCode::CREATED).await.unwrap();

        let body = [1u8, 2, 3, 4, 5];
        let n = writer.write_body(&body).await.unwrap();
        assert_eq!(n, body.len());

        let captured = store.get("/test/url?with=params").expect("captured");
        assert_eq!(captured.status, StatusCode::CREATED);
        assert_eq!(captured.body, body);
        assert_eq!(
            captured.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        // Forwarded untouched to the wrapped sink.
        assert_eq!(sink.status, Some(StatusCode::CREATED));
        assert_eq!(sink.body, body);
        assert_eq!(sink.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn only_the_last_body_write_is_kept() {
        let store = Arc::new(ResponseStore::new());
        let mut sink = MockSink::default();
        let req = request("/greeting");

        let mut writer = CacheWriter::new(&mut sink, Arc::clone(&store), &req);
        writer.write_status(StatusCode::OK).await.unwrap();
        writer.write_body(b"He").await.unwrap();
        writer.write_body(b"llo").await.unwrap();

        // The client got everything, the capture only the final chunk.
        assert_eq!(sink.body, b"Hello");
        assert_eq!(store.get("/greeting").unwrap().body, b"llo");
    }

    #[tokio::test]
    async fn headers_set_on_the_wrapped_sink_are_captured_at_status_write() {
        let store = Arc::new(ResponseStore::new());
        let mut sink = MockSink::default();
        sink.headers
            .insert(SERVER, "restux/0.1.0".parse().unwrap());
        let req = request("/users");

        let mut writer = CacheWriter::new(&mut sink, Arc::clone(&store), &req);
        writer.write_status(StatusCode::OK).await.unwrap();
        writer.write_body(b"{}").await.unwrap();

        let captured = store.get("/users").unwrap();
        assert_eq!(captured.headers.get(SERVER).unwrap(), "restux/0.1.0");
    }

    #[tokio::test]
    async fn headers_set_late_on_the_wrapped_sink_are_captured_at_body_write() {
        let store = Arc::new(ResponseStore::new());
        let mut sink = MockSink::default();
        let req = request("/users");

        let mut writer = CacheWriter::new(&mut sink, Arc::clone(&store), &req);
        writer.write_status(StatusCode::OK).await.unwrap();
        writer
            .sink
            .headers()
            .insert(SERVER, "restux/0.1.0".parse().unwrap());
        writer.write_body(b"{}").await.unwrap();

        let captured = store.get("/users").unwrap();
        assert_eq!(captured.headers.get(SERVER).unwrap(), "restux/0.1.0");
    }

    #[tokio::test]
    async fn wrapper_headers_reach_the_live_head() {
        let store = Arc::new(ResponseStore::new());
        let mut sink = MockSink::default();
        let req = request("/users");

        let mut writer = CacheWriter::new(&mut sink, Arc::clone(&store), &req);
        writer
            .headers()
            .insert(CONTENT_TYPE, "application/json".parse().unwrap());
        writer.write_status(StatusCode::OK).await.unwrap();

        assert_eq!(sink.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn body_write_with_no_status_captures_a_200() {
        let store = Arc::new(ResponseStore::new());
        let mut sink = MockSink::default();
        let req = request("/users");

        let mut writer = CacheWriter::new(&mut sink, Arc::clone(&store), &req);
        writer.write_body(b"ok").await.unwrap();

        let captured = store.get("/users").unwrap();
        assert_eq!(captured.status, StatusCode::OK);
        assert_eq!(captured.body, b"ok");
    }
}
