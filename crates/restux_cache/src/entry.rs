use http::{HeaderMap, StatusCode};

/// A captured HTTP response. Stored by value; an update replaces the whole
/// entry, so concurrent readers never see a half-written one.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }
}

impl Default for CachedResponse {
    fn default() -> Self {
        Self::new()
    }
}
