use restux_http::ParsedRequest;

/// Strip at most one trailing slash; no other normalization.
pub fn normalize(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

/// Canonical cache key for a request's target. An absent request maps to the
/// empty string so callers never have to special-case it.
pub fn make_key(req: Option<&ParsedRequest>) -> String {
    match req {
        Some(req) => normalize(&req.path).to_string(),
        None => String::new(),
    }
}
