use http::HeaderMap;

/// Append every value from `src` onto `dst`. Existing values in `dst` are
/// kept, so the caller is expected to start from an empty map.
pub fn copy_header(dst: &mut HeaderMap, src: &HeaderMap) {
    for (name, value) in src {
        dst.append(name.clone(), value.clone());
    }
}

/// Copy only the header names `dst` does not have yet. Repeating the copy
/// against the same source is a no-op, which keeps recapture idempotent.
pub fn merge_missing(dst: &mut HeaderMap, src: &HeaderMap) {
    for name in src.keys() {
        if !dst.contains_key(name) {
            for value in src.get_all(name) {
                dst.append(name.clone(), value.clone());
            }
        }
    }
}
