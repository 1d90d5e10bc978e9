/// Route table for the API surface.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Route<'p> {
    Root,
    Users,
    User(&'p str),
    NotFound,
}

/// Match a request target against the route table. The query string never
/// takes part in routing, and a single trailing slash is tolerated.
pub(crate) fn route(target: &str) -> Route<'_> {
    let path = target.split('?').next().unwrap_or(target);
    let path = path.strip_suffix('/').unwrap_or(path);

    if path.is_empty() {
        return Route::Root;
    }
    if path == "/users" {
        return Route::Users;
    }
    match path.strip_prefix("/users/") {
        Some(id) if !id.is_empty() && !id.contains('/') => Route::User(id),
        _ => Route::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::{Route, route};

    #[test]
    fn matches_the_api_surface() {
        assert_eq!(route("/"), Route::Root);
        assert_eq!(route("/users"), Route::Users);
        assert_eq!(route("/users/"), Route::Users);
        assert_eq!(route("/users/abc123"), Route::User("abc123"));
        assert_eq!(route("/users/abc123/"), Route::User("abc123"));
    }

    #[test]
    fn ignores_the_query_string() {
        assert_eq!(route("/users?page=2"), Route::Users);
        assert_eq!(route("/users/abc123?full=1"), Route::User("abc123"));
    }

    #[test]
    fn rejects_everything_else() {
        assert_eq!(route("/other"), Route::NotFound);
        assert_eq!(route("/users/a/b"), Route::NotFound);
        assert_eq!(route("/users//"), Route::NotFound);
    }
}
