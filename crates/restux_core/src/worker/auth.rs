use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::{StatusCode, header};
use restux_config::AuthConfig;
use restux_http::responses::send_error;
use restux_http::{ParsedRequest, ResponseSink};

/// Check `Authorization: Basic` credentials against the configured pair.
pub(crate) fn authorized(req: &ParsedRequest, auth: &AuthConfig) -> bool {
    let Some(value) = req.header(&header::AUTHORIZATION) else {
        return false;
    };
    let Some(encoded) = value.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((username, password)) = decoded.split_once(':') else {
        return false;
    };
    username == auth.username() && password == auth.password()
}

/// Gate for mutating endpoints. Sends the 401 challenge itself and reports
/// whether the caller may proceed.
pub(crate) async fn require_auth<S: ResponseSink + ?Sized>(
    sink: &mut S,
    req: &ParsedRequest,
    auth: &AuthConfig,
) -> anyhow::Result<bool> {
    if authorized(req, auth) {
        return Ok(true);
    }

    sink.headers().insert(
        header::WWW_AUTHENTICATE,
        "Basic realm=\"restux\"".parse().expect("static challenge"),
    );
    send_error(sink, StatusCode::UNAUTHORIZED).await?;
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::authorized;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use http::{HeaderMap, header};
    use restux_config::AuthConfig;
    use restux_http::ParsedRequest;

    fn request_with_auth(value: Option<&str>) -> ParsedRequest {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        }
        ParsedRequest {
            method: "POST".into(),
            path: "/users".into(),
            http_version: "HTTP/1.1".into(),
            headers,
            body: Vec::new(),
            close_after: false,
        }
    }

    fn basic(credentials: &str) -> String {
        format!("Basic {}", STANDARD.encode(credentials))
    }

    #[test]
    fn accepts_the_configured_pair() {
        let auth = AuthConfig::default();
        let req = request_with_auth(Some(&basic("Peter:password")));
        assert!(authorized(&req, &auth));
    }

    #[test]
    fn rejects_wrong_or_missing_credentials() {
        let auth = AuthConfig::default();

        assert!(!authorized(&request_with_auth(None), &auth));
        assert!(!authorized(
            &request_with_auth(Some(&basic("Peter:nope"))),
            &auth
        ));
        assert!(!authorized(
            &request_with_auth(Some(&basic("peter:password"))),
            &auth
        ));
        assert!(!authorized(
            &request_with_auth(Some("Bearer abc")),
            &auth
        ));
        assert!(!authorized(
            &request_with_auth(Some("Basic not-base64!!!")),
            &auth
        ));
    }
}
