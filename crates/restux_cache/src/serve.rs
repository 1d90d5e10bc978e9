use http::header;
use restux_http::{ParsedRequest, ResponseSink};
use tracing::debug;

use crate::headers::copy_header;
use crate::key::make_key;
use crate::store::ResponseStore;

/// Try to answer `req` from the store.
///
/// Returns `false` when the caller must invoke the real handler: the request
/// opted out with `Cache-Control: no-cache`, or nothing is stored under its
/// key. On a hit the captured headers are copied onto the sink (which must
/// not carry headers of its own yet), the status is written, and the body is
/// replayed unless the request method is HEAD.
pub async fn serve<S: ResponseSink + ?Sized>(
    store: &ResponseStore,
    req: &ParsedRequest,
    sink: &mut S,
) -> anyhow::Result<bool> {
    if req.header(&header::CACHE_CONTROL) == Some("no-cache") {
        return Ok(false);
    }

    let resource = make_key(Some(req));
    let Some(resp) = store.get(&resource) else {
        return Ok(false);
    };

    debug!(
        target: "restux::cache",
        %resource,
        status = %resp.status,
        "Cache hit"
    );

    copy_header(sink.headers(), &resp.headers);
    sink.write_status(resp.status).await?;
    if !req.is_head() {
        sink.write_body(&resp.body).await?;
    }
    Ok(true)
}
