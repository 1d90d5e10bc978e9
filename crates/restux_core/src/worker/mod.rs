//! Per-connection HTTP/1 handler.
//!
//! Reads client requests on a keep-alive loop and dispatches each one to the
//! route table, with the shared cache and user database injected from the
//! master.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use restux_cache::ResponseStore;
use restux_config::RestuxConfig;
use restux_http::request::{RequestLimits, read_http_request};
use restux_http::{ClientSink, ClientStream};
use restux_user::UserDb;
use tokio::time::Duration;
use tracing::{debug, info, instrument};

mod auth;
mod dispatch;
mod handlers;
mod routing;

use dispatch::dispatch;

/// Entry point for a "logical worker" that handles a single connection.
#[instrument(
    skip(stream, cfg, cache, db),
    fields(
        client = %client_addr,
    )
)]
pub async fn handle_connection(
    mut stream: Box<dyn ClientStream>,
    client_addr: SocketAddr,
    cfg: Arc<RestuxConfig>,
    cache: Arc<ResponseStore>,
    db: Arc<UserDb>,
) -> anyhow::Result<()> {
    info!(target: "restux::worker", "Handling new client connection");

    let limits = RequestLimits {
        max_headers_bytes: cfg.http.max_request_headers_bytes as usize,
        max_body_bytes: cfg.http.max_request_body_bytes as usize,
        read_timeout: Duration::from_secs(cfg.http.client_read_timeout_secs),
    };

    let mut buf = BytesMut::new();
    let mut first_request = true;

    loop {
        let idle_timeout = if first_request {
            Duration::from_secs(cfg.http.client_read_timeout_secs)
        } else {
            Duration::from_secs(cfg.http.keepalive_timeout_secs)
        };

        let req = match read_http_request(stream.as_mut(), &mut buf, limits, idle_timeout).await? {
            Some(req) => req,
            None => break,
        };
        first_request = false;

        debug!(
            target: "restux::worker",
            method = %req.method,
            path = %req.path,
            "Dispatching request"
        );

        let keep_alive = !req.close_after;
        let mut sink = ClientSink::new(stream.as_mut(), keep_alive);
        dispatch(&mut sink, &req, &cfg, &cache, &db).await?;

        if req.close_after {
            break;
        }
    }

    debug!(target: "restux::worker", "Closing client connection");
    Ok(())
}
