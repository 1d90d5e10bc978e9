use std::sync::Arc;

use http::StatusCode;
use restux_cache::{CacheWriter, ResponseStore};
use restux_config::RestuxConfig;
use restux_http::responses::{send_405_with_allow, send_error};
use restux_http::{ParsedRequest, ResponseSink};
use restux_user::UserDb;

use super::auth::require_auth;
use super::handlers;
use super::routing::{Route, route};

/// Route one request to its handler.
///
/// GET/HEAD on the users surface go through the cache: a stored response is
/// replayed as-is, a miss runs the real handler behind a capturing writer.
/// Mutating methods authenticate, write through the plain sink, and leave
/// invalidation to the handler once the persistent write succeeded.
pub(crate) async fn dispatch<S: ResponseSink>(
    sink: &mut S,
    req: &ParsedRequest,
    cfg: &RestuxConfig,
    cache: &Arc<ResponseStore>,
    db: &UserDb,
) -> anyhow::Result<()> {
    match route(&req.path) {
        Route::Root => match req.method.as_str() {
            "GET" | "HEAD" => handlers::root(sink, req).await,
            _ => send_405_with_allow(sink, "GET, HEAD").await,
        },
        Route::Users => match req.method.as_str() {
            "GET" | "HEAD" => {
                if restux_cache::serve(cache, req, sink).await? {
                    return Ok(());
                }
                let mut writer = CacheWriter::new(sink, Arc::clone(cache), req);
                handlers::users_get_all(&mut writer, req, db).await
            }
            "POST" => {
                if !require_auth(sink, req, cfg.auth()).await? {
                    return Ok(());
                }
                handlers::users_post_one(sink, req, db, cache).await
            }
            "OPTIONS" => handlers::users_options(sink).await,
            _ => send_405_with_allow(sink, handlers::USERS_ALLOW).await,
        },
        Route::User(raw_id) => match req.method.as_str() {
            "GET" | "HEAD" => {
                if restux_cache::serve(cache, req, sink).await? {
                    return Ok(());
                }
                let mut writer = CacheWriter::new(sink, Arc::clone(cache), req);
                handlers::users_get_one(&mut writer, req, db, raw_id).await
            }
            "PUT" => {
                if !require_auth(sink, req, cfg.auth()).await? {
                    return Ok(());
                }
                handlers::users_put_one(sink, req, db, cache, raw_id).await
            }
            "PATCH" => {
                if !require_auth(sink, req, cfg.auth()).await? {
                    return Ok(());
                }
                handlers::users_patch_one(sink, req, db, cache, raw_id).await
            }
            "DELETE" => {
                if !require_auth(sink, req, cfg.auth()).await? {
                    return Ok(());
                }
                handlers::users_delete_one(sink, req, db, cache, raw_id).await
            }
            "OPTIONS" => handlers::user_options(sink).await,
            _ => send_405_with_allow(sink, handlers::USER_ALLOW).await,
        },
        Route::NotFound => send_error(sink, StatusCode::NOT_FOUND).await,
    }
}
