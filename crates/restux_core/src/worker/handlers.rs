//! The users REST surface.
//!
//! Read handlers are invoked behind the cache interceptor and write their
//! responses through a capturing writer. Mutating handlers talk to the user
//! database and, once the persistent write has succeeded, invalidate the
//! collection key and the item key a reader would use. Invalidation never
//! happens before or instead of a successful write.

use http::{StatusCode, header};
use restux_cache::{ResponseStore, make_key};
use restux_http::responses::{send_error, send_json, send_no_content, send_text};
use restux_http::{ParsedRequest, ResponseSink};
use restux_user::{User, UserDb, UserError};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

pub(crate) const USERS_ALLOW: &str = "GET, HEAD, POST, OPTIONS";
pub(crate) const USER_ALLOW: &str = "GET, HEAD, PUT, PATCH, DELETE, OPTIONS";

const USERS_RESOURCE: &str = "/users";

pub(crate) async fn root<S: ResponseSink + ?Sized>(
    sink: &mut S,
    req: &ParsedRequest,
) -> anyhow::Result<()> {
    if req.is_head() {
        return send_no_content(sink, StatusCode::OK).await;
    }
    send_text(sink, StatusCode::OK, "Running API v1\n").await
}

pub(crate) async fn users_get_all<S: ResponseSink + ?Sized>(
    sink: &mut S,
    req: &ParsedRequest,
    db: &UserDb,
) -> anyhow::Result<()> {
    let users = match db.all().await {
        Ok(users) => users,
        Err(err) => {
            warn!(target: "restux::handlers", error = %err, "Listing users failed");
            return send_error(sink, StatusCode::INTERNAL_SERVER_ERROR).await;
        }
    };

    if req.is_head() {
        return send_no_content(sink, StatusCode::OK).await;
    }
    send_json(sink, StatusCode::OK, &json!({ "users": users })).await
}

pub(crate) async fn users_post_one<S: ResponseSink + ?Sized>(
    sink: &mut S,
    req: &ParsedRequest,
    db: &UserDb,
    cache: &ResponseStore,
) -> anyhow::Result<()> {
    let Ok(mut user) = serde_json::from_slice::<User>(&req.body) else {
        return send_error(sink, StatusCode::BAD_REQUEST).await;
    };
    user.id = Uuid::new_v4();

    match db.save(&user).await {
        Ok(()) => {}
        Err(UserError::InvalidRecord) => {
            return send_error(sink, StatusCode::BAD_REQUEST).await;
        }
        Err(err) => {
            warn!(target: "restux::handlers", error = %err, "Creating user failed");
            return send_error(sink, StatusCode::INTERNAL_SERVER_ERROR).await;
        }
    }

    cache.remove(USERS_RESOURCE);
    debug!(
        target: "restux::handlers",
        id = %user.id,
        "Created user, invalidated collection"
    );

    sink.headers().insert(
        header::LOCATION,
        format!("/users/{}", user.id).parse().expect("uuid path"),
    );
    send_no_content(sink, StatusCode::CREATED).await
}

pub(crate) async fn users_get_one<S: ResponseSink + ?Sized>(
    sink: &mut S,
    req: &ParsedRequest,
    db: &UserDb,
    raw_id: &str,
) -> anyhow::Result<()> {
    let Ok(id) = Uuid::parse_str(raw_id) else {
        return send_error(sink, StatusCode::NOT_FOUND).await;
    };

    let user = match db.one(id).await {
        Ok(user) => user,
        Err(UserError::NotFound) => {
            return send_error(sink, StatusCode::NOT_FOUND).await;
        }
        Err(err) => {
            warn!(target: "restux::handlers", error = %err, "Fetching user failed");
            return send_error(sink, StatusCode::INTERNAL_SERVER_ERROR).await;
        }
    };

    if req.is_head() {
        return send_no_content(sink, StatusCode::OK).await;
    }
    send_json(sink, StatusCode::OK, &json!({ "user": user })).await
}

pub(crate) async fn users_put_one<S: ResponseSink + ?Sized>(
    sink: &mut S,
    req: &ParsedRequest,
    db: &UserDb,
    cache: &ResponseStore,
    raw_id: &str,
) -> anyhow::Result<()> {
    let Ok(id) = Uuid::parse_str(raw_id) else {
        return send_error(sink, StatusCode::NOT_FOUND).await;
    };
    let Ok(mut user) = serde_json::from_slice::<User>(&req.body) else {
        return send_error(sink, StatusCode::BAD_REQUEST).await;
    };
    user.id = id;

    match db.save(&user).await {
        Ok(()) => {}
        Err(UserError::InvalidRecord) => {
            return send_error(sink, StatusCode::BAD_REQUEST).await;
        }
        Err(err) => {
            warn!(target: "restux::handlers", error = %err, "Replacing user failed");
            return send_error(sink, StatusCode::INTERNAL_SERVER_ERROR).await;
        }
    }

    invalidate_user(cache, req);
    send_json(sink, StatusCode::OK, &json!({ "user": user })).await
}

/// Partial update document: absent fields keep their stored value.
#[derive(Debug, Deserialize)]
struct UserPatch {
    name: Option<String>,
    role: Option<String>,
}

pub(crate) async fn users_patch_one<S: ResponseSink + ?Sized>(
    sink: &mut S,
    req: &ParsedRequest,
    db: &UserDb,
    cache: &ResponseStore,
    raw_id: &str,
) -> anyhow::Result<()> {
    let Ok(id) = Uuid::parse_str(raw_id) else {
        return send_error(sink, StatusCode::NOT_FOUND).await;
    };

    let mut user = match db.one(id).await {
        Ok(user) => user,
        Err(UserError::NotFound) => {
            return send_error(sink, StatusCode::NOT_FOUND).await;
        }
        Err(err) => {
            warn!(target: "restux::handlers", error = %err, "Fetching user failed");
            return send_error(sink, StatusCode::INTERNAL_SERVER_ERROR).await;
        }
    };

    let Ok(patch) = serde_json::from_slice::<UserPatch>(&req.body) else {
        return send_error(sink, StatusCode::UNPROCESSABLE_ENTITY).await;
    };
    if let Some(name) = patch.name {
        user.name = name;
    }
    if let Some(role) = patch.role {
        user.role = role;
    }

    match db.save(&user).await {
        Ok(()) => {}
        Err(UserError::InvalidRecord) => {
            return send_error(sink, StatusCode::BAD_REQUEST).await;
        }
        Err(err) => {
            warn!(target: "restux::handlers", error = %err, "Updating user failed");
            return send_error(sink, StatusCode::INTERNAL_SERVER_ERROR).await;
        }
    }

    invalidate_user(cache, req);
    send_json(sink, StatusCode::OK, &json!({ "user": user })).await
}

pub(crate) async fn users_delete_one<S: ResponseSink + ?Sized>(
    sink: &mut S,
    req: &ParsedRequest,
    db: &UserDb,
    cache: &ResponseStore,
    raw_id: &str,
) -> anyhow::Result<()> {
    let Ok(id) = Uuid::parse_str(raw_id) else {
        return send_error(sink, StatusCode::NOT_FOUND).await;
    };

    match db.delete(id).await {
        Ok(()) => {}
        Err(UserError::NotFound) => {
            return send_error(sink, StatusCode::NOT_FOUND).await;
        }
        Err(err) => {
            warn!(target: "restux::handlers", error = %err, "Deleting user failed");
            return send_error(sink, StatusCode::INTERNAL_SERVER_ERROR).await;
        }
    }

    invalidate_user(cache, req);
    send_no_content(sink, StatusCode::OK).await
}

pub(crate) async fn users_options<S: ResponseSink + ?Sized>(sink: &mut S) -> anyhow::Result<()> {
    sink.headers()
        .insert(header::ALLOW, USERS_ALLOW.parse().expect("static allow"));
    send_no_content(sink, StatusCode::OK).await
}

pub(crate) async fn user_options<S: ResponseSink + ?Sized>(sink: &mut S) -> anyhow::Result<()> {
    sink.headers()
        .insert(header::ALLOW, USER_ALLOW.parse().expect("static allow"));
    send_no_content(sink, StatusCode::OK).await
}

/// Drop both keys a reader could have used for this item. Two independent
/// removals; each is atomic on its own.
fn invalidate_user(cache: &ResponseStore, req: &ParsedRequest) {
    cache.remove(USERS_RESOURCE);
    cache.remove(&make_key(Some(req)));
    debug!(
        target: "restux::handlers",
        resource = %make_key(Some(req)),
        "Invalidated cache entries"
    );
}
