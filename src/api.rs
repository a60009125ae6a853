use chrono::Utc;
use lambda_http::{Body, Error, Request, Response};
use serde_json::json;

use crate::{
    handler::{escape_path, Ctx},
    model::{Route, UpsertReq, UpsertResp},
    names::{normalize, parse_name},
    store::lookup,
    util::{body_bytes, error_response, json_err, json_ok, request_id, resp_json, valid_target},
};

const UID_HEADER: &str = "x-golinks-uid";

pub(crate) async fn api_url(req: Request, ctx: &Ctx) -> Result<Response<Body>, Error> {
    let raw = parse_name("/api/url/", req.uri().path());
    match req.method().as_str() {
        "GET" => get_url(&raw, ctx).await,
        "POST" => post_url(&req, &raw, ctx).await,
        "DELETE" => delete_url(&raw, ctx).await,
        _ => json_err(405, "method_not_allowed", "Method Not Allowed"),
    }
}

async fn get_url(raw: &str, ctx: &Ctx) -> Result<Response<Body>, Error> {
    let name = match normalize(raw) {
        Ok(n) => n,
        Err(e) => return error_response(&crate::Error::from(e)),
    };
    match lookup(ctx.store.as_ref(), &name).await {
        Ok(rt) => json_ok(json!({ "name": name, "route": rt })),
        Err(e) => error_response(&e),
    }
}

/// Create or edit `raw`; with no name, generate one and claim it.
async fn post_url(req: &Request, raw: &str, ctx: &Ctx) -> Result<Response<Body>, Error> {
    let payload: UpsertReq = match serde_json::from_slice(&body_bytes(req)) {
        Ok(p) => p,
        Err(_) => return json_err(400, "bad_json", "Body must be {\"url\": ...}"),
    };

    if !valid_target(&payload.url) {
        return json_err(400, "invalid_url", "url must be an absolute http(s) URL");
    }

    let uid = req
        .headers()
        .get(UID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or(payload.uid)
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(request_id);

    if raw.trim().is_empty() {
        let name = match ctx
            .generator
            .generate_link(ctx.store.as_ref(), &uid, &payload.url)
            .await
        {
            Ok(n) => n,
            Err(e) => return error_response(&e),
        };
        return match lookup(ctx.store.as_ref(), &name).await {
            Ok(rt) => upsert_resp(201, ctx, name, rt),
            Err(e) => error_response(&e),
        };
    }

    let name = match normalize(raw) {
        Ok(n) => n,
        Err(e) => return error_response(&crate::Error::from(e)),
    };

    match save_route(ctx, &name, payload.url, uid).await {
        Ok((status, rt)) => {
            tracing::info!(link = %name, target = %rt.url, created = (status == 201), "route saved");
            upsert_resp(status, ctx, name, rt)
        }
        Err(e) => error_response(&e),
    }
}

/// Edit `name` if it exists, otherwise claim it with a create-only insert.
/// A lost insert means someone else created it first: that record is edited,
/// keeping its owner and creation time.
async fn save_route(
    ctx: &Ctx,
    name: &str,
    url: String,
    uid: String,
) -> crate::Result<(u16, Route)> {
    let now = Utc::now();
    let existing = match ctx.store.get(name).await? {
        Some(existing) => existing,
        None => {
            let rt = Route::new(url.clone(), uid, now);
            if ctx.store.insert(name, &rt).await? {
                return Ok((201, rt));
            }
            tracing::debug!(link = name, "lost create race, editing instead");
            lookup(ctx.store.as_ref(), name).await?
        }
    };

    let rt = existing.edited(url, now);
    ctx.store.put(name, &rt).await?;
    Ok((200, rt))
}

async fn delete_url(raw: &str, ctx: &Ctx) -> Result<Response<Body>, Error> {
    let name = match normalize(raw) {
        Ok(n) => n,
        Err(e) => return error_response(&crate::Error::from(e)),
    };
    match ctx.store.del(&name).await {
        Ok(()) => {
            tracing::info!(link = %name, "route deleted");
            json_ok(json!({ "name": name }))
        }
        Err(e) => error_response(&e),
    }
}

fn upsert_resp(status: u16, ctx: &Ctx, name: String, route: Route) -> Result<Response<Body>, Error> {
    let out = UpsertResp {
        ok: true,
        short_url: format!("https://{}/{}", ctx.domain, escape_path(&name)),
        name,
        route,
    };
    let body = serde_json::to_value(out).map_err(|e| Error::from(format!("json: {e}")))?;
    resp_json(status, body)
}
