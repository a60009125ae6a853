use std::borrow::Cow;

use lambda_http::{Body, Error, Request, Response};
use url::Url;

/// Only absolute http(s) URLs with a host may be link targets.
pub fn valid_target(u: &str) -> bool {
    if let Ok(parsed) = Url::parse(u) {
        match parsed.scheme() {
            "http" | "https" => {}
            _ => return false,
        }
        return parsed.host().is_some();
    }
    false
}

pub fn request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn body_bytes(req: &Request) -> Vec<u8> {
    match req.body() {
        Body::Text(s) => s.as_bytes().to_vec(),
        Body::Binary(b) => b.clone(),
        _ => Vec::new(),
    }
}

pub fn resp_json(status: u16, v: serde_json::Value) -> Result<Response<Body>, Error> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::Text(v.to_string()))
        .map_err(|e| Error::from(format!("resp: {e}")))
}

pub fn json_ok(mut v: serde_json::Value) -> Result<Response<Body>, Error> {
    if let Some(obj) = v.as_object_mut() {
        obj.insert("ok".into(), serde_json::Value::Bool(true));
    }
    resp_json(200, v)
}

pub fn json_err(
    status: u16,
    code: &'static str,
    message: impl Into<Cow<'static, str>>,
) -> Result<Response<Body>, Error> {
    resp_json(
        status,
        serde_json::json!({
            "ok": false,
            "error": code,
            "message": message.into(),
            "request_id": request_id(),
        }),
    )
}

/// Error body for a failed core call. Store faults are logged with the id
/// returned to the client.
pub fn error_response(e: &crate::Error) -> Result<Response<Body>, Error> {
    let rid = request_id();
    if matches!(
        e,
        crate::Error::StoreUnavailable(_) | crate::Error::Configuration(_)
    ) {
        tracing::error!(request_id = %rid, err = %e, "backend failure");
    }
    resp_json(
        e.status(),
        serde_json::json!({
            "ok": false,
            "error": e.code(),
            "message": e.to_string(),
            "request_id": rid,
        }),
    )
}

pub fn redirect(location: &str) -> Result<Response<Body>, Error> {
    Response::builder()
        .status(307)
        .header("Location", location)
        .header("Cache-Control", "no-store")
        .body(Body::Empty)
        .map_err(|e| Error::from(format!("resp: {e}")))
}

pub fn text(status: u16, body: impl Into<String>) -> Result<Response<Body>, Error> {
    Response::builder()
        .status(status)
        .header("content-type", "text/plain; charset=utf-8")
        .body(Body::Text(body.into()))
        .map_err(|e| Error::from(format!("resp: {e}")))
}
