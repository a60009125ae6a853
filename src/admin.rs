use lambda_http::{Body, Error, Request, Response};
use serde_json::json;

use crate::{
    handler::Ctx,
    names::parse_name,
    util::{error_response, json_err, json_ok},
};

/// `/admin/` endpoints. Only mounted when `ADMIN_ENABLED` is set.
pub(crate) async fn admin_handler(req: Request, ctx: &Ctx) -> Result<Response<Body>, Error> {
    if req.method().as_str() != "GET" {
        return json_err(405, "method_not_allowed", "Method Not Allowed");
    }

    let p = parse_name("/admin/", req.uri().path());
    match p.as_str() {
        "" => json_ok(json!({})),
        "dumps" => admin_dumps(ctx).await,
        _ => json_err(404, "not_found", "Not Found"),
    }
}

/// Every live route keyed by name, in the format the loader reads back.
async fn admin_dumps(ctx: &Ctx) -> Result<Response<Body>, Error> {
    match ctx.store.get_all().await {
        Ok(links) => {
            tracing::info!(count = links.len(), "admin dump");
            json_ok(json!({ "routes": links }))
        }
        Err(e) => error_response(&e),
    }
}
