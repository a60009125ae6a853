use std::sync::Arc;

use lambda_http::{Body, Error, Request, Response};
use serde_json::json;

use crate::{
    admin, api,
    config::{Backend, Config},
    dynamo::DynamoStore,
    generator::NameGenerator,
    names::{is_banned, normalize, parse_name},
    store::{MemoryStore, RouteStore},
    util::{error_response, json_err, json_ok, redirect, text},
    words::WordLists,
};

#[derive(Clone)]
pub struct Ctx {
    pub store: Arc<dyn RouteStore>,
    pub generator: Arc<NameGenerator>,
    pub domain: String, // e.g., go.example.com
    pub admin: bool,
    pub version: String,
}

impl Ctx {
    pub async fn new(cfg: &Config) -> crate::Result<Self> {
        let store: Arc<dyn RouteStore> = match cfg.backend {
            Backend::DynamoDb => Arc::new(
                DynamoStore::connect(cfg.table.clone(), cfg.table_region.clone(), cfg.delete_mode)
                    .await,
            ),
            Backend::Memory => Arc::new(MemoryStore::new(cfg.delete_mode)),
        };

        let words = WordLists::load(cfg.adjectives_file.as_deref(), cfg.nouns_file.as_deref())?;
        let generator = match cfg.seed {
            Some(seed) => NameGenerator::seeded(words, seed),
            None => NameGenerator::from_entropy(words),
        }
        .with_attempts_per_tier(cfg.attempts_per_tier);

        Ok(Self::with_parts(store, generator, cfg))
    }

    pub fn with_parts(store: Arc<dyn RouteStore>, generator: NameGenerator, cfg: &Config) -> Self {
        Self {
            store,
            generator: Arc::new(generator),
            domain: cfg.domain.clone(),
            admin: cfg.admin,
            version: cfg.version.clone(),
        }
    }
}

/// Percent-encode each `/` segment of a name for use in a path or URL.
pub fn escape_path(name: &str) -> String {
    name.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

pub async fn router(req: Request, ctx: &Ctx) -> Result<Response<Body>, Error> {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();

    match (method.as_str(), path.as_str()) {
        ("GET", "/healthz") => text(200, "👍\n"),
        ("GET", "/version") => text(200, format!("{}\n", ctx.version)),
        ("GET", "/links" | "/links/") => list_links(ctx).await,
        (_, p) if p == "/api/url" || p.starts_with("/api/url/") => api::api_url(req, ctx).await,
        (_, p) if ctx.admin && (p == "/admin" || p.starts_with("/admin/")) => {
            admin::admin_handler(req, ctx).await
        }
        ("GET", p) if p.starts_with("/edit/") || p == "/edit" => edit_link(p, ctx).await,
        ("GET", p) => resolve_link(p, ctx).await,
        _ => json_err(405, "method_not_allowed", "Method Not Allowed"),
    }
}

/// Redirect a mapped name to its target and an unmapped one to its edit page.
async fn resolve_link(path: &str, ctx: &Ctx) -> Result<Response<Body>, Error> {
    let raw = parse_name("/", path);
    if raw.is_empty() {
        return redirect("/edit/");
    }

    let name = match normalize(&raw) {
        Ok(n) => n,
        Err(e) => return error_response(&crate::Error::from(e)),
    };

    match ctx.store.get(&name).await {
        Ok(Some(rt)) => {
            tracing::debug!(link = %name, target = %rt.url, "redirect");
            redirect(&rt.url)
        }
        Ok(None) => redirect(&format!("/edit/{}", escape_path(&name))),
        Err(e) => error_response(&e),
    }
}

async fn edit_link(path: &str, ctx: &Ctx) -> Result<Response<Body>, Error> {
    let raw = parse_name("/edit/", path);

    // A reserved name is served by its own handler, not edited.
    if is_banned(&raw) {
        return redirect(&format!("/{}", escape_path(&raw)));
    }
    if raw.is_empty() {
        return json_ok(json!({ "name": "", "route": null }));
    }

    let name = match normalize(&raw) {
        Ok(n) => n,
        Err(e) => return error_response(&crate::Error::from(e)),
    };
    match ctx.store.get(&name).await {
        Ok(rt) => json_ok(json!({ "name": name, "route": rt })),
        Err(e) => error_response(&e),
    }
}

async fn list_links(ctx: &Ctx) -> Result<Response<Body>, Error> {
    match ctx.store.get_all().await {
        Ok(routes) => json_ok(json!({ "count": routes.len(), "routes": routes })),
        Err(e) => error_response(&e),
    }
}
