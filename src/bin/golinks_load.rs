use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use golinks::dynamo::DynamoStore;
use golinks::names::normalize;
use golinks::{DeleteMode, Route, RouteStore};
use serde_json::Value as Json;
use tracing_subscriber::EnvFilter;

/// Restore an `/admin/dumps` backup into a routes table.
#[derive(Parser, Debug)]
#[command(name = "golinks-load")]
struct Cli {
    /// Dump file: the `/admin/dumps` response or a bare name -> route object
    dump: PathBuf,

    #[arg(long, env = "TABLE_NAME")]
    table: String,

    /// Region of the table, if it differs from the default chain's
    #[arg(long, env = "TABLE_REGION")]
    region: Option<String>,

    /// Parse and validate only; write nothing
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Report {
    written: usize,
    skipped: usize,
}

fn parse_dump(text: &str) -> Result<HashMap<String, Route>, serde_json::Error> {
    let v: Json = serde_json::from_str(text)?;
    // A bare map wins, so a link literally named "routes" still loads.
    let bare_err = match serde_json::from_value(v.clone()) {
        Ok(routes) => return Ok(routes),
        Err(e) => e,
    };
    // Admin responses wrap the map in {"ok": true, "routes": {...}}
    match v {
        Json::Object(mut obj) if obj.get("ok") == Some(&Json::Bool(true)) => {
            match obj.remove("routes") {
                Some(routes) => serde_json::from_value(routes),
                None => Err(bare_err),
            }
        }
        _ => Err(bare_err),
    }
}

async fn load(
    store: &dyn RouteStore,
    routes: HashMap<String, Route>,
    dry_run: bool,
) -> golinks::Result<Report> {
    let mut report = Report::default();
    for (raw, rt) in routes {
        let name = match normalize(&raw) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(link = %raw, err = %e, "skipping invalid name");
                report.skipped += 1;
                continue;
            }
        };
        if rt.url.is_empty() || !rt.is_live() {
            tracing::warn!(link = %name, "skipping route without a live url");
            report.skipped += 1;
            continue;
        }
        if !dry_run {
            store.put(&name, &rt).await?;
        }
        report.written += 1;
    }
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let cli = Cli::parse();
    let text = std::fs::read_to_string(&cli.dump)?;
    let routes = parse_dump(&text)?;
    tracing::info!(count = routes.len(), dump = %cli.dump.display(), "dump parsed");

    let store = DynamoStore::connect(cli.table.clone(), cli.region.clone(), DeleteMode::Hard).await;
    let report = load(&store, routes, cli.dry_run).await?;

    tracing::info!(
        written = report.written,
        skipped = report.skipped,
        dry_run = cli.dry_run,
        table = %cli.table,
        "load finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use golinks::MemoryStore;

    const DUMP: &str = r#"{
        "ok": true,
        "routes": {
            "Wiki": {"url": "https://wiki.example", "created_at": "2024-01-01T00:00:00Z",
                     "modified_at": "2024-01-01T00:00:00Z", "uid": "1", "generated": false},
            "api": {"url": "https://bad.example", "created_at": "2024-01-01T00:00:00Z",
                    "modified_at": "2024-01-01T00:00:00Z"}
        }
    }"#;

    #[test]
    fn accepts_wrapped_and_bare_dumps() {
        let wrapped = parse_dump(DUMP).unwrap();
        assert_eq!(wrapped.len(), 2);

        let bare = serde_json::to_string(&wrapped).unwrap();
        assert_eq!(parse_dump(&bare).unwrap().len(), 2);
    }

    #[test]
    fn link_named_routes_is_not_an_envelope() {
        let bare = r#"{
            "routes": {"url": "https://routes.example", "created_at": "2024-01-01T00:00:00Z",
                       "modified_at": "2024-01-01T00:00:00Z"},
            "wiki": {"url": "https://wiki.example", "created_at": "2024-01-01T00:00:00Z",
                     "modified_at": "2024-01-01T00:00:00Z"}
        }"#;
        let routes = parse_dump(bare).unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes["routes"].url, "https://routes.example");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_dump(r#"{"routes": 3}"#).is_err());
        assert!(parse_dump("[]").is_err());
    }

    #[tokio::test]
    async fn skips_reserved_names() {
        let store = MemoryStore::default();
        let report = load(&store, parse_dump(DUMP).unwrap(), false).await.unwrap();
        assert_eq!(report, Report { written: 1, skipped: 1 });
        assert_eq!(
            store.get("wiki").await.unwrap().unwrap().url,
            "https://wiki.example"
        );
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let store = MemoryStore::default();
        let report = load(&store, parse_dump(DUMP).unwrap(), true).await.unwrap();
        assert_eq!(report.written, 1);
        assert!(store.is_empty());
    }
}
