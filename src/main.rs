use golinks::config::Config;
use golinks::handler::{self, Ctx};
use lambda_http::{run, service_fn, Error, Request};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let cfg = Config::from_env()?;
    let ctx = Ctx::new(&cfg).await?;
    tracing::info!(
        backend = ?cfg.backend,
        table = %cfg.table,
        delete_mode = ?cfg.delete_mode,
        admin = cfg.admin,
        "golinks ready"
    );

    run(service_fn(move |req: Request| {
        let ctx = ctx.clone();
        async move { handler::router(req, &ctx).await }
    }))
    .await
}
