//! The greeting server: one route, `GET /`, answered with `Hello world`
//! on port 8080. No flags, no configuration; runs until terminated.

use hellod::{Request, Response, Router, Server, ServerResult};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LISTEN_ADDR: &str = "0.0.0.0:8080";

async fn hello(_req: Request) -> ServerResult<Response> {
    let mut res = Response::new(200);
    res.body("Hello world");
    Ok(res)
}

fn run() -> ServerResult<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut router = Router::new();
        router.get("/", hello);

        let server = Server::bind(LISTEN_ADDR, router).await?;
        info!("listening on http://{}", server.local_addr()?);
        server.serve().await
    })
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run() {
        error!("server failed: {}", err);
        std::process::exit(1);
    }
}
