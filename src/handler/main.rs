use std::sync::Arc;

use lambda_http::{run, service_fn, Error, Request};
use otk_please::{function_handler, Config, TokenClient};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .without_time()
        .init();

    // Secrets are read once; invocations share them read-only.
    let config = Arc::new(Config::from_env()?);
    let tokens = Arc::new(TokenClient::new(config.fetch_timeout)?);
    info!(?config, "configuration loaded");

    run(service_fn(|event: Request| {
        let config = Arc::clone(&config);
        let tokens = Arc::clone(&tokens);
        async move { function_handler(event, &config, tokens.as_ref()).await }
    }))
    .await
}
