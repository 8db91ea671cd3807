//! Content records page server.
//!
//! Serves one YAML page document on every path.
//!
//! Environment:
//!   CONTENTRECORDS_PAGE      path of the page document (required)
//!   CONTENTRECORDS_ADDR      listen address (default 127.0.0.1:8080)
//!   CONTENTRECORDS_MAX_BODY  request body limit in bytes (default 8 MiB)
//!   RUST_LOG                 log filter (default info)

use std::{env, fs, sync::Arc};

use anyhow::{Context, Result};
use contentrecords_engine::ContentRecords;
use contentrecords_http::{build_router, HostState, Page};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let page_path = env::var("CONTENTRECORDS_PAGE").context("CONTENTRECORDS_PAGE is not set")?;
    let addr = env::var("CONTENTRECORDS_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let body_limit = match env::var("CONTENTRECORDS_MAX_BODY") {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("CONTENTRECORDS_MAX_BODY is not a byte count: {raw}"))?,
        Err(_) => HostState::DEFAULT_BODY_LIMIT,
    };

    let source =
        fs::read_to_string(&page_path).with_context(|| format!("failed to read {page_path}"))?;
    let page = Page::parse_yaml(&source).with_context(|| format!("failed to load {page_path}"))?;
    info!(path = %page_path, instances = page.len(), "page loaded");

    let state = Arc::new(HostState::new(ContentRecords::default(), page).with_body_limit(body_limit));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
