//! Serve letterboxed JPEG thumbnails of remote images

use std::{net::SocketAddr, sync::Arc};

use clap::Parser;

mod app; // Routing and State
mod canvas; // Resampling and padding
mod config; // Command line and environment
mod fetch; // Source retrieval and decoding
mod geometry; // Aspect fit and centering
mod primitive; // Primitives + essential dependencies
mod thumb; // The request pipeline
mod validate; // Query parameter checks

use crate::{
    app::{build_app, AppState},
    config::Config,
    fetch::HttpSource,
    primitive::anyhow::{self, Context},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up logging
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    tracing::info!(?config, "Starting");

    let source = HttpSource::new(&config)?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("The listen address as specified failed to parse")?;

    let app = build_app(AppState {
        config: Arc::new(config),
        source: Arc::new(source),
    });

    tracing::info!("Serving at {addr}");
    axum::Server::try_bind(&addr)
        .with_context(|| format!("bind {addr}"))?
        .serve(app.into_make_service())
        .await
        .context("server error")
}
