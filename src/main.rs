mod config;
mod console;
mod domain;
mod providers;
mod scan_api;
mod scanner_status;
mod store;
mod workflow;

use std::{path::Path, sync::Arc, time::Duration};

use anyhow::Context;
use config::Config;
use migration::MigratorTrait;
use poem::{
    EndpointExt, Route, Server,
    listener::TcpListener,
    middleware::{Cors, Tracing as PoemTracing},
};
use poem_openapi::OpenApiService;
use providers::ProviderClient;
use sea_orm::Database;
use store::BookStore;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder, prelude::*};

type ShelfScanResult<T> = anyhow::Result<T>;

#[tokio::main]
async fn main() -> ShelfScanResult<()> {
    // Initialize tracing (logs). Respect RUST_LOG if set, default to info for our crate and warn for deps.
    let default_filter = format!(
        "{}=info,poem=info,reqwest=warn,h2=warn",
        env!("CARGO_PKG_NAME")
    );
    let env_filter = std::env::var("RUST_LOG").unwrap_or(default_filter);
    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .with_level(true)
        .pretty()
        .finish()
        .with(ErrorLayer::default())
        .init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting ShelfScan");
    // Load environment variables from .env files
    if Path::new(".env.local").exists() {
        dotenvy::from_filename(".env.local")?;
    } else if Path::new(".env").exists() {
        dotenvy::from_filename(".env")?;
    };
    let config = Config::load();
    match config.validate() {
        Ok(_) => {}
        Err(e) => {
            return Err(anyhow::anyhow!(e));
        }
    }

    // `shelfscan scan` runs the interactive console client against a
    // running server instead of starting one.
    if std::env::args().nth(1).as_deref() == Some("scan") {
        return console::run(&config).await;
    }

    let db_conn = Database::connect(&config.db_connection_string)
        .await
        .with_context(|| "Failed to connect to database")?;

    migration::Migrator::up(&db_conn, None)
        .await
        .with_context(|| "Failed to run database migrations")?;

    let providers = ProviderClient::new(
        &config.openlibrary_url,
        &config.google_books_url,
        Duration::from_secs(config.provider_timeout_secs),
    )?;
    tracing::info!(
        openlibrary = %config.openlibrary_url,
        google_books = %config.google_books_url,
        "configured provider client"
    );

    let store = BookStore::new(Arc::new(db_conn));
    run_poem(store, providers, &config).await?;
    Ok(())
}

pub async fn run_poem(
    store: BookStore,
    providers: ProviderClient,
    config: &Config,
) -> ShelfScanResult<()> {
    let version = env!("CARGO_PKG_VERSION");
    let api = scan_api::ShelfScanApi {
        store: Arc::new(store),
        providers: Arc::new(providers),
    };
    let api_service = OpenApiService::new(api, "ShelfScan API", version)
        .server(format!("http://localhost:{}", config.port));
    let ui = api_service.rapidoc();
    let spec = api_service.spec();
    let route = Route::new()
        .nest("/", api_service)
        .nest("/ui", ui)
        .nest("/spec", poem::endpoint::make_sync(move |_| spec.clone()))
        .with(Cors::new())
        .with(PoemTracing);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%bind_addr, "starting HTTP server");
    Server::new(TcpListener::bind(bind_addr)).run(route).await?;
    Ok(())
}
