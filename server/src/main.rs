use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use http_body_util::Full;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};
use hyper::server::conn::http1;
use hyper::{Method, Response, StatusCode};
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use server::AppState;
use server::auth::SessionVerifier;
use server::database::schema;
use server::handlers::http::routes::build_api_router;
use shared::config::{LiveConfig, load_config};

#[derive(Parser, Debug)]
#[command(name = "pulsewatch", about = "Health-monitoring backend")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "PULSEWATCH_CONFIG", default_value = "config.toml")]
    config: String,

    /// Override server.bind from the config file.
    #[arg(long)]
    bind: Option<String>,

    /// Override database.url from the config file.
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    // The secret is fixed for the process lifetime; a SIGHUP reload swaps
    // everything else but does not rotate signing keys under live tokens.
    let jwt_secret = config
        .auth
        .resolved_jwt_secret()
        .context("jwt_secret missing after validation")?;
    let sessions = SessionVerifier::new(&jwt_secret);

    let addr = config.server.addr();
    let max_connections = config.server.max_connections;
    let database_url = config.database.url.clone();

    let connect_options = SqliteConnectOptions::from_str(&database_url)
        .with_context(|| format!("Invalid database url: {}", database_url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let db = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(connect_options)
        .await
        .context("Failed to open database")?;

    schema::create_tables(&db)
        .await
        .context("Failed to initialize database schema")?;
    info!("Database ready at {}", database_url);

    let live_config = LiveConfig::new(config);
    let state = AppState::new(db, live_config.clone(), sessions);
    let router = Arc::new(build_api_router());

    spawn_sighup_reload(cli.config.clone(), live_config.clone());

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!(
        "Listening on http://{} (max {} connections)",
        addr, max_connections
    );

    let mut shutdown = std::pin::pin!(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received, closing listener");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!("Accept failed: {}", e);
                        continue;
                    }
                };

                let cors = cors_layer(&state).await;
                let router = router.clone();
                let state = state.clone();

                tokio::task::spawn(async move {
                    let svc = tower::service_fn(move |req| {
                        let router = router.clone();
                        let state = state.clone();
                        async move {
                            let resp = match router.route(req, state).await {
                                Ok(resp) => resp,
                                Err(e) => {
                                    error!("Handler error: {:#}", e);
                                    internal_error()
                                }
                            };
                            Ok::<_, std::convert::Infallible>(resp)
                        }
                    });
                    let svc = TowerToHyperService::new(
                        ServiceBuilder::new().layer(cors).service(svc),
                    );

                    if let Err(err) = http1::Builder::new()
                        .timer(TokioTimer::new())
                        .serve_connection(TokioIo::new(stream), svc)
                        .await
                    {
                        warn!("Error serving connection from {}: {:?}", peer, err);
                    }
                });
            }
        }
    }

    Ok(())
}

/// Build the CORS layer from the current config. An empty allowed_origin
/// means no CORS headers at all.
async fn cors_layer(state: &AppState) -> CorsLayer {
    let origin = state.config.read().await.cors.allowed_origin.clone();
    if origin.is_empty() {
        return CorsLayer::new();
    }

    match HeaderValue::from_str(&origin) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                AUTHORIZATION,
                CONTENT_TYPE,
                HeaderName::from_static("x-api-key"),
            ]),
        Err(e) => {
            warn!("Invalid cors.allowed_origin '{}': {}", origin, e);
            CorsLayer::new()
        }
    }
}

/// SIGHUP swaps the config in place. Validation happens inside
/// `load_config`, so a broken file leaves the running config untouched.
fn spawn_sighup_reload(path: String, live: LiveConfig) {
    tokio::spawn(async move {
        let mut hup = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
            Ok(sig) => sig,
            Err(e) => {
                warn!("SIGHUP handler unavailable: {}", e);
                return;
            }
        };

        while hup.recv().await.is_some() {
            match load_config(&path) {
                Ok(new_config) => {
                    live.reload(new_config).await;
                    info!("Configuration reloaded from {}", path);
                }
                Err(e) => error!("Config reload failed, keeping previous config: {}", e),
            }
        }
    });
}

fn internal_error() -> Response<Full<Bytes>> {
    let body = r#"{"status":"error","code":"INTERNAL_ERROR","message":"An internal error occurred"}"#;
    let mut resp = Response::new(Full::new(Bytes::from(body)));
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}
