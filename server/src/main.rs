mod api;
mod reload;
mod telemetry;
mod trace_id;

use anyhow::{Context, Result};
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware;
use axum::Router;
use clap::Parser;
use crawler_core::{BrowserClient, BrowserClientBuilder, FetchConfig, HttpClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::reload::ReloadWatcher;
use crate::trace_id::TraceId;

/// Application state shared across all handlers
pub type AppState = Arc<dyn HttpClient>;

#[derive(Parser, Debug)]
#[command(name = "crawler-server")]
#[command(about = "Fetch a page on request and return its HTML", long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 18100)]
    port: u16,

    /// Restart automatically when the server binary is rebuilt
    #[arg(long)]
    reload: bool,

    /// JSON file with the outbound header/cookie set and limits
    #[arg(long)]
    config: Option<PathBuf>,

    /// Outbound request timeout, overrides the config file
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    /// Redirects to follow per fetch (0 disables), overrides the config file
    #[arg(long)]
    max_redirects: Option<usize>,

    /// Print the OpenAPI document and exit
    #[arg(long)]
    openapi: bool,
}

impl Args {
    /// Outbound client settings: the config file (or the default profile),
    /// then any command-line overrides.
    fn client_builder(&self) -> Result<BrowserClientBuilder> {
        let config = match &self.config {
            Some(path) => FetchConfig::from_file(path)?,
            None => FetchConfig::default(),
        };
        let mut builder = BrowserClient::builder().config(config);
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(max) = self.max_redirects {
            builder = builder.max_redirects(max);
        }
        Ok(builder)
    }
}

pub fn app(state: AppState) -> Router {
    api::router()
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());
                    let trace_id = request
                        .extensions()
                        .get::<TraceId>()
                        .map(|id| id.0.as_str())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                        trace_id = %trace_id,
                    )
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, _span: &Span| {
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(trace_id::trace_id_middleware))
}

/// Resolves on Ctrl-C, SIGTERM, or (with `--reload`) a rebuilt binary.
/// Returns true when the shutdown is for a reload.
async fn shutdown_signal(rebuilt: Option<Arc<Notify>>) -> bool {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let reload = async {
        match rebuilt {
            Some(notify) => notify.notified().await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl-C, shutting down");
            false
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, shutting down");
            false
        }
        _ = reload => true,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.openapi {
        let spec = api::openapi()
            .to_pretty_json()
            .context("Failed to render OpenAPI document")?;
        println!("{}", spec);
        return Ok(());
    }

    telemetry::init_telemetry();

    let client = args
        .client_builder()?
        .build()
        .context("Failed to build HTTP client")?;
    let config = client.config();
    tracing::info!(
        headers = config.headers.len(),
        cookies = config.cookies.len(),
        timeout_ms = config.timeout_ms,
        connect_timeout_ms = config.connect_timeout_ms,
        max_redirects = config.max_redirects,
        "outbound fetch configured"
    );
    let state: AppState = Arc::new(client);

    let watcher = if args.reload {
        Some(ReloadWatcher::start()?)
    } else {
        None
    };

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", args.host, args.port))?;

    tracing::info!("Server listening on {}", listener.local_addr()?);
    tracing::info!("OpenAPI spec available at {}", api::OPENAPI_PATH);

    let reload_requested = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let shutdown = {
        let rebuilt = watcher.as_ref().map(ReloadWatcher::changed);
        let reload_requested = reload_requested.clone();
        async move {
            if shutdown_signal(rebuilt).await {
                reload_requested.store(true, std::sync::atomic::Ordering::SeqCst);
            }
        }
    };

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    if let Some(watcher) = watcher {
        if reload_requested.load(std::sync::atomic::Ordering::SeqCst) {
            watcher.restart().await?;
        }
    }

    Ok(())
}
