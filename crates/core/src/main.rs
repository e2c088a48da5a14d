use anyhow::{Context, Result};
use clap::Parser;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

mod api;
mod config;
mod lifecycle;
mod types;

use config::{Settings, SettingsResolver};
use lifecycle::Lifecycle;

#[derive(Parser)]
#[command(name = "jarvis", about = "Personal AI voice assistant with persistent memory")]
struct Cli {
    /// Dotenv file read beneath the process environment
    #[arg(long, default_value = config::DEFAULT_ENV_FILE, env = "JARVIS_ENV_FILE")]
    env_file: PathBuf,

    /// Print the resolved settings (secrets redacted) and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match SettingsResolver::new(&cli.env_file).resolve() {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(false);
            error!(
                error = %e,
                env_file = %cli.env_file.display(),
                "Invalid configuration, not starting"
            );
            std::process::exit(1);
        }
    };

    if cli.print_config {
        println!("{settings:#?}");
        return Ok(());
    }

    init_tracing(settings.debug);

    let addr = settings.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    run(settings, listener, shutdown_signal()).await
}

fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "jarvis=debug,tower_http=debug"
    } else {
        "jarvis=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

/// Serves until `shutdown` resolves. Startup is logged before the first
/// accept; shutdown is logged after in-flight requests have drained.
async fn run<F>(settings: Arc<Settings>, listener: TcpListener, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let lifecycle = Lifecycle::start(&settings);
    let app = api::router(settings);

    let addr = listener.local_addr()?;
    info!(%addr, "JARVIS API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    lifecycle.stop();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, draining connections"),
        () = terminate => info!("Received SIGTERM, draining connections"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::tests::CapturedLogs;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();

        let cli = Cli::try_parse_from(["jarvis"]).unwrap();
        assert_eq!(cli.env_file, PathBuf::from(".env"));
        assert!(!cli.print_config);

        let cli = Cli::try_parse_from(["jarvis", "--env-file", "/etc/jarvis.env", "--print-config"])
            .unwrap();
        assert_eq!(cli.env_file, PathBuf::from("/etc/jarvis.env"));
        assert!(cli.print_config);
    }

    #[tokio::test]
    async fn test_lifecycle_brackets_request_handling() {
        let logs = CapturedLogs::default();
        let _subscriber = tracing::subscriber::set_default(logs.subscriber());

        let settings = Arc::new(Settings {
            mem0_api_url: "http://mem:9999".into(),
            user_id: "alice".into(),
            ..Settings::default()
        });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(run(settings, listener, async move {
            let _ = stop_rx.await;
        }));

        let body: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "status": "healthy",
                "memory_api": "http://mem:9999",
                "user_id": "alice",
            })
        );
        assert_eq!(logs.count("Starting JARVIS..."), 1);
        assert_eq!(logs.count("Shutting down JARVIS..."), 0);

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();

        assert_eq!(logs.count("Starting JARVIS..."), 1);
        assert_eq!(logs.count("Shutting down JARVIS..."), 1);
        assert!(reqwest::get(format!("http://{addr}/")).await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_before_any_request() {
        let logs = CapturedLogs::default();
        let _subscriber = tracing::subscriber::set_default(logs.subscriber());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        run(Arc::new(Settings::default()), listener, async {})
            .await
            .unwrap();

        assert_eq!(logs.count("Starting JARVIS..."), 1);
        assert_eq!(logs.count("Shutting down JARVIS..."), 1);
    }
}
