use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use boardd::{config::BoardConfig, rest, ws, AppContext};

#[derive(Parser)]
#[command(name = "boardd", about = "boardd — real-time kanban board daemon", version)]
struct Args {
    /// HTTP JSON API port
    #[arg(long, env = "BOARDD_HTTP_PORT")]
    http_port: Option<u16>,

    /// WebSocket push-channel port
    #[arg(long, env = "BOARDD_WS_PORT")]
    ws_port: Option<u16>,

    /// Data directory for config and the SQLite database
    #[arg(long, env = "BOARDD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "BOARDD_LOG")]
    log: Option<String>,
}

fn init_logging(config: &BoardConfig) {
    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(config.log.clone())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(config.log.clone())
            .compact()
            .init();
    }
}

/// Returns a future that resolves when a shutdown signal is received.
///
/// On Unix we listen for SIGTERM *and* Ctrl-C.
/// On other platforms we listen for Ctrl-C only.
async fn make_shutdown_future() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = BoardConfig::new(args.http_port, args.ws_port, args.data_dir, args.log);
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        "boardd starting"
    );

    let ctx: Arc<AppContext> = AppContext::init(config).await?;

    let rest_server = tokio::spawn(rest::run(ctx.clone()));
    let ws_server = tokio::spawn(ws::run(ctx.clone()));

    let shutdown = make_shutdown_future();
    tokio::pin!(shutdown);

    tokio::select! {
        biased;

        _ = &mut shutdown => {
            info!("shutdown signal received — stopping servers");
        }
        res = rest_server => {
            if let Ok(Err(e)) = res {
                error!(err = %e, "HTTP server exited");
            }
        }
        res = ws_server => {
            if let Ok(Err(e)) = res {
                error!(err = %e, "realtime server exited");
            }
        }
    }

    info!("boardd stopped");
    Ok(())
}
