use std::process::ExitCode;

use anyhow::Context;
use configs::AppConfig;
use dotenvy::dotenv;
use tokio::runtime::Runtime;
use tracing::{error, info};
use uuid::Uuid;

const SERVICE: &str = "gps-tracker";

fn install_panic_hook(instance_id: Uuid) {
    std::panic::set_hook(Box::new(move |info| {
        error!(service = SERVICE, event = "panic", %instance_id, message = %info, "unhandled panic");
    }));
}

fn build_runtime(worker_threads: Option<usize>) -> anyhow::Result<Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(n) = worker_threads {
        builder.worker_threads(n);
    }
    builder.build().context("building tokio runtime")
}

/// Serve until the server fails or Ctrl+C arrives. State is in memory only, so
/// there is nothing to flush on the way out.
async fn serve_until_ctrl_c(cfg: AppConfig) -> anyhow::Result<()> {
    tokio::select! {
        res = server::run(cfg) => res,
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl+C")?;
            info!(service = SERVICE, event = "shutdown_signal", "Ctrl+C received, stopping");
            Ok(())
        }
    }
}

fn start(instance_id: Uuid) -> anyhow::Result<()> {
    let cfg = AppConfig::load_or_env().context("loading configuration")?;
    let rt = build_runtime(cfg.server.worker_threads)?;
    info!(
        service = SERVICE,
        event = "start",
        %instance_id,
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        threads = cfg.server.worker_threads.unwrap_or_default(),
        "location tracking service starting"
    );
    rt.block_on(serve_until_ctrl_c(cfg))
}

fn main() -> ExitCode {
    // .env before the subscriber so RUST_LOG / LOG_FORMAT from it apply
    dotenv().ok();
    common::utils::logging::init_logging_from_env();

    let instance_id = Uuid::new_v4();
    install_panic_hook(instance_id);

    match start(instance_id) {
        Ok(()) => {
            info!(service = SERVICE, event = "stop", %instance_id, "service stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = SERVICE, event = "fatal", %instance_id, error = %format!("{e:#}"), "service failed");
            ExitCode::FAILURE
        }
    }
}
