//! spinup server-startup orchestrator binary.
//!
//! The same binary serves three roles: standalone listener, supervising
//! master, and supervised worker (selected by a hidden flag the master
//! passes when re-executing itself).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use spinup::cluster::worker::{report, WorkerMessage};
use spinup::cluster::{Supervisor, WorkerLauncher};
use spinup::config::{load_settings, Settings};
use spinup::error::BootstrapError;
use spinup::lifecycle::Shutdown;
use spinup::net::EchoHandler;
use spinup::topology::{self, ProcessRole, StartupAction};

#[derive(Debug, Parser)]
#[command(name = "spinup", version, about = "Server startup orchestrator")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run as a supervised worker process. Set by the master, not by hand.
    #[arg(long, hide = true)]
    worker: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    spinup::observability::logging::init("spinup=info");

    let settings = match cli.config {
        Some(ref path) => match load_settings(path) {
            Ok(settings) => settings,
            Err(error) => {
                tracing::error!(path = %path.display(), error = %error, "Failed to load configuration");
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };
    let server = settings.server;

    tracing::info!(
        address = %server.address,
        port = server.port,
        max_port = server.effective_max_port(),
        cluster_enabled = server.cluster_enabled,
        secure = ?server.secure,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let role = if cli.worker {
        ProcessRole::Worker
    } else {
        ProcessRole::Master
    };

    match topology::select(&server, role) {
        StartupAction::RunAsSupervisor => {
            let launcher = match WorkerLauncher::from_current_exe(cli.config.as_deref()) {
                Ok(launcher) => launcher,
                Err(error) => {
                    tracing::error!(error = %error, "Cannot build worker launcher");
                    return ExitCode::FAILURE;
                }
            };
            tracing::info!(worker_count = server.worker_count, "Running as supervisor");

            let supervisor = Supervisor::new(launcher, server.worker_count, shutdown);
            match supervisor.run().await {
                Ok(()) => ExitCode::SUCCESS,
                Err(error) => {
                    tracing::error!(error = %error, "Supervisor failed");
                    ExitCode::FAILURE
                }
            }
        }
        StartupAction::RunAsListener => {
            let worker_mode = cli.worker;
            if worker_mode {
                if let Err(error) = report(&WorkerMessage::Online) {
                    tracing::error!(error = %error, "Lost the lifecycle pipe");
                }
            }

            let failed = Arc::new(AtomicBool::new(false));
            let completion = {
                let failed = failed.clone();
                Box::new(move |outcome: Result<SocketAddr, BootstrapError>| match outcome {
                    Ok(addr) => {
                        tracing::info!(address = %addr, "Listening for connections");
                        if worker_mode {
                            let message = WorkerMessage::Listening {
                                address: addr.ip().to_string(),
                                port: addr.port(),
                            };
                            if let Err(error) = report(&message) {
                                tracing::error!(error = %error, "Lost the lifecycle pipe");
                            }
                        }
                    }
                    Err(error) => {
                        tracing::error!(error = %error, cause = error.as_label(), "Startup failed");
                        failed.store(true, Ordering::SeqCst);
                    }
                })
            };

            spinup::net::serve(&server, EchoHandler, &shutdown, completion).await;

            if failed.load(Ordering::SeqCst) {
                ExitCode::FAILURE
            } else {
                tracing::info!("Shutdown complete");
                ExitCode::SUCCESS
            }
        }
    }
}

/// Translate Ctrl+C into the shutdown signal.
fn spawn_signal_listener(shutdown: Shutdown) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown.trigger();
        }
    });
}
