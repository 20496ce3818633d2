//! # MCIS
//!
//! Real-time motion cueing service: ingests simulator telemetry, runs it
//! through the washout filter pipeline, and drives a motion base through
//! its engagement session over UDP.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use mcis_core::cli::{confirm_nograv_or_exit, Cli};
use mcis_core::config::MdaConfig;
use mcis_core::ingest::{IngestWorker, LatestTelemetry};
use mcis_core::log::MdaLog;
use mcis_core::mb_reply::MbReplyWorker;
use mcis_core::mb_sender;
use mcis_core::session::{MbReplyState, UserIntents};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    if cli.no_gravity {
        confirm_nograv_or_exit();
    }

    info!(config = %cli.config.display(), "loading MDA configuration");
    let mda_config = match MdaConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load MDA configuration, aborting");
            std::process::exit(1);
        }
    };

    let mb_addr: std::net::SocketAddr = match cli.mb_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(error = %e, addr = %cli.mb_addr, "invalid --mb-addr");
            std::process::exit(1);
        }
    };

    let mb_socket = match mb_sender::connect(std::net::SocketAddr::from(([0, 0, 0, 0], 0)), mb_addr) {
        Ok(socket) => socket,
        Err(e) => {
            error!(error = %e, "failed to connect MB command socket, aborting");
            std::process::exit(1);
        }
    };

    let log = match MdaLog::create(&cli.log_path) {
        Ok(log) => log,
        Err(e) => {
            error!(error = %e, path = %cli.log_path.display(), "failed to open MDA log, aborting");
            std::process::exit(1);
        }
    };

    let telemetry = Arc::new(LatestTelemetry::new());
    // Operator intents (engage/ready/park/reset) are exposed through
    // `UserIntents`'s atomics for a control surface to set — no terminal UI
    // is wired up here, curses-based operator UI being out of scope.
    let intents = Arc::new(UserIntents::new());
    let reply_state = Arc::new(MbReplyState::new());
    let continue_operation = Arc::new(AtomicBool::new(true));

    let mut ingest_worker = match IngestWorker::spawn(cli.sim_port, Arc::clone(&telemetry)) {
        Ok(worker) => worker,
        Err(e) => {
            error!(error = %e, "failed to start simulator ingest, aborting");
            std::process::exit(1);
        }
    };

    let mut reply_worker = match MbReplyWorker::spawn(&mb_socket, Arc::clone(&reply_state)) {
        Ok(worker) => worker,
        Err(e) => {
            error!(error = %e, "failed to start MB reply receiver, aborting");
            std::process::exit(1);
        }
    };

    install_shutdown_handler(Arc::clone(&continue_operation));

    let sender_config = mb_sender::SenderConfig {
        subtract_gravity: !cli.no_gravity,
        fault2_policy: cli.fault2_policy,
        rt_cpu: cli.rt_cpu,
        rt_priority: cli.rt_priority,
    };

    info!(
        mb_addr = %mb_addr,
        sim_port = cli.sim_port,
        fault2_policy = ?cli.fault2_policy,
        "entering send-loop"
    );
    mb_sender::run(
        &mb_socket,
        &mda_config,
        &sender_config,
        telemetry,
        intents,
        reply_state,
        log,
        continue_operation,
    );

    info!("shutting down");
    let _ = reply_worker.stop();
    let _ = ingest_worker.stop();
}

fn install_shutdown_handler(continue_operation: Arc<AtomicBool>) {
    let result = ctrlc_fallback(move || {
        continue_operation.store(false, Ordering::Release);
    });
    if let Err(e) = result {
        tracing::warn!(error = %e, "failed to install shutdown signal handler");
    }
}

/// Installs a `SIGINT`/`SIGTERM` handler via `nix` when built with signal
/// support, otherwise a no-op (the process can still be killed, just not
/// gracefully drained).
#[cfg(feature = "rt")]
fn ctrlc_fallback(on_signal: impl Fn() + Send + Sync + 'static) -> Result<(), std::io::Error> {
    use nix::sys::signal;
    static HANDLER: std::sync::OnceLock<Box<dyn Fn() + Send + Sync>> = std::sync::OnceLock::new();
    let _ = HANDLER.set(Box::new(on_signal));

    extern "C" fn handle(_: i32) {
        if let Some(f) = HANDLER.get() {
            f();
        }
    }

    unsafe {
        let action = signal::SigAction::new(
            signal::SigHandler::Handler(handle),
            signal::SaFlags::empty(),
            signal::SigSet::empty(),
        );
        signal::sigaction(signal::Signal::SIGINT, &action)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        signal::sigaction(signal::Signal::SIGTERM, &action)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn ctrlc_fallback(_on_signal: impl Fn() + Send + Sync + 'static) -> Result<(), std::io::Error> {
    Ok(())
}
