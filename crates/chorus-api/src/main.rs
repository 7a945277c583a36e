//! Chorus CLI and REST API entry point.
//!
//! Binary name: `chorus`
//!
//! Parses CLI arguments, sets up tracing, wires the provider registry and
//! session, then dispatches to the command handler or starts the REST API
//! server.

mod cli;
mod http;
mod state;

use std::path::PathBuf;

use clap::Parser;
use clap_complete::generate;

use chorus_infra::config::{load_global_config, resolve_data_dir};
use chorus_types::config::GlobalConfig;

use cli::run::RunArgs;
use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions need neither config nor tracing
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "chorus", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    let config = load_global_config(&data_dir).await;

    // Set up tracing based on verbosity; RUST_LOG wins when set
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,chorus=debug",
        _ => "trace",
    };
    if let Err(e) = chorus_observe::tracing_setup::init_tracing(filter, config.otel) {
        eprintln!("failed to initialize tracing: {e}");
    }

    let result = dispatch(cli, config, data_dir).await;
    chorus_observe::tracing_setup::shutdown_tracing();
    result
}

async fn dispatch(cli: Cli, config: GlobalConfig, data_dir: PathBuf) -> anyhow::Result<()> {
    match cli.command {
        Commands::Models => cli::models::list_models(&config, cli.json)?,

        Commands::Run {
            roster,
            iterations,
            initial_message,
            more,
        } => {
            let state = AppState::init(config, data_dir)?;
            let args = RunArgs {
                roster: &roster,
                iterations,
                initial_message,
                more,
            };
            cli::run::run(&state, args, cli.json, cli.quiet).await?;
        }

        Commands::Serve { port, host } => {
            let state = AppState::init(config, data_dir)?;
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Chorus API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!(
                "  {}",
                console::style(format!("Config from {}", state.data_dir.display())).dim()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
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
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
