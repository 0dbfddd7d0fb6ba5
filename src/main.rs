//! route-autoload
//!
//! Serves routes derived from a directory of route manifests.
//!
//! # Architecture Overview
//!
//! ```text
//!   routes/                ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!   ├─ index.toml   ──────▶│  discovery   │───▶│  translate   │───▶│ specificity  │
//!   ├─ users/[id].toml     │ (glob walk)  │    │ path → route │    │    sort      │
//!   └─ (post)users.toml    └──────────────┘    └──────────────┘    └──────┬───────┘
//!                                                                         │
//!                                                                         ▼
//!                          ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!     Client Request  ────▶│  http server │───▶│   override   │───▶│ axum Router  │
//!                          │ id/trace/    │    │   dispatch   │    │ (registrar)  │
//!                          │ timeout      │    │  (dev mode)  │    └──────────────┘
//!                          └──────────────┘    └──────▲───────┘
//!                                                     │ set()
//!                          ┌──────────────┐    ┌──────┴───────┐
//!     file edits      ────▶│   watcher    │───▶│   change     │
//!                          │  (notify)    │    │   resolver   │
//!                          └──────────────┘    └──────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use route_autoload::config::validation::validate_config;
use route_autoload::config::{load_config, AppConfig, ConfigError};
use route_autoload::lifecycle::{shutdown_signal, Application, Shutdown};
use route_autoload::observability::{logging, metrics};
use route_autoload::{Autoloader, HttpServer, ManifestLoader, ModuleGraph};

#[derive(Parser)]
#[command(name = "route-autoload")]
#[command(about = "Serve HTTP routes derived from a directory of route files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RouteArgs {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing route files
    #[arg(long)]
    routes_dir: Option<PathBuf>,

    /// Prefix prepended to every route
    #[arg(long)]
    prefix: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load routes and serve them
    Serve {
        #[command(flatten)]
        routes: RouteArgs,

        /// Bind address (e.g. 127.0.0.1:3000)
        #[arg(short, long)]
        bind: Option<String>,

        /// Development mode: reload route files on change
        #[arg(long)]
        dev: bool,
    },
    /// Print derived routes in registration order
    Routes {
        #[command(flatten)]
        routes: RouteArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn resolve_config(args: &RouteArgs) -> Result<AppConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = &args.routes_dir {
        config.routes.routes_dir = dir.clone();
    }
    if let Some(prefix) = &args.prefix {
        config.routes.prefix = prefix.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { routes, bind, dev } => {
            let mut config = resolve_config(&routes)?;
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            if dev {
                config.hot_reload.enabled = true;
            }
            validate_config(&config).map_err(ConfigError::Validation)?;
            serve(config).await
        }
        Commands::Routes { routes, json } => {
            let config = resolve_config(&routes)?;
            validate_config(&config).map_err(ConfigError::Validation)?;
            print_routes(config, json)
        }
    }
}

async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    logging::init(&config.observability.log_level);

    tracing::info!(
        routes_dir = %config.routes.routes_dir.display(),
        prefix = %config.routes.prefix,
        dev = config.hot_reload.enabled,
        "route-autoload v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let graph = Arc::new(ModuleGraph::new());
    let loader = Arc::new(ManifestLoader::new(graph.clone()));

    let app = match Application::build(&config, loader, graph).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load routes");
            return Err(e.into());
        }
    };
    for skipped in &app.report.skipped {
        tracing::warn!(
            file = %skipped.path.display(),
            reason = skipped.reason.label(),
            "Route file skipped"
        );
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let reload_task = app.start_hot_reload(&shutdown)?;

    let signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal.trigger();
    });

    let server = HttpServer::new(app.router, &config.server);
    let result = server.run(listener, shutdown.subscribe()).await;
    // Stops the reload task when the server exits on its own.
    shutdown.trigger();
    if let Some(task) = reload_task {
        let _ = task.await;
    }
    result?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_routes(config: AppConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let graph = Arc::new(ModuleGraph::new());
    let autoloader = Autoloader::new(config.routes, Arc::new(ManifestLoader::new(graph)));
    let table = autoloader.discover()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    println!("{:<8} {:<40} FILE", "METHOD", "PATTERN");
    for file in &table.files {
        println!(
            "{:<8} {:<40} {}",
            file.method.to_ascii_uppercase(),
            file.pattern.to_string(),
            file.path
        );
    }
    Ok(())
}
