use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod catalog;
mod config;
mod error;
mod filter;
mod loader;
mod preview;
mod render;
mod rig;
mod scene;
mod server;
mod thumbnails;
mod ui;

use catalog::local::LocalCatalog;
use config::{Cli, Config};
use server::idle::IdleTimer;
use server::AppState;
use ui::ModelBrowser;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let stdin = config::read_stdin();
    let config = Config::from_cli(cli, stdin.as_deref());

    let catalog = LocalCatalog::build(&config.source)?;

    // The server gets its own runtime; the viewer window runs on iced's
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let listener = runtime.block_on(server::bind(config.port))?;
    let url = config.view.viewer_url(listener.local_addr()?)?;

    let state = AppState {
        catalog: Arc::new(catalog),
        cors: Arc::new(config.cors.clone()),
        idle: IdleTimer::from_minutes(config.timeout_minutes),
    };

    if !config.open {
        info!("🌍 Model browser running at {}", url);
        runtime.block_on(server::run(listener, state))?;
        return Ok(());
    }

    info!("🌍 Opening model browser at {}", url);
    std::thread::spawn(move || {
        if let Err(e) = runtime.block_on(server::run(listener, state)) {
            error!("❌ Server failed: {}", e);
            std::process::exit(1);
        }
        // Idle timeout: take the window down with the server
        std::process::exit(0);
    });

    iced::application("model-browser", ModelBrowser::update, ModelBrowser::view)
        .subscription(ModelBrowser::subscription)
        .theme(ModelBrowser::theme)
        .window_size(ui::WINDOW_SIZE)
        .centered()
        .run_with(move || ModelBrowser::new(url))?;

    Ok(())
}
