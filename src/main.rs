use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video_processor::cli::{Cli, Commands};
use video_processor::config::Config;
use video_processor::engine::OpenAiEngine;
use video_processor::server::{self, AppState};
use video_processor::{utils, VideoProcessingService, STYLE_CATALOG};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "video_processor=debug"
    } else {
        "video_processor=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    match cli.command {
        Commands::Serve {
            host,
            port,
            openai_api_key,
        } => {
            let mut config = Config::load().await?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(key) = openai_api_key {
                config.engine.openai_api_key = Some(key);
            }

            // Check for required external dependencies (non-fatal in Docker)
            for dep in utils::check_dependencies(&config.engine.yt_dlp_path).await {
                tracing::warn!("Missing dependency: {}", dep);
            }

            let mut service = VideoProcessingService::from_config(config.engine.clone());
            if config.engine.api_key().is_some() {
                let engine = OpenAiEngine::new(&config.engine)?;
                service = service.with_engine(Arc::new(engine));
            } else {
                tracing::warn!("OPENAI_API_KEY is not configured; requests will fail until it is");
            }

            let addr = format!("{}:{}", config.server.host, config.server.port);
            server::serve(AppState::new(service), &addr).await?;
        }
        Commands::Config { show, init } => {
            if init {
                let path = Config::default().save().await?;
                println!("Configuration written to: {}", path.display());
            } else {
                let config = Config::load().await?;
                if !show {
                    println!("Configuration file: {}", Config::config_path()?.display());
                }
                config.display();
            }
        }
        Commands::Styles => {
            println!("Supported styles:");
            for entry in STYLE_CATALOG {
                println!(
                    "  • {} (engine: {}, result: {})",
                    entry.display_name,
                    entry.engine_name,
                    entry.result_key.as_str()
                );
            }
        }
    }

    Ok(())
}
