//! Gourmet Grill - restaurant site server
//!
//! CLI entry point for serving, publishing snapshots and checking templates.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use gourmetgrill::cli::{Cli, Command};
use gourmetgrill::config::Config;
use gourmetgrill::routes::PAGE_TEMPLATES;
use templatecache::{FsSource, Mode, TemplateCache};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gourmetgrill")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("gourmetgrill.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("Gourmet Grill loaded config: site={} mode={}", config.site.name, config.mode);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None => cmd_serve(&config).await,
        Some(Command::Serve { port, dev }) => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if dev {
                config.mode = Mode::Development;
            }
            cmd_serve(&config).await
        }
        Some(Command::Publish) => cmd_publish(&config),
        Some(Command::Check) => cmd_check(&config),
    }
}

async fn cmd_serve(config: &Config) -> Result<()> {
    debug!(address = %config.server.address(), "cmd_serve: called");
    gourmetgrill::serve(config).await
}

fn cmd_publish(config: &Config) -> Result<()> {
    debug!("cmd_publish: called");
    let snapshot = gourmetgrill::publish(config)?;

    for page in &snapshot.pages {
        println!("{} wrote {}", "✔".green(), page.display());
    }
    if snapshot.static_files > 0 {
        println!("{} copied {} static files", "✔".green(), snapshot.static_files);
    }
    println!("\nSnapshot ready: {}", snapshot.index_url().cyan());
    Ok(())
}

fn cmd_check(config: &Config) -> Result<()> {
    debug!(templates = ?config.paths.templates, "cmd_check: called");
    let source = Arc::new(FsSource::new(&config.paths.templates));
    let cache = TemplateCache::new(source, Mode::Production)
        .context(format!("Failed to load partials from {}", config.paths.templates.display()))?;

    let mut failures = 0;
    for template in PAGE_TEMPLATES {
        match cache.prepare(template) {
            Ok(()) => println!("{} {}", "✓".green(), template),
            Err(e) => {
                failures += 1;
                println!("{} {}: {}", "✗".red(), template, e);
            }
        }
    }

    if failures > 0 {
        return Err(eyre!("{} of {} templates failed to parse", failures, PAGE_TEMPLATES.len()));
    }
    Ok(())
}
