//! Tumbless - A terminal Tumblr photo feed viewer with image support.
//!
//! # Usage
//!
//! ```bash
//! tumbless
//! tumbless staff
//! tumbless --no-images humansofnewyork
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use tumbless::app::App;
use tumbless::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use tumbless::perf;

/// Demo key for the public API; override with --api-key or TUMBLESS_API_KEY.
const DEFAULT_API_KEY: &str = "1zT8CiXGXFcQDyMFG7RtcfGLwTdDjFUJnZzKJaWTmgyK4lKGYk";

/// A terminal Tumblr photo feed viewer with image support
#[derive(Parser, Debug)]
#[command(name = "tumbless", version, about, long_about = None)]
struct Cli {
    /// Blog whose photo feed to view
    #[arg(value_name = "BLOG", default_value = "humansofnewyork")]
    blog: String,

    /// Tumblr API key (defaults to the TUMBLESS_API_KEY env var)
    #[arg(long, value_name = "KEY")]
    api_key: Option<String>,

    /// Disable inline photo rendering (show placeholders only)
    #[arg(long)]
    no_images: bool,

    /// Enable startup performance logging
    #[arg(long)]
    perf: bool,

    /// Write detailed render/photo debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Force image rendering to use half-cell fallback mode
    #[arg(long)]
    force_half_cell: bool,

    /// Save current command-line flags as defaults in .tumblessrc
    #[arg(long)]
    save: bool,

    /// Clear saved defaults in .tumblessrc
    #[arg(long)]
    clear: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("TUMBLESS_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize render debug log {}: {}",
            render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    let api_key = effective
        .api_key
        .clone()
        .or_else(|| std::env::var("TUMBLESS_API_KEY").ok())
        .unwrap_or_else(|| DEFAULT_API_KEY.to_string());

    // Run the application
    let app = App::new(cli.blog, api_key)
        .with_images_enabled(!effective.no_images)
        .with_force_half_cell(effective.force_half_cell);

    app.run().context("Application error")
}
