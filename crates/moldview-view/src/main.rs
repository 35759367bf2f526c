use anyhow::Result;
use clap::Parser;
use moldview_view::ViewerConfig;

mod cli;
#[cfg(feature = "gui")]
mod gui;
mod headless;

fn main() -> Result<()> {
    init_tracing();
    let args = cli::CliArgs::parse();
    let mut config = ViewerConfig::load_or_default(args.config.as_deref())?;
    match args.mode {
        Some(cli::Mode::Headless { command }) => headless::run_headless(command, &config),
        None => {
            if let Some(model) = args.model {
                config.asset_path = model;
            }
            run_gui(config)
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(feature = "gui")]
fn run_gui(config: ViewerConfig) -> Result<()> {
    gui::run_gui(config)
}

#[cfg(not(feature = "gui"))]
fn run_gui(_config: ViewerConfig) -> Result<()> {
    anyhow::bail!("GUI support disabled. Rebuild with --features gui.");
}
