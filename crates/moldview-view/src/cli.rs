use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "moldview")]
#[command(about = "Mold part viewer with dimension and demolding overlays")]
pub struct CliArgs {
    /// JSON viewer settings.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Model to open instead of the configured asset.
    pub model: Option<PathBuf>,
    #[command(subcommand)]
    pub mode: Option<Mode>,
}

#[derive(Subcommand)]
pub enum Mode {
    Headless {
        #[command(subcommand)]
        command: HeadlessCommand,
    },
}

#[derive(Subcommand)]
pub enum HeadlessCommand {
    /// Load a model without a window and report what the viewport would show.
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    #[arg(long = "in")]
    pub input: PathBuf,
    #[arg(long)]
    pub unit: Option<String>,
    #[arg(long, default_value = "perspective")]
    pub camera: String,
    #[arg(long, default_value = "front")]
    pub view: String,
    #[arg(long, default_value = "z")]
    pub axis: String,
    #[arg(long, default_value_t = 1280)]
    pub width: u32,
    #[arg(long, default_value_t = 800)]
    pub height: u32,
    #[arg(long, default_value_t = 3)]
    pub frames: u32,
    /// Seconds to wait for the load.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}
