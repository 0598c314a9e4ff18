use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "revis", version, about = "Inline figures for notebook worksheets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the demo worksheet headlessly and write each figure as PNG
    Render {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "revis-out")]
        out_dir: PathBuf,
        /// Snapshot scale factor, overrides the settings file
        #[arg(long)]
        scale: Option<u32>,
    },
    /// Run the demo worksheet and show its results in a window
    View {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Settings file helpers
    Config {
        /// Write the default settings to this file
        #[arg(long)]
        write: PathBuf,
    },
}
