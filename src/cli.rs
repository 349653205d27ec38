// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

use strofi::output::OutputMode;

#[derive(Parser)]
#[command(name = "strofi")]
#[command(about = "Release-based deployment with atomic symlink cutover")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output for CI
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit JSON lines instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new strofi.yml configuration file
    Init {
        /// App name to seed the config with
        #[arg(long)]
        app: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Deploy a new release to configured targets
    Deploy {
        /// Target destination (defined in config)
        #[arg(short, long)]
        destination: Option<String>,

        /// Break an existing deploy lock
        #[arg(long)]
        force: bool,

        /// Skip interactive confirmation prompts
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Roll back to the previous release
    Rollback {
        /// Target destination (defined in config)
        #[arg(short, long)]
        destination: Option<String>,
    },

    /// List releases on each target
    Releases {
        /// Target destination (defined in config)
        #[arg(short, long)]
        destination: Option<String>,
    },
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}
