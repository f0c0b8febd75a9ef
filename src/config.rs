use crate::attr::Mechanism;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Attribute mechanism (auto picks the platform's native one)
    #[arg(long, value_enum, default_value_t = MechanismChoice::Auto, global = true)]
    pub mechanism: MechanismChoice,

    /// Helper program for the command mechanism (default: attr, or xattr on macOS)
    #[arg(long, value_name = "PROGRAM", global = true, env = "SYNCSKIPPER_HELPER")]
    pub helper: Option<PathBuf>,

    /// Do not show the progress spinner while scanning
    #[arg(long, default_value_t = false, global = true)]
    pub no_progress: bool,

    /// Suppress non-error messages
    #[arg(short, long, default_value_t = false, global = true)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, default_value_t = false, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List entries named after a keyword and whether they are ignored
    Scan {
        #[command(flatten)]
        target: ScanTarget,

        /// Print matches as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Scan, then mark every match as ignored by Dropbox
    Ignore {
        #[command(flatten)]
        target: ScanTarget,

        #[command(flatten)]
        batch: BatchOptions,
    },

    /// Scan, then remove the ignored marker from every match
    Unignore {
        #[command(flatten)]
        target: ScanTarget,

        #[command(flatten)]
        batch: BatchOptions,
    },

    /// Mark the given paths as ignored
    Set {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },

    /// Remove the ignored marker from the given paths
    Clear {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },

    /// Show whether each path is ignored
    Status {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ScanTarget {
    /// Dropbox folder (or any folder inside it) to search
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Folder or file names to look for, separated by ";"
    #[arg(short, long, value_name = "NAMES")]
    pub keywords: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct BatchOptions {
    /// Also touch matches already in the requested state
    #[arg(long, default_value_t = false)]
    pub all: bool,

    /// Print what would change without touching anything
    #[arg(short = 'n', long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MechanismChoice {
    Auto,
    Stream,
    Metadata,
    Command,
}

impl MechanismChoice {
    pub fn resolve(self) -> Mechanism {
        match self {
            MechanismChoice::Auto => Mechanism::platform_default(),
            MechanismChoice::Stream => Mechanism::Stream,
            MechanismChoice::Metadata => Mechanism::Metadata,
            MechanismChoice::Command => Mechanism::Command,
        }
    }
}
