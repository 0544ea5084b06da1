use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rosetta-robot")]
#[command(version)]
#[command(about = "Upload source files to RosettaCode.org", long_about = None)]
pub struct Cli {
    /// YAML configuration file (default: ./rosetta-robot.yaml if present).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only print what would have happened.
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Be very, very quiet.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Be very, very unquiet.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare local entries with the wiki.
    Check {
        /// Also write the report to this file.
        #[arg(long, value_name = "FILE")]
        out_file: Option<PathBuf>,

        /// Only report task URLs; do not contact the wiki.
        #[arg(long)]
        offline: bool,

        #[arg(required = true, value_name = "SRC_FILE")]
        files: Vec<PathBuf>,
    },
    /// Print the wiki markup for each entry.
    Markup {
        #[arg(required = true, value_name = "SRC_FILE")]
        files: Vec<PathBuf>,
    },
    /// Replace each entry's section on its task page.
    Upload {
        #[arg(required = true, value_name = "SRC_FILE")]
        files: Vec<PathBuf>,
    },
}

impl Cli {
    /// Filter used when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}
