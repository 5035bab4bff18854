use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rsqa-processor")]
#[command(about = "Reconciles RSQA station and measurement sources into a Parquet catalog")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Only log warnings and errors, hide progress"
    )]
    pub quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract, reconcile and load both sources
    Process {
        #[arg(long, help = "Station registry CSV")]
        registry: Option<PathBuf>,

        #[arg(long, help = "Hourly measurement CSV")]
        measurements: Option<PathBuf>,

        #[arg(short, long, help = "Directory receiving the Parquet tables")]
        output_dir: Option<PathBuf>,

        #[arg(short, long, help = "snappy, gzip, lz4, zstd or none")]
        compression: Option<String>,

        #[arg(long, help = "TOML configuration file [default: rsqa.toml if present]")]
        config: Option<PathBuf>,

        #[arg(long, default_value = "false")]
        validate_only: bool,

        #[arg(long, help = "Write the run report as JSON")]
        report: Option<PathBuf>,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Display row counts of the tables in an output directory
    Info {
        #[arg(short, long)]
        output_dir: PathBuf,
    },
}
