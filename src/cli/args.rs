use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "airpop-processor")]
#[command(about = "French municipal air-quality / population linkage pipeline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the whole pipeline: every stage writes its checkpoint CSV before
    /// the next one starts
    Run {
        #[arg(short, long, default_value = "données", help = "Directory holding the source CSV files")]
        data_dir: PathBuf,

        #[arg(
            short,
            long,
            help = "Directory for checkpoint and final CSVs [default: the data directory]"
        )]
        output_dir: Option<PathBuf>,

        #[arg(long, default_value = "false", help = "Disable progress spinners")]
        quiet: bool,
    },

    /// Load and schema-check every input file without writing any output
    Validate {
        #[arg(short, long, default_value = "données", help = "Directory holding the source CSV files")]
        data_dir: PathBuf,
    },
}
