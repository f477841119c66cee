use airpop_processor::cli::{run, Cli};
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        tracing::error!("pipeline aborted: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
