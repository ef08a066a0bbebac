//! catalog-export CLI
//!
//! Command-line interface for exporting a paged catalog

use catalog_export::cli::{Cli, Runner, SuspendingWriter};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let filter = cli.log_filter();
    let runner = Runner::new(cli);

    // Logs share stderr with the progress bar
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(SuspendingWriter::new(runner.progress_bar(), std::io::stderr))
        .init();

    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
