//! `folio` entry point.

use clap::Parser;
use folio_cli::{EXIT_FAILURE, FolioCli};

#[tokio::main]
async fn main() {
    let cli = match FolioCli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also arrive here, on stdout.
            let code = if err.use_stderr() { EXIT_FAILURE } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    let default_level = if cli.global.verbose {
        "warn,folio_store=debug,folio_cli=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(cli.run().await);
}
