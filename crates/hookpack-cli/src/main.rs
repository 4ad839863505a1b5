// Hookpack CLI entry point

use clap::Parser;
use hookpack_cli::{output, router, Cli};
use tracing::Level;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    if let Err(err) = router::run(cli).await {
        output::print_error(&err.user_message());
        std::process::exit(1);
    }
}
