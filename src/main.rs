//! fluxmetrics CLI entry point.

use fluxmetrics::cli::{self, Cli};
use fluxmetrics::core::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli::execute(cli).await
}
