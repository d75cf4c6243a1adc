use anyhow::Result;
use multichat::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
