use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    deck_cli::run_cli().await
}
