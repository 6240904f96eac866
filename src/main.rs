#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tuneplan::cli::main().await
}
