use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let passed = text_tester_cli::cli::app::run().await?;
    if !passed {
        std::process::exit(1);
    }
    Ok(())
}
