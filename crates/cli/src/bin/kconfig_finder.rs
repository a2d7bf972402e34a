use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    kconfig_cli::main_entry().await
}
