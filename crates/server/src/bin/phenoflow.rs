use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    phenoflow_server::main_entry().await
}
