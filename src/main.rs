use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    dogonomics::app_init().await?;
    dogonomics::run().await
}
