#[tokio::main]
async fn main() -> ghbot::error::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("ghbot=info,serenity=warn"),
    )
    .init();
    log::info!("Starting ghbot Discord bot");

    match ghbot::run().await {
        Ok(()) => {
            log::info!("Bot shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Bot encountered an error: {e}");
            Err(e)
        }
    }
}
