//! Posts the dummy settlement through the configured sink (Discord, or the log
//! sink with NOTIFY_DRY_RUN=1) to check the channel wiring.

use settlement_watch::{notify, WatchConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = WatchConfig::load()?;
    let sink = notify::from_config(&cfg)?;
    sink.emit(&notify::test_record()).await?;

    println!("notify-demo done ({})", sink.name());
    Ok(())
}
