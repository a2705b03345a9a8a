//! Example: solving a recaptcha v2 challenge by site key and page URL.
//!
//! Run with: RUCAPTCHA_KEY=... cargo run --example recaptcha_v2

use rucaptcha_client::{Client, Config, SendOptions};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let api_key = std::env::var("RUCAPTCHA_KEY")?;

    // Recaptcha tasks take workers a while; widen the wait window.
    let config = Config::builder(api_key)
        .max_wait(Duration::from_secs(300))
        .build()?;
    let client = Client::new(config)?;

    let token = client
        .recognize_recaptcha_v2(
            "6Le-wvkSAAAAAPBMRTvw0Q4Muexq9bi0DJwx_mJ-",
            "https://www.google.com/recaptcha/api2/demo",
            &SendOptions::new(),
        )
        .await?;

    println!("g-recaptcha-response token:");
    println!("{token}");

    Ok(())
}
