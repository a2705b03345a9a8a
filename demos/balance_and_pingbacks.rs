//! Example: account balance and pingback allow-list management.
//!
//! Run with: RUCAPTCHA_KEY=... cargo run --example balance_and_pingbacks

use rucaptcha_client::{Client, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let api_key = std::env::var("RUCAPTCHA_KEY")?;
    let client = Client::new(Config::from_api_key(api_key)?)?;

    println!("Balance: {}", client.get_balance().await?);

    let pingback = "http://example.com/captcha/hook";
    client.add_pingback(pingback).await?;
    println!("Registered pingback {pingback}");

    for url in client.get_pingbacks().await? {
        println!("  allow-listed: {url}");
    }

    client.delete_pingback(pingback).await?;
    println!("Removed it again");

    Ok(())
}
