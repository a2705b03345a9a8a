//! Example: submitting several captchas, then polling them in one request.
//!
//! Run with: RUCAPTCHA_KEY=... cargo run --example bulk_poll -- a.png b.png

use rucaptcha_client::{Client, Config, PollResult, SendOptions};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let api_key = std::env::var("RUCAPTCHA_KEY")?;
    let client = Client::new(Config::from_api_key(api_key)?)?;

    let mut task_ids = Vec::new();
    for path in std::env::args().skip(1) {
        let content = tokio::fs::read(&path).await?;
        let id = client.send_captcha(&content, &SendOptions::new()).await?;
        println!("{path} -> task {id}");
        task_ids.push(id);
    }

    // One request covers every outstanding task.
    loop {
        tokio::time::sleep(Duration::from_secs(5)).await;

        let results = client.get_captcha_result_bulk(&task_ids).await?;

        if results.iter().any(|(_, result)| result.is_pending()) {
            println!("still pending...");
            continue;
        }

        for (id, result) in results {
            match result {
                PollResult::Solved(text) => println!("task {id}: {text}"),
                PollResult::Pending => unreachable!(),
            }
        }
        break;
    }

    Ok(())
}
