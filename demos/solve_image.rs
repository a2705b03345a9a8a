//! Example: recognizing an image captcha from a file.
//!
//! Run with: RUCAPTCHA_KEY=... cargo run --example solve_image -- captcha.png

use rucaptcha_client::{Client, Config, Numeric, SendOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for protocol-step output (optional)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let api_key = std::env::var("RUCAPTCHA_KEY")?;
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "captcha.png".to_string());

    let client = Client::new(Config::from_api_key(api_key)?)?;

    // Hint the workers: one word of 4-8 digits
    let options = SendOptions::new()
        .numeric(Numeric::DigitsOnly)
        .min_len(4)
        .max_len(8);

    match client.recognize_file(&path, &options).await {
        Ok(answer) => {
            println!("Solved `{path}`: {answer}");
            if let Some(id) = client.last_captcha_id() {
                println!("Task id was {id}; report with --example balance_and_pingbacks");
            }
        }
        Err(e) => {
            println!("Failed: {e}");
        }
    }

    Ok(())
}
