//! # rucaptcha-client
//!
//! An async Rust client for the rucaptcha/2captcha image recognition
//! service.
//!
//! ## Features
//!
//! - **Submit-and-poll workflow**: one call submits the task, a paced loop
//!   polls until the answer arrives or the configured wait window runs out.
//! - **Multiple Captcha Types**: plain images, recaptcha v2/v3 and
//!   keycaptcha challenges, with bulk polling across outstanding tasks.
//! - **Typed errors**: service-reported failures, timeouts, and transport
//!   problems are distinct error kinds a caller can branch on.
//! - **Pluggable transport**: the HTTP layer sits behind a small trait;
//!   the bundled implementation is built on `rquest` with proxy support.
//! - **Async/Await**: built on Tokio; the poll loop's sleep is the only
//!   suspension point and cancels with the future.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rucaptcha_client::{Client, Config, SendOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::new(Config::from_api_key("your-api-key")?)?;
//!
//!     let answer = client.recognize_file("captcha.png", &SendOptions::new()).await?;
//!     println!("solved: {answer}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Recaptcha
//!
//! ```ignore
//! use rucaptcha_client::{Client, Config, SendOptions};
//!
//! let client = Client::new(Config::from_api_key("your-api-key")?)?;
//! let token = client
//!     .recognize_recaptcha_v2("site-key", "https://example.com/login", &SendOptions::new())
//!     .await?;
//! ```
//!
//! ## Logging
//!
//! Every protocol step emits a `tracing` event. The library never installs
//! a subscriber; without one the events are dropped, which keeps the
//! logging boundary purely observational. Install `tracing-subscriber` in
//! the binary to see the protocol flow.

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod protocol;
pub mod transport;

// Re-exports for convenience
pub use client::{CaptchaClient, Client, ClientBuilder};
pub use config::{Config, ConfigBuilder};
pub use error::{Result, RucaptchaError};
pub use models::{
    JsonPollResponse, KeyCaptchaSession, Numeric, PollResult, SendOptions, SolvedCaptcha,
};
pub use transport::{HttpTransport, HttpTransportBuilder, Transport};
