//! Client for the recognition service.
//!
//! [`Client`] owns the whole submit-then-poll protocol: one HTTP call to
//! submit a task, a paced loop of one-call polls until the answer arrives
//! or the configured wait window runs out. The base protocol is also
//! exposed through the [`CaptchaClient`] trait so callers can swap in their
//! own implementation behind the same capability.

use crate::catalog;
use crate::config::Config;
use crate::error::{Result, RucaptchaError};
use crate::models::{KeyCaptchaSession, PollResult, SendOptions, SolvedCaptcha};
use crate::protocol;
use crate::transport::{HttpTransport, Transport};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Base recognition capability: submit, poll, and the combined
/// submit-then-poll operation.
///
/// [`Client`] implements this; tests and embedders can provide their own
/// implementation and compose extended behavior on top of it.
#[async_trait]
pub trait CaptchaClient: Send + Sync {
    /// Submit raw image bytes for recognition. Returns the task id.
    async fn send_captcha(&self, content: &[u8], options: &SendOptions) -> Result<String>;

    /// Check a task once. Exactly one round trip, no retry.
    async fn get_captcha_result(&self, captcha_id: &str) -> Result<PollResult>;

    /// Submit and poll to completion or timeout. Returns the answer text.
    async fn recognize(&self, content: &[u8], options: &SendOptions) -> Result<String>;
}

/// Builder for [`Client`], allowing transport injection.
pub struct ClientBuilder {
    config: Config,
    transport: Option<Box<dyn Transport>>,
}

impl ClientBuilder {
    /// Create a builder from a finished configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    /// Inject a custom [`Transport`]. Defaults to [`HttpTransport`].
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client> {
        let transport: Box<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Box::new(HttpTransport::new()?),
        };

        Ok(Client {
            config: self.config,
            transport,
            last_captcha_id: Mutex::new(None),
        })
    }
}

/// Recognition service client.
///
/// # Example
/// ```ignore
/// use rucaptcha_client::{Client, Config, SendOptions};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = Client::new(Config::from_api_key("your-api-key")?)?;
///     let image = tokio::fs::read("captcha.png").await?;
///     let answer = client.recognize(&image, &SendOptions::new()).await?;
///     println!("solved: {answer}");
///     Ok(())
/// }
/// ```
pub struct Client {
    config: Config,
    transport: Box<dyn Transport>,
    /// Last successfully issued task id, kept for diagnostics only.
    /// Last-write-wins; not a ledger of outstanding tasks.
    last_captcha_id: Mutex<Option<String>>,
}

impl Client {
    /// Create a client with the default HTTP transport.
    pub fn new(config: Config) -> Result<Self> {
        ClientBuilder::new(config).build()
    }

    /// Create a builder for the client.
    pub fn builder(config: Config) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Task id of the most recent successful submission, if any.
    pub fn last_captcha_id(&self) -> Option<String> {
        self.last_id_slot().clone()
    }

    fn last_id_slot(&self) -> MutexGuard<'_, Option<String>> {
        self.last_captcha_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn in_url(&self) -> String {
        format!("{}/in.php", self.config.server_base_uri())
    }

    fn res_url(&self) -> String {
        format!("{}/res.php", self.config.server_base_uri())
    }

    /// Common `res.php` parameters for the given action.
    fn res_params(&self, action: &str) -> Vec<(String, String)> {
        vec![
            ("key".into(), self.config.api_key().to_string()),
            ("action".into(), action.into()),
        ]
    }

    /// Send a submission to `in.php` and extract the issued task id.
    ///
    /// The configured `soft_id` is merged in unless the options already set
    /// one. On success the id is retained as the last issued id.
    async fn submit(
        &self,
        mut params: Vec<(String, String)>,
        options: &SendOptions,
    ) -> Result<String> {
        if let Some(soft_id) = self.config.soft_id() {
            if !options.has_soft_id() {
                params.push(("soft_id".into(), soft_id.to_string()));
            }
        }
        params.extend(options.to_params());

        let body = self.transport.post_form(&self.in_url(), &params).await?;
        let captcha_id = protocol::parse_submit_response(&body)?;

        tracing::info!("Sending success. Got captcha id `{captcha_id}`.");
        *self.last_id_slot() = Some(captcha_id.clone());

        Ok(captcha_id)
    }

    /// The wait half of the recognize state machine.
    ///
    /// Sleeps for `interval` before every poll, including the first, then
    /// checks the elapsed time against `max_wait` before spending another
    /// round trip. The sleep is the only suspension point; dropping the
    /// future cancels the wait.
    async fn wait_for_result(&self, captcha_id: &str, interval: Duration) -> Result<String> {
        let started = Instant::now();

        loop {
            tracing::info!("Waiting {} sec.", interval.as_secs());
            tokio::time::sleep(interval).await;

            let waited = started.elapsed();
            if waited >= self.config.max_wait() {
                return Err(RucaptchaError::Timeout { waited });
            }

            match self.get_captcha_result(captcha_id).await? {
                PollResult::Pending => continue,
                PollResult::Solved(text) => {
                    tracing::info!("Elapsed {} second(s).", waited.as_secs());
                    return Ok(text);
                }
            }
        }
    }

    /// Submit raw image bytes for recognition. Returns the task id.
    pub async fn send_captcha(&self, content: &[u8], options: &SendOptions) -> Result<String> {
        tracing::info!(
            "Trying to send captcha image to {}/in.php",
            self.config.server_base_uri()
        );

        let params = vec![
            ("method".into(), "base64".into()),
            ("key".into(), self.config.api_key().to_string()),
            ("body".into(), BASE64.encode(content)),
        ];

        self.submit(params, options).await
    }

    /// Check a task once over the plain-text protocol.
    pub async fn get_captcha_result(&self, captcha_id: &str) -> Result<PollResult> {
        let mut params = self.res_params("get");
        params.push(("id".into(), captcha_id.to_string()));

        let body = self.transport.get(&self.res_url(), &params).await?;
        let result = protocol::parse_poll_response(&body)?;

        if !result.is_pending() {
            tracing::info!("Got OK response: `{body}`.");
        }

        Ok(result)
    }

    /// Check a task once over the `json=1` protocol used by some
    /// deployments. A malformed body raises a JSON parse error, distinct
    /// from a service-reported failure.
    pub async fn get_captcha_result_json(&self, captcha_id: &str) -> Result<PollResult> {
        let mut params = self.res_params("get");
        params.push(("id".into(), captcha_id.to_string()));
        params.push(("json".into(), "1".into()));

        let body = self.transport.get(&self.res_url(), &params).await?;
        let result = protocol::parse_json_poll_response(&body)?;

        if !result.is_pending() {
            tracing::info!("Got OK response: `{body}`.");
        }

        Ok(result)
    }

    /// Check a task once with the answer's cost (`action=get2`). Returns
    /// `None` while the task is pending.
    pub async fn get_captcha_result_with_cost(
        &self,
        captcha_id: &str,
    ) -> Result<Option<SolvedCaptcha>> {
        let mut params = self.res_params("get2");
        params.push(("id".into(), captcha_id.to_string()));

        let body = self.transport.get(&self.res_url(), &params).await?;
        protocol::parse_with_cost_response(&body)
    }

    /// Check several tasks in one request.
    ///
    /// Returns one entry per submitted id, in submission order, each either
    /// the answer or still pending.
    pub async fn get_captcha_result_bulk(
        &self,
        captcha_ids: &[String],
    ) -> Result<Vec<(String, PollResult)>> {
        let mut params = self.res_params("get");
        params.push(("ids".into(), captcha_ids.join(",")));

        let body = self.transport.get(&self.res_url(), &params).await?;
        tracing::info!("Got bulk response: `{body}`.");

        protocol::parse_bulk_response(captcha_ids, &body)
    }

    /// Recognize an image: submit, then poll every
    /// [`poll_interval`](Config::poll_interval) until the answer arrives or
    /// [`max_wait`](Config::max_wait) runs out.
    pub async fn recognize(&self, content: &[u8], options: &SendOptions) -> Result<String> {
        let captcha_id = self.send_captcha(content, options).await?;
        self.wait_for_result(&captcha_id, self.config.poll_interval())
            .await
    }

    /// Recognize an image loaded from a file.
    ///
    /// A missing file is an invalid argument, detected before any network
    /// call.
    pub async fn recognize_file(
        &self,
        path: impl AsRef<Path>,
        options: &SendOptions,
    ) -> Result<String> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                RucaptchaError::InvalidArgument(format!(
                    "captcha file `{}` not found",
                    path.display()
                ))
            } else {
                RucaptchaError::Io(err)
            }
        })?;

        self.recognize(&content, options).await
    }

    /// Submit a recaptcha v2 task. Returns the task id.
    pub async fn send_recaptcha_v2(
        &self,
        google_key: &str,
        page_url: &str,
        options: &SendOptions,
    ) -> Result<String> {
        tracing::info!(
            "Trying to send recaptcha site key to {}/in.php",
            self.config.server_base_uri()
        );

        let params = vec![
            ("method".into(), "userrecaptcha".into()),
            ("key".into(), self.config.api_key().to_string()),
            ("googlekey".into(), google_key.to_string()),
            ("pageurl".into(), page_url.to_string()),
        ];

        self.submit(params, options).await
    }

    /// Recognize a recaptcha v2 challenge, polling every
    /// [`recaptcha_poll_interval`](Config::recaptcha_poll_interval).
    /// Returns the token to place in the hidden form field.
    pub async fn recognize_recaptcha_v2(
        &self,
        google_key: &str,
        page_url: &str,
        options: &SendOptions,
    ) -> Result<String> {
        let captcha_id = self.send_recaptcha_v2(google_key, page_url, options).await?;
        self.wait_for_result(&captcha_id, self.config.recaptcha_poll_interval())
            .await
    }

    /// Submit a recaptcha v3 task. Returns the task id.
    ///
    /// `action` is the action name the page passes to `grecaptcha.execute`;
    /// `min_score` is the minimum acceptable score (the service suggests
    /// 0.3).
    pub async fn send_recaptcha_v3(
        &self,
        google_key: &str,
        page_url: &str,
        action: &str,
        min_score: f32,
        options: &SendOptions,
    ) -> Result<String> {
        tracing::info!(
            "Trying to send recaptcha v3 site key to {}/in.php",
            self.config.server_base_uri()
        );

        let params = vec![
            ("method".into(), "userrecaptcha".into()),
            ("version".into(), "v3".into()),
            ("key".into(), self.config.api_key().to_string()),
            ("googlekey".into(), google_key.to_string()),
            ("pageurl".into(), page_url.to_string()),
            ("action".into(), action.to_string()),
            ("min_score".into(), min_score.to_string()),
        ];

        self.submit(params, options).await
    }

    /// Recognize a recaptcha v3 challenge, polling every
    /// [`recaptcha_poll_interval`](Config::recaptcha_poll_interval).
    pub async fn recognize_recaptcha_v3(
        &self,
        google_key: &str,
        page_url: &str,
        action: &str,
        min_score: f32,
        options: &SendOptions,
    ) -> Result<String> {
        let captcha_id = self
            .send_recaptcha_v3(google_key, page_url, action, min_score, options)
            .await?;
        self.wait_for_result(&captcha_id, self.config.recaptcha_poll_interval())
            .await
    }

    /// Submit a keycaptcha task. Returns the task id.
    pub async fn send_key_captcha(
        &self,
        session: &KeyCaptchaSession,
        options: &SendOptions,
    ) -> Result<String> {
        tracing::info!(
            "Trying to send keycaptcha session to {}/in.php",
            self.config.server_base_uri()
        );

        let params = vec![
            ("method".into(), "keycaptcha".into()),
            ("key".into(), self.config.api_key().to_string()),
            ("s_s_c_user_id".into(), session.user_id.clone()),
            ("s_s_c_session_id".into(), session.session_id.clone()),
            (
                "s_s_c_web_server_sign".into(),
                session.web_server_sign.clone(),
            ),
            (
                "s_s_c_web_server_sign2".into(),
                session.web_server_sign2.clone(),
            ),
            ("pageurl".into(), session.page_url.clone()),
        ];

        self.submit(params, options).await
    }

    /// Recognize a keycaptcha challenge, polling every
    /// [`recaptcha_poll_interval`](Config::recaptcha_poll_interval).
    /// Returns the code for the `capcode` form input.
    pub async fn recognize_key_captcha(
        &self,
        session: &KeyCaptchaSession,
        options: &SendOptions,
    ) -> Result<String> {
        let captcha_id = self.send_key_captcha(session, options).await?;
        self.wait_for_result(&captcha_id, self.config.recaptcha_poll_interval())
            .await
    }

    /// Current account balance, as the service formats it.
    pub async fn get_balance(&self) -> Result<String> {
        let params = self.res_params("getbalance");
        let body = self.transport.get(&self.res_url(), &params).await?;
        let balance = body.trim();

        if catalog::message_for(balance).is_some() || balance.starts_with("ERROR_") {
            return Err(RucaptchaError::service(balance));
        }

        Ok(balance.to_string())
    }

    /// Report a correct recognition, crediting the worker.
    pub async fn report_good(&self, captcha_id: &str) -> Result<()> {
        self.report("reportgood", captcha_id).await
    }

    /// Report a wrong recognition, refunding the charge.
    pub async fn report_bad(&self, captcha_id: &str) -> Result<()> {
        self.report("reportbad", captcha_id).await
    }

    async fn report(&self, action: &str, captcha_id: &str) -> Result<()> {
        let mut params = self.res_params(action);
        params.push(("id".into(), captcha_id.to_string()));

        let body = self.transport.get(&self.res_url(), &params).await?;

        if body == protocol::STATUS_OK_REPORT_RECORDED {
            return Ok(());
        }

        Err(RucaptchaError::service(&body))
    }

    /// Add a URL to the pingback allow-list.
    pub async fn add_pingback(&self, url: &str) -> Result<()> {
        let mut params = self.res_params("add_pingback");
        params.push(("addr".into(), url.to_string()));

        let body = self.transport.get(&self.res_url(), &params).await?;

        if body == protocol::STATUS_OK {
            return Ok(());
        }

        Err(RucaptchaError::service(&body))
    }

    /// List the URLs currently on the pingback allow-list.
    pub async fn get_pingbacks(&self) -> Result<Vec<String>> {
        let params = self.res_params("get_pingback");
        let body = self.transport.get(&self.res_url(), &params).await?;
        protocol::parse_pingback_list(&body)
    }

    /// Remove a URL from the pingback allow-list.
    pub async fn delete_pingback(&self, url: &str) -> Result<()> {
        let mut params = self.res_params("del_pingback");
        params.push(("addr".into(), url.to_string()));

        let body = self.transport.get(&self.res_url(), &params).await?;

        if body == protocol::STATUS_OK {
            return Ok(());
        }

        Err(RucaptchaError::service(&body))
    }

    /// Clear the pingback allow-list.
    pub async fn delete_all_pingbacks(&self) -> Result<()> {
        self.delete_pingback("all").await
    }

    /// Fetch the service load report, an XML document returned verbatim.
    pub async fn get_load(&self) -> Result<String> {
        let url = format!("{}/load.php", self.config.server_base_uri());
        self.transport.get(&url, &[]).await
    }
}

#[async_trait]
impl CaptchaClient for Client {
    async fn send_captcha(&self, content: &[u8], options: &SendOptions) -> Result<String> {
        Client::send_captcha(self, content, options).await
    }

    async fn get_captcha_result(&self, captcha_id: &str) -> Result<PollResult> {
        Client::get_captcha_result(self, captcha_id).await
    }

    async fn recognize(&self, content: &[u8], options: &SendOptions) -> Result<String> {
        Client::recognize(self, content, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// Transport that answers from a script and records every request.
    struct ScriptedTransport {
        responses: StdMutex<Vec<String>>,
        requests: StdMutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl ScriptedTransport {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: StdMutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
                requests: StdMutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &str, params: &[(String, String)]) -> Result<String> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), params.to_vec()));
            Ok(self.responses.lock().unwrap().pop().expect("script ran dry"))
        }

        async fn post_form(&self, url: &str, params: &[(String, String)]) -> Result<String> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), params.to_vec()));
            Ok(self.responses.lock().unwrap().pop().expect("script ran dry"))
        }
    }

    fn client_with(responses: &[&str]) -> (Client, std::sync::Arc<ScriptedTransport>) {
        let transport = std::sync::Arc::new(ScriptedTransport::new(responses));
        let client = Client::builder(Config::from_api_key("test-key").unwrap())
            .transport(SharedTransport(transport.clone()))
            .build()
            .unwrap();
        (client, transport)
    }

    /// Arc adapter so the test keeps a handle on the recorded requests.
    struct SharedTransport(std::sync::Arc<ScriptedTransport>);

    #[async_trait]
    impl Transport for SharedTransport {
        async fn get(&self, url: &str, params: &[(String, String)]) -> Result<String> {
            self.0.get(url, params).await
        }

        async fn post_form(&self, url: &str, params: &[(String, String)]) -> Result<String> {
            self.0.post_form(url, params).await
        }
    }

    #[test]
    fn test_no_last_id_before_first_submission() {
        let (client, _) = client_with(&[]);
        assert_eq!(client.last_captcha_id(), None);
    }

    #[tokio::test]
    async fn test_send_captcha_posts_base64_payload() {
        let (client, transport) = client_with(&["OK|31"]);

        let id = client
            .send_captcha(b"image-bytes", &SendOptions::new())
            .await
            .unwrap();
        assert_eq!(id, "31");
        assert_eq!(client.last_captcha_id(), Some("31".to_string()));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let (url, params) = &requests[0];
        assert_eq!(url, "http://rucaptcha.com/in.php");
        assert!(params.contains(&("method".into(), "base64".into())));
        assert!(params.contains(&("key".into(), "test-key".into())));
        assert!(params.contains(&("body".into(), BASE64.encode(b"image-bytes"))));
    }

    #[tokio::test]
    async fn test_configured_soft_id_merged_unless_overridden() {
        let transport = std::sync::Arc::new(ScriptedTransport::new(&["OK|1", "OK|2"]));
        let config = Config::builder("test-key").soft_id("4242").build().unwrap();
        let client = Client::builder(config)
            .transport(SharedTransport(transport.clone()))
            .build()
            .unwrap();

        client
            .send_captcha(b"x", &SendOptions::new())
            .await
            .unwrap();
        client
            .send_captcha(b"x", &SendOptions::new().soft_id("9000"))
            .await
            .unwrap();

        let requests = transport.requests();
        assert!(requests[0].1.contains(&("soft_id".into(), "4242".into())));
        assert!(requests[1].1.contains(&("soft_id".into(), "9000".into())));
        assert!(!requests[1].1.contains(&("soft_id".into(), "4242".into())));
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_last_id_unset() {
        let (client, _) = client_with(&["ERROR_ZERO_BALANCE"]);

        let err = client
            .send_captcha(b"x", &SendOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RucaptchaError::Service { .. }));
        assert_eq!(client.last_captcha_id(), None);
    }

    #[tokio::test]
    async fn test_report_expects_literal_token() {
        let (client, transport) = client_with(&["OK_REPORT_RECORDED", "ERROR_WRONG_CAPTCHA_ID"]);

        client.report_good("55").await.unwrap();
        let err = client.report_bad("55").await.unwrap_err();
        assert!(matches!(err, RucaptchaError::Service { .. }));

        let requests = transport.requests();
        assert!(requests[0].1.contains(&("action".into(), "reportgood".into())));
        assert!(requests[1].1.contains(&("action".into(), "reportbad".into())));
    }

    #[tokio::test]
    async fn test_delete_all_pingbacks_uses_sentinel_address() {
        let (client, transport) = client_with(&["OK"]);

        client.delete_all_pingbacks().await.unwrap();

        let requests = transport.requests();
        assert!(requests[0].1.contains(&("action".into(), "del_pingback".into())));
        assert!(requests[0].1.contains(&("addr".into(), "all".into())));
    }

    #[tokio::test]
    async fn test_balance_maps_service_errors() {
        let (client, _) = client_with(&["4.570", "ERROR_KEY_DOES_NOT_EXIST"]);

        assert_eq!(client.get_balance().await.unwrap(), "4.570");
        let err = client.get_balance().await.unwrap_err();
        assert!(matches!(err, RucaptchaError::Service { .. }));
    }
}
