//! End-to-end scenarios for the submit-then-poll state machine, run against
//! a scripted transport on Tokio's paused clock. No network, no real time.

use async_trait::async_trait;
use rucaptcha_client::{
    Client, Config, PollResult, Result, RucaptchaError, SendOptions, Transport,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone)]
struct Request {
    url: String,
    params: Vec<(String, String)>,
}

impl Request {
    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Transport that answers from a fixed script and records every request.
#[derive(Clone)]
struct ScriptedTransport {
    inner: Arc<Inner>,
}

struct Inner {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    fn new(responses: &[&str]) -> Self {
        Self {
            inner: Arc::new(Inner {
                responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    fn requests(&self) -> Vec<Request> {
        self.inner.requests.lock().unwrap().clone()
    }

    fn record(&self, url: &str, params: &[(String, String)]) -> Result<String> {
        self.inner.requests.lock().unwrap().push(Request {
            url: url.to_string(),
            params: params.to_vec(),
        });
        Ok(self
            .inner
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted transport ran out of responses"))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<String> {
        self.record(url, params)
    }

    async fn post_form(&self, url: &str, params: &[(String, String)]) -> Result<String> {
        self.record(url, params)
    }
}

fn test_config() -> Config {
    Config::from_api_key("test-key").unwrap()
}

fn client(config: Config, transport: &ScriptedTransport) -> Client {
    Client::builder(config)
        .transport(transport.clone())
        .build()
        .unwrap()
}

/// Scenario A: answer ready on the first poll. The loop still sleeps one
/// full interval before that poll.
#[tokio::test(start_paused = true)]
async fn recognize_returns_answer_after_one_interval() {
    let transport = ScriptedTransport::new(&["OK|999", "OK|hello"]);
    let client = client(test_config(), &transport);

    let started = Instant::now();
    let answer = client.recognize(b"img", &SendOptions::new()).await.unwrap();

    assert_eq!(answer, "hello");
    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert_eq!(client.last_captcha_id(), Some("999".to_string()));

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].param("action"), Some("get"));
    assert_eq!(requests[1].param("id"), Some("999"));
}

/// Scenario B: N pending polls before the answer cost N+1 intervals.
#[tokio::test(start_paused = true)]
async fn recognize_keeps_polling_while_pending() {
    let transport = ScriptedTransport::new(&[
        "OK|7",
        "CAPCHA_NOT_READY",
        "CAPCHA_NOT_READY",
        "CAPCHA_NOT_READY",
        "OK|done",
    ]);
    let client = client(test_config(), &transport);

    let started = Instant::now();
    let answer = client.recognize(b"img", &SendOptions::new()).await.unwrap();

    assert_eq!(answer, "done");
    assert_eq!(started.elapsed(), Duration::from_secs(20));
    assert_eq!(transport.requests().len(), 5);
}

/// Scenario C: the elapsed check runs after each sleep and before the next
/// poll, so max_wait=10/interval=5 times out after two intervals with only
/// one poll spent.
#[tokio::test(start_paused = true)]
async fn recognize_times_out_before_wasting_a_poll() {
    let transport = ScriptedTransport::new(&["OK|1", "CAPCHA_NOT_READY", "CAPCHA_NOT_READY"]);
    let config = Config::builder("test-key")
        .poll_interval(Duration::from_secs(5))
        .max_wait(Duration::from_secs(10))
        .build()
        .unwrap();
    let client = client(config, &transport);

    let started = Instant::now();
    let err = client
        .recognize(b"img", &SendOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RucaptchaError::Timeout { .. }));
    assert_eq!(started.elapsed(), Duration::from_secs(10));
    // One submit plus exactly one poll; the second poll is never issued.
    assert_eq!(transport.requests().len(), 2);
}

/// Scenario D: a submit failure propagates immediately, with the catalog
/// message, and the loop never starts.
#[tokio::test(start_paused = true)]
async fn submit_failure_never_enters_the_wait_loop() {
    let transport = ScriptedTransport::new(&["ERROR_ZERO_BALANCE"]);
    let client = client(test_config(), &transport);

    let started = Instant::now();
    let err = client
        .recognize(b"img", &SendOptions::new())
        .await
        .unwrap_err();

    match err {
        RucaptchaError::Service { message, .. } => {
            assert_eq!(message, "Your account balance is zero.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(client.last_captcha_id(), None);
}

/// A service error during polling aborts the loop at once instead of
/// retrying until the deadline.
#[tokio::test(start_paused = true)]
async fn poll_error_fails_the_loop_immediately() {
    let transport = ScriptedTransport::new(&["OK|12", "ERROR_WRONG_CAPTCHA_ID"]);
    let client = client(test_config(), &transport);

    let started = Instant::now();
    let err = client
        .recognize(b"img", &SendOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RucaptchaError::Service { .. }));
    assert_eq!(started.elapsed(), Duration::from_secs(5));
}

/// The recaptcha loops are paced by the dedicated recaptcha interval, not
/// the image one.
#[tokio::test(start_paused = true)]
async fn recaptcha_loop_uses_recaptcha_interval() {
    let transport =
        ScriptedTransport::new(&["OK|333", "CAPCHA_NOT_READY", "OK|v2-token"]);
    let client = client(test_config(), &transport);

    let started = Instant::now();
    let token = client
        .recognize_recaptcha_v2("site-key", "https://example.com/", &SendOptions::new())
        .await
        .unwrap();

    assert_eq!(token, "v2-token");
    // Two sleeps of the 15 s recaptcha interval, not the 5 s image one.
    assert_eq!(started.elapsed(), Duration::from_secs(30));

    let submit = &transport.requests()[0];
    assert_eq!(submit.param("method"), Some("userrecaptcha"));
    assert_eq!(submit.param("googlekey"), Some("site-key"));
    assert_eq!(submit.param("pageurl"), Some("https://example.com/"));
    assert_eq!(submit.param("version"), None);
}

#[tokio::test(start_paused = true)]
async fn recaptcha_v3_submits_action_and_score() {
    let transport = ScriptedTransport::new(&["OK|40", "OK|v3-token"]);
    let client = client(test_config(), &transport);

    let token = client
        .recognize_recaptcha_v3(
            "site-key",
            "https://example.com/",
            "login",
            0.3,
            &SendOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(token, "v3-token");
    let submit = &transport.requests()[0];
    assert_eq!(submit.param("version"), Some("v3"));
    assert_eq!(submit.param("action"), Some("login"));
    assert_eq!(submit.param("min_score"), Some("0.3"));
}

#[tokio::test(start_paused = true)]
async fn keycaptcha_submits_session_fields() {
    let transport = ScriptedTransport::new(&["OK|88", "OK|capcode-value"]);
    let client = client(test_config(), &transport);

    let session = rucaptcha_client::KeyCaptchaSession::new(
        "184015",
        "8510374722615",
        "9006dc725760858e4c0715b835472f22",
        "2ca3abe86d90c6142d5571db98af6714",
        "https://example.com/checkout",
    );

    let code = client
        .recognize_key_captcha(&session, &SendOptions::new())
        .await
        .unwrap();

    assert_eq!(code, "capcode-value");
    let submit = &transport.requests()[0];
    assert_eq!(submit.param("method"), Some("keycaptcha"));
    assert_eq!(submit.param("s_s_c_user_id"), Some("184015"));
    assert_eq!(submit.param("s_s_c_session_id"), Some("8510374722615"));
    assert_eq!(
        submit.param("s_s_c_web_server_sign"),
        Some("9006dc725760858e4c0715b835472f22")
    );
    assert_eq!(
        submit.param("s_s_c_web_server_sign2"),
        Some("2ca3abe86d90c6142d5571db98af6714")
    );
    assert_eq!(submit.param("pageurl"), Some("https://example.com/checkout"));
}

/// Bulk poll: output order and length track the input ids, and the per-id
/// sentinel maps to pending.
#[tokio::test]
async fn bulk_poll_preserves_order_and_maps_sentinel() {
    let transport = ScriptedTransport::new(&["OK|aaa|CAPCHA_NOT_READY"]);
    let client = client(test_config(), &transport);

    let ids = vec!["1".to_string(), "2".to_string()];
    let results = client.get_captcha_result_bulk(&ids).await.unwrap();

    assert_eq!(
        results,
        vec![
            ("1".to_string(), PollResult::Solved("aaa".to_string())),
            ("2".to_string(), PollResult::Pending),
        ]
    );

    let request = &transport.requests()[0];
    assert_eq!(request.param("ids"), Some("1,2"));
    assert!(request.url.ends_with("/res.php"));
}

#[tokio::test]
async fn bulk_poll_surfaces_field_count_mismatch() {
    let transport = ScriptedTransport::new(&["a|b|c|d"]);
    let client = client(test_config(), &transport);

    let ids = vec!["1".to_string(), "2".to_string()];
    let err = client.get_captcha_result_bulk(&ids).await.unwrap_err();
    assert!(matches!(err, RucaptchaError::InvalidResponse(_)));
}

/// The json=1 variant: tri-state decoding plus the malformed-body parse
/// failure being distinct from a service error.
#[tokio::test]
async fn json_poll_variant_decodes_all_states() {
    let transport = ScriptedTransport::new(&[
        r#"{"status":0,"request":"CAPCHA_NOT_READY"}"#,
        r#"{"status":1,"request":"answer"}"#,
        r#"{"status":3,"request":"ERROR_WRONG_ID_FORMAT"}"#,
        "<html>gateway timeout</html>",
    ]);
    let client = client(test_config(), &transport);

    assert_eq!(
        client.get_captcha_result_json("5").await.unwrap(),
        PollResult::Pending
    );
    assert_eq!(
        client.get_captcha_result_json("5").await.unwrap(),
        PollResult::Solved("answer".to_string())
    );

    let err = client.get_captcha_result_json("5").await.unwrap_err();
    match err {
        RucaptchaError::Service { message, code } => {
            assert_eq!(
                message,
                "Wrong captcha id format, the id may contain digits only."
            );
            assert_eq!(code, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = client.get_captcha_result_json("5").await.unwrap_err();
    assert!(matches!(err, RucaptchaError::Json(_)));

    let request = &transport.requests()[0];
    assert_eq!(request.param("json"), Some("1"));
}

/// Solved text is entity-decoded and trimmed on the way out.
#[tokio::test]
async fn poll_decodes_html_entities() {
    let transport = ScriptedTransport::new(&["OK| Tom &amp; Jerry "]);
    let client = client(test_config(), &transport);

    assert_eq!(
        client.get_captcha_result("9").await.unwrap(),
        PollResult::Solved("Tom & Jerry".to_string())
    );
}

#[tokio::test]
async fn pingback_management_round_trip() {
    let transport = ScriptedTransport::new(&[
        "OK",
        "OK|http://a.example/in|http://b.example/in",
        "OK",
    ]);
    let client = client(test_config(), &transport);

    client.add_pingback("http://a.example/in").await.unwrap();
    assert_eq!(
        client.get_pingbacks().await.unwrap(),
        vec![
            "http://a.example/in".to_string(),
            "http://b.example/in".to_string()
        ]
    );
    client.delete_pingback("http://a.example/in").await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].param("action"), Some("add_pingback"));
    assert_eq!(requests[1].param("action"), Some("get_pingback"));
    assert_eq!(requests[2].param("action"), Some("del_pingback"));
}

/// A missing file is rejected before any request is made.
#[tokio::test]
async fn recognize_file_rejects_missing_path() {
    let transport = ScriptedTransport::new(&[]);
    let client = client(test_config(), &transport);

    let err = client
        .recognize_file("/definitely/not/here.png", &SendOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RucaptchaError::InvalidArgument(_)));
    assert!(transport.requests().is_empty());
}
