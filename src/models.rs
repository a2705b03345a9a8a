//! Data models for the recognition API.

use serde::Deserialize;

/// Outcome of a single result poll.
///
/// `Pending` is a normal state, not an error: the workers simply have not
/// finished the task yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// The task is still being solved.
    Pending,
    /// The decoded answer text.
    Solved(String),
}

impl PollResult {
    /// Returns `true` while the task is still being solved.
    pub fn is_pending(&self) -> bool {
        matches!(self, PollResult::Pending)
    }

    /// Consume the result, yielding the answer if one is ready.
    pub fn into_solved(self) -> Option<String> {
        match self {
            PollResult::Pending => None,
            PollResult::Solved(text) => Some(text),
        }
    }
}

/// Answer together with the amount charged for it, from the priced poll
/// variant (`action=get2`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedCaptcha {
    /// Decoded answer text.
    pub text: String,
    /// Amount charged for the recognition, as reported by the service.
    pub cost: String,
}

/// Wire model of the `json=1` poll response.
///
/// `status` 0 means the task is pending, 1 means `request` carries the
/// answer; any other value marks a failure with the error body in `request`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonPollResponse {
    pub status: i64,
    #[serde(default)]
    pub request: String,
}

/// Session and signature parameters of a keycaptcha challenge, scraped
/// from the protected page.
#[derive(Debug, Clone)]
pub struct KeyCaptchaSession {
    /// `s_s_c_user_id` value.
    pub user_id: String,
    /// `s_s_c_session_id` value.
    pub session_id: String,
    /// `s_s_c_web_server_sign` value.
    pub web_server_sign: String,
    /// `s_s_c_web_server_sign2` value.
    pub web_server_sign2: String,
    /// URL of the page hosting the challenge.
    pub page_url: String,
}

impl KeyCaptchaSession {
    /// Bundle the four session/signature fields with the page URL.
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        web_server_sign: impl Into<String>,
        web_server_sign2: impl Into<String>,
        page_url: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            web_server_sign: web_server_sign.into(),
            web_server_sign2: web_server_sign2.into(),
            page_url: page_url.into(),
        }
    }
}

/// Answer alphabet restriction for image submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numeric {
    /// Answer contains digits only.
    DigitsOnly,
    /// Answer contains letters only.
    LettersOnly,
    /// Answer is either all digits or all letters.
    DigitsOrLetters,
    /// Answer mixes digits and letters.
    DigitsAndLetters,
}

impl Numeric {
    /// Returns the wire value for the `numeric` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Numeric::DigitsOnly => "1",
            Numeric::LettersOnly => "2",
            Numeric::DigitsOrLetters => "3",
            Numeric::DigitsAndLetters => "4",
        }
    }
}

/// Typed recognition options merged into a submission.
///
/// Each field maps to one documented request parameter; flags are only sent
/// when enabled, so a default `SendOptions` adds nothing to the request.
///
/// # Example
/// ```
/// use rucaptcha_client::{Numeric, SendOptions};
///
/// let options = SendOptions::new()
///     .phrase(true)
///     .numeric(Numeric::DigitsOnly)
///     .min_len(4)
///     .max_len(8);
///
/// let params = options.to_params();
/// assert!(params.contains(&("phrase".to_string(), "1".to_string())));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    phrase: bool,
    regsense: bool,
    question: bool,
    calc: bool,
    numeric: Option<Numeric>,
    min_len: Option<u32>,
    max_len: Option<u32>,
    is_russian: bool,
    language: Option<u8>,
    textinstructions: Option<String>,
    header_acao: bool,
    pingback: Option<String>,
    soft_id: Option<String>,
}

impl SendOptions {
    /// Empty options; nothing extra is sent.
    pub fn new() -> Self {
        Self::default()
    }

    /// The answer consists of two or more words.
    pub fn phrase(mut self, phrase: bool) -> Self {
        self.phrase = phrase;
        self
    }

    /// The answer is case sensitive.
    pub fn regsense(mut self, regsense: bool) -> Self {
        self.regsense = regsense;
        self
    }

    /// The image poses a question the worker must answer.
    pub fn question(mut self, question: bool) -> Self {
        self.question = question;
        self
    }

    /// The image contains an arithmetic expression to evaluate.
    pub fn calc(mut self, calc: bool) -> Self {
        self.calc = calc;
        self
    }

    /// Restrict the answer alphabet.
    pub fn numeric(mut self, numeric: Numeric) -> Self {
        self.numeric = Some(numeric);
        self
    }

    /// Minimum answer length.
    pub fn min_len(mut self, min_len: u32) -> Self {
        self.min_len = Some(min_len);
        self
    }

    /// Maximum answer length.
    pub fn max_len(mut self, max_len: u32) -> Self {
        self.max_len = Some(max_len);
        self
    }

    /// The captcha text is Russian.
    pub fn is_russian(mut self, is_russian: bool) -> Self {
        self.is_russian = is_russian;
        self
    }

    /// Worker language pool (service-defined numeric value).
    pub fn language(mut self, language: u8) -> Self {
        self.language = Some(language);
        self
    }

    /// Free-form instructions shown to the worker.
    pub fn textinstructions(mut self, text: impl Into<String>) -> Self {
        self.textinstructions = Some(text.into());
        self
    }

    /// Ask the service to send CORS headers on the result endpoint.
    pub fn header_acao(mut self, header_acao: bool) -> Self {
        self.header_acao = header_acao;
        self
    }

    /// Pingback URL to notify when the task completes. The URL must already
    /// be on the account allow-list.
    pub fn pingback(mut self, url: impl Into<String>) -> Self {
        self.pingback = Some(url.into());
        self
    }

    /// Override the application id for this submission only.
    pub fn soft_id(mut self, soft_id: impl Into<String>) -> Self {
        self.soft_id = Some(soft_id.into());
        self
    }

    /// Whether an application id was set on these options.
    pub(crate) fn has_soft_id(&self) -> bool {
        self.soft_id.is_some()
    }

    /// Render the options as request parameters. Unset fields and disabled
    /// flags are omitted entirely.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        let mut flag = |name: &str, set: bool| {
            if set {
                params.push((name.to_string(), "1".to_string()));
            }
        };

        flag("phrase", self.phrase);
        flag("regsense", self.regsense);
        flag("question", self.question);
        flag("calc", self.calc);
        flag("is_russian", self.is_russian);
        flag("header_acao", self.header_acao);

        if let Some(numeric) = self.numeric {
            params.push(("numeric".into(), numeric.as_str().into()));
        }
        if let Some(min_len) = self.min_len {
            params.push(("min_len".into(), min_len.to_string()));
        }
        if let Some(max_len) = self.max_len {
            params.push(("max_len".into(), max_len.to_string()));
        }
        if let Some(language) = self.language {
            params.push(("language".into(), language.to_string()));
        }
        if let Some(ref text) = self.textinstructions {
            params.push(("textinstructions".into(), text.clone()));
        }
        if let Some(ref url) = self.pingback {
            params.push(("pingback".into(), url.clone()));
        }
        if let Some(ref soft_id) = self.soft_id {
            params.push(("soft_id".into(), soft_id.clone()));
        }

        params
    }
}
