//! Response-body parsing for the plain-text and JSON wire formats.
//!
//! The service answers with small literal-prefixed bodies: `OK|<payload>`
//! on success, the exact `CAPCHA_NOT_READY` sentinel while a task is being
//! solved, and an `ERROR_*` token (or free-form text) on failure. The
//! parsers here are pure functions over those bodies; all network traffic
//! stays in the client.

use crate::catalog;
use crate::error::{Result, RucaptchaError};
use crate::models::{JsonPollResponse, PollResult, SolvedCaptcha};

/// Literal success body for single-shot operations.
pub const STATUS_OK: &str = "OK";
/// Sentinel body while a task is still being solved. The missing "T" is the
/// service's own spelling.
pub const STATUS_CAPTCHA_NOT_READY: &str = "CAPCHA_NOT_READY";
/// Literal body confirming a recorded good/bad report.
pub const STATUS_OK_REPORT_RECORDED: &str = "OK_REPORT_RECORDED";

/// Prefix of every successful submit/poll body.
const OK_PREFIX: &str = "OK|";

/// JSON poll status for a pending task.
pub const JSON_STATUS_NOT_READY: i64 = 0;
/// JSON poll status for a solved task.
pub const JSON_STATUS_OK: i64 = 1;

/// HTML-entity-decode an answer and strip surrounding whitespace.
pub fn decode_answer(raw: &str) -> String {
    html_escape::decode_html_entities(raw.trim()).into_owned()
}

/// Extract the task id from a submission response.
///
/// Anything that does not begin with `OK|` is a submission failure; a
/// partial identifier is never returned.
pub fn parse_submit_response(body: &str) -> Result<String> {
    match body.strip_prefix(OK_PREFIX) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(RucaptchaError::service_unknown(body)),
    }
}

/// Interpret a single plain-text poll body.
pub fn parse_poll_response(body: &str) -> Result<PollResult> {
    if body == STATUS_CAPTCHA_NOT_READY {
        return Ok(PollResult::Pending);
    }

    match body.strip_prefix(OK_PREFIX) {
        Some(answer) => Ok(PollResult::Solved(decode_answer(answer))),
        None => Err(RucaptchaError::service(body)),
    }
}

/// Interpret a `json=1` poll body.
///
/// A body that is not valid JSON is a parse failure
/// ([`RucaptchaError::Json`]), distinct from a failure the service reported.
pub fn parse_json_poll_response(body: &str) -> Result<PollResult> {
    let response: JsonPollResponse = serde_json::from_str(body)?;

    match response.status {
        JSON_STATUS_NOT_READY => Ok(PollResult::Pending),
        JSON_STATUS_OK => Ok(PollResult::Solved(response.request)),
        status => Err(RucaptchaError::Service {
            message: catalog::message_for(&response.request)
                .map(str::to_string)
                .unwrap_or(response.request),
            code: u32::try_from(status).unwrap_or(0),
        }),
    }
}

/// Interpret a priced poll body (`action=get2`): `OK|<answer>|<cost>`.
///
/// Returns `None` while the task is pending.
pub fn parse_with_cost_response(body: &str) -> Result<Option<SolvedCaptcha>> {
    if body == STATUS_CAPTCHA_NOT_READY {
        return Ok(None);
    }

    let rest = body
        .strip_prefix(OK_PREFIX)
        .ok_or_else(|| RucaptchaError::service(body))?;

    let (answer, cost) = rest.rsplit_once('|').ok_or_else(|| {
        RucaptchaError::InvalidResponse(format!("missing cost field in `{body}`"))
    })?;

    Ok(Some(SolvedCaptcha {
        text: decode_answer(answer),
        cost: decode_answer(cost),
    }))
}

/// Interpret a bulk poll body against the submitted id sequence.
///
/// The body is pipe-delimited in submission order, optionally led by a
/// literal `OK` field. Each entry is either an answer or the same
/// `CAPCHA_NOT_READY` sentinel used by the single poll. A field count that
/// matches neither shape is surfaced to the caller, not silently recovered.
pub fn parse_bulk_response(ids: &[String], body: &str) -> Result<Vec<(String, PollResult)>> {
    let fields: Vec<&str> = body.split('|').collect();

    if fields.len() == 1 {
        let sole = fields[0];
        if catalog::message_for(sole).is_some() || sole.starts_with("ERROR_") {
            return Err(RucaptchaError::service(sole));
        }
    }

    let entries: &[&str] = if fields.len() == ids.len() + 1 && fields[0] == STATUS_OK {
        &fields[1..]
    } else if fields.len() == ids.len() {
        &fields
    } else {
        return Err(RucaptchaError::InvalidResponse(format!(
            "bulk poll for {} task(s) answered with {} field(s): `{body}`",
            ids.len(),
            fields.len()
        )));
    };

    let results = ids
        .iter()
        .zip(entries)
        .map(|(id, entry)| {
            let decoded = decode_answer(entry);
            let result = if decoded == STATUS_CAPTCHA_NOT_READY {
                PollResult::Pending
            } else {
                PollResult::Solved(decoded)
            };
            (id.clone(), result)
        })
        .collect();

    Ok(results)
}

/// Interpret the pingback allow-list body: `OK|<url>|<url>…`.
pub fn parse_pingback_list(body: &str) -> Result<Vec<String>> {
    if body == STATUS_OK {
        return Ok(Vec::new());
    }

    match body.strip_prefix(OK_PREFIX) {
        Some(rest) => Ok(rest
            .split('|')
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()),
        None => Err(RucaptchaError::service(body)),
    }
}
