//! Static catalog of service error codes.
//!
//! The service reports failures as terse `ERROR_*` tokens in the response
//! body. This module maps them to readable messages. The catalog is built
//! once on first use and never mutated.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Nonexistent API key.
pub const KEY_DOES_NOT_EXIST: &str = "ERROR_KEY_DOES_NOT_EXIST";
/// Malformed captcha id.
pub const WRONG_ID_FORMAT: &str = "ERROR_WRONG_ID_FORMAT";
/// Malformed API key.
pub const WRONG_USER_KEY: &str = "ERROR_WRONG_USER_KEY";
/// Account has no funds.
pub const ZERO_BALANCE: &str = "ERROR_ZERO_BALANCE";
/// Workers gave up on the captcha.
pub const CAPTCHA_UNSOLVABLE: &str = "ERROR_CAPTCHA_UNSOLVABLE";
/// Submission queue is full or the bid is too low.
pub const NO_SLOT_AVAILABLE: &str = "ERROR_NO_SLOT_AVAILABLE";
/// The referenced task has expired server-side.
pub const WRONG_CAPTCHA_ID: &str = "ERROR_WRONG_CAPTCHA_ID";
/// Image below the accepted size floor.
pub const ZERO_CAPTCHA_FILESIZE: &str = "ERROR_ZERO_CAPTCHA_FILESIZE";
/// 100% recognition ran out of attempts.
pub const BAD_DUPLICATES: &str = "ERROR_BAD_DUPLICATES";
/// Image above the accepted size ceiling.
pub const TOO_BIG_CAPTCHA_FILESIZE: &str = "ERROR_TOO_BIG_CAPTCHA_FILESIZE";
/// Unsupported image extension.
pub const WRONG_FILE_EXTENSION: &str = "ERROR_WRONG_FILE_EXTENSION";
/// Server could not determine the image type.
pub const IMAGE_TYPE_NOT_SUPPORTED: &str = "ERROR_IMAGE_TYPE_NOT_SUPPORTED";
/// Request came from an IP outside the account allow-list.
pub const IP_NOT_ALLOWED: &str = "ERROR_IP_NOT_ALLOWED";
/// Source IP is temporarily banned.
pub const IP_BANNED: &str = "ERROR_IP_BANNED";

static MESSAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (
            KEY_DOES_NOT_EXIST,
            "The API key you provided does not exist.",
        ),
        (
            WRONG_ID_FORMAT,
            "Wrong captcha id format, the id may contain digits only.",
        ),
        (
            WRONG_USER_KEY,
            "Wrong `key` parameter format, it must be 32 characters long.",
        ),
        (ZERO_BALANCE, "Your account balance is zero."),
        (
            CAPTCHA_UNSOLVABLE,
            "Three different workers were unable to solve the captcha; \
             the charge is refunded to your balance.",
        ),
        (
            NO_SLOT_AVAILABLE,
            "The current recognition bid is higher than the maximum set in your \
             account, or the submission queue is full; retry in 5 seconds.",
        ),
        (
            WRONG_CAPTCHA_ID,
            "You are requesting the answer for a captcha submitted more than \
             15 minutes ago; the service no longer stores it.",
        ),
        (
            ZERO_CAPTCHA_FILESIZE,
            "The captcha image is smaller than 100 bytes.",
        ),
        (
            BAD_DUPLICATES,
            "100% recognition used up its attempts without collecting enough \
             matching answers.",
        ),
        (
            TOO_BIG_CAPTCHA_FILESIZE,
            "The captcha image is larger than 100 kB.",
        ),
        (
            WRONG_FILE_EXTENSION,
            "The captcha file has a wrong extension; accepted extensions are \
             jpg, jpeg, gif and png.",
        ),
        (
            IMAGE_TYPE_NOT_SUPPORTED,
            "The server cannot determine the captcha file type.",
        ),
        (
            IP_NOT_ALLOWED,
            "The request came from an IP that is not on the allow-list \
             configured in your account.",
        ),
        (
            IP_BANNED,
            "The source IP is banned for repeated requests with invalid keys; \
             the ban lifts after one hour.",
        ),
    ])
});

/// Look up the readable message for a service error code.
///
/// Returns `None` for codes the catalog does not know; callers fall back to
/// the raw response body in that case.
pub fn message_for(code: &str) -> Option<&'static str> {
    MESSAGES.get(code).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_code_mapped() {
        assert_eq!(
            message_for(ZERO_BALANCE),
            Some("Your account balance is zero.")
        );
    }

    #[test]
    fn test_unknown_code_unmapped() {
        assert_eq!(message_for("ERROR_SOMETHING_NEW"), None);
        assert_eq!(message_for(""), None);
    }

    #[test]
    fn test_catalog_covers_all_published_codes() {
        for code in [
            KEY_DOES_NOT_EXIST,
            WRONG_ID_FORMAT,
            WRONG_USER_KEY,
            ZERO_BALANCE,
            CAPTCHA_UNSOLVABLE,
            NO_SLOT_AVAILABLE,
            WRONG_CAPTCHA_ID,
            ZERO_CAPTCHA_FILESIZE,
            BAD_DUPLICATES,
            TOO_BIG_CAPTCHA_FILESIZE,
            WRONG_FILE_EXTENSION,
            IMAGE_TYPE_NOT_SUPPORTED,
            IP_NOT_ALLOWED,
            IP_BANNED,
        ] {
            assert!(message_for(code).is_some(), "missing message for {code}");
        }
    }
}
