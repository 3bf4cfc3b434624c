//! Input checks shared by the auth flows.
//!
//! Validation is otherwise the caller's job; these helpers exist for the two
//! checks that must hold before a request is built at all.

use lazy_static::lazy_static;
use regex::Regex;

/// Length of the one-time codes the backend mails out.
pub const OTP_LENGTH: usize = 5;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// OTP codes are exactly five ASCII digits, everywhere they appear.
pub fn is_valid_otp(otp: &str) -> bool {
    otp.len() == OTP_LENGTH && otp.bytes().all(|b| b.is_ascii_digit())
}
