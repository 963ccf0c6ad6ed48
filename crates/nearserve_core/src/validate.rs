//! crates/nearserve_core/src/validate.rs
//!
//! Small input-validation helpers shared by the domain model and the
//! request handlers.

use chrono::{NaiveDate, NaiveTime};

/// Minimum accepted password length for locally-registered accounts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Loose email shape check: one `@` with non-empty local part, and a dot
/// somewhere in a non-empty domain. Real validation happens when mail is
/// actually sent; this only rejects obvious junk.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Parses a `HH:MM` 24-hour wall-clock time.
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_emails() {
        assert!(is_valid_email("jo@example.com"));
        assert!(is_valid_email("a.b+c@mail.co.in"));
    }

    #[test]
    fn rejects_junk_emails() {
        for bad in ["", "no-at.example.com", "@example.com", "a@", "a b@x.com", "a@no-dot"] {
            assert!(!is_valid_email(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn parses_wall_clock_times() {
        assert!(parse_hhmm("09:30").is_some());
        assert!(parse_hhmm("23:59").is_some());
        assert!(parse_hhmm("24:00").is_none());
        assert!(parse_hhmm("9:3").is_none());
        assert!(parse_hhmm("10:00 AM").is_none());
    }

    #[test]
    fn parses_dates() {
        assert!(parse_date("2025-12-25").is_some());
        assert!(parse_date("2025-13-01").is_none());
        assert!(parse_date("25-12-2025").is_none());
    }
}
