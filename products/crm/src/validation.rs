//! Input checks that run before any domain logic.

use once_cell::sync::Lazy;
use regex::Regex;

pub const EMAIL_MAX_LEN: usize = 254;
pub const PHONE_MIN_LEN: usize = 7;
pub const PHONE_MAX_LEN: usize = 50;
pub const DOMAIN_MAX_LEN: usize = 253;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s\-\+\(\)\.]+$").expect("phone pattern"));

pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value.len() <= EMAIL_MAX_LEN && EMAIL.is_match(value)
}

pub fn is_valid_phone(value: &str) -> bool {
    let value = value.trim();
    (PHONE_MIN_LEN..=PHONE_MAX_LEN).contains(&value.len()) && PHONE.is_match(value)
}

pub fn is_valid_domain(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value.len() <= DOMAIN_MAX_LEN && !value.contains(char::is_whitespace)
}

/// Trimmed value, or `None` when absent or blank.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Strips currency symbols and separators, then parses what is left.
pub fn parse_money(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("ana.lopez+crm@example.co"));
        assert!(is_valid_email("  bob@example.com "));
        assert!(!is_valid_email("bob@localhost"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email(""));
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(!is_valid_email(&long));
    }

    #[test]
    fn phone_format_and_length() {
        assert!(is_valid_phone("+1 (555) 010-2030"));
        assert!(is_valid_phone("555.0102"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("call me maybe"));
        assert!(!is_valid_phone(&"1".repeat(51)));
    }

    #[test]
    fn domain_length() {
        assert!(is_valid_domain("example.com"));
        assert!(!is_valid_domain(&"a".repeat(254)));
        assert!(!is_valid_domain("bad domain.com"));
    }

    #[test]
    fn money_strips_symbols() {
        assert_eq!(parse_money("$12,500.50"), Some(12500.5));
        assert_eq!(parse_money("EUR 900"), Some(900.0));
        assert_eq!(parse_money("-40"), Some(-40.0));
        assert_eq!(parse_money("lots"), None);
        assert_eq!(parse_money("1.2.3"), None);
    }

    #[test]
    fn blank_strings_are_absent() {
        assert_eq!(non_blank(Some("  Acme ")), Some("Acme".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
