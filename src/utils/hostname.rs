//! Hostname normalization and validation.
//!
//! Accepted grammar: dot-separated labels of `[a-z0-9-]` (1-63 chars, no
//! leading or trailing hyphen), at least two labels, and an alphabetic TLD of
//! at least two letters. Total length is capped at 253 characters.

use crate::error::AppError;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

const MAX_HOSTNAME_LEN: usize = 253;

static LABEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").unwrap());

static TLD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z]{2,63}$").unwrap());

/// Trims, lower-cases and strips one trailing dot, then validates.
///
/// # Errors
///
/// Returns [`AppError::InvalidHostname`] if the result does not match the grammar.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_hostname(" Example.COM. ")?, "example.com");
/// assert!(normalize_hostname("localhost").is_err());
/// ```
pub fn normalize_hostname(input: &str) -> Result<String, AppError> {
    let trimmed = input.trim();
    let hostname = trimmed
        .strip_suffix('.')
        .unwrap_or(trimmed)
        .to_ascii_lowercase();

    validate_hostname(&hostname)?;
    Ok(hostname)
}

/// Validates an already-normalized hostname.
pub fn validate_hostname(hostname: &str) -> Result<(), AppError> {
    if hostname.is_empty() || hostname.len() > MAX_HOSTNAME_LEN {
        return Err(AppError::invalid_hostname(
            "Invalid hostname length",
            json!({ "hostname": hostname, "min": 1, "max": MAX_HOSTNAME_LEN }),
        ));
    }

    let labels: Vec<&str> = hostname.split('.').collect();
    if labels.len() < 2 {
        return Err(AppError::invalid_hostname(
            "Invalid hostname format",
            json!({ "hostname": hostname, "hint": "Hostname must contain at least one dot" }),
        ));
    }

    if let Some(bad) = labels.iter().find(|label| !LABEL_REGEX.is_match(label)) {
        return Err(AppError::invalid_hostname(
            "Invalid hostname label",
            json!({
                "hostname": hostname,
                "label": bad,
                "allowed": "a-z, 0-9, hyphens; no leading or trailing hyphen; max 63 characters",
            }),
        ));
    }

    let tld = labels.last().copied().unwrap_or_default();
    if !TLD_REGEX.is_match(tld) {
        return Err(AppError::invalid_hostname(
            "Invalid top-level domain",
            json!({ "hostname": hostname, "hint": "TLD must be at least two letters" }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_hostnames() {
        for host in [
            "example.com",
            "sub.example.co",
            "a-b.example.org",
            "x1.y2.z3.example.io",
            "123.example.com",
        ] {
            assert!(validate_hostname(host).is_ok(), "{host} should be valid");
        }
    }

    #[test]
    fn test_invalid_hostnames() {
        for host in [
            "",
            "localhost",
            "-bad.example.com",
            "bad-.example.com",
            "bad_label.example.com",
            "example.c",
            "example.c0m",
            "example..com",
            "exa mple.com",
            "*.example.com",
        ] {
            let err = validate_hostname(host).unwrap_err();
            assert!(
                matches!(err, AppError::InvalidHostname { .. }),
                "{host} should be rejected as invalid hostname"
            );
        }
    }

    #[test]
    fn test_label_length_limit() {
        let long_label = "a".repeat(64);
        assert!(validate_hostname(&format!("{long_label}.com")).is_err());

        let max_label = "a".repeat(63);
        assert!(validate_hostname(&format!("{max_label}.com")).is_ok());
    }

    #[test]
    fn test_total_length_limit() {
        let host = format!("{}.com", ["abcdefghij"; 25].join("."));
        assert!(host.len() > MAX_HOSTNAME_LEN);
        assert!(validate_hostname(&host).is_err());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_hostname(" Example.COM. ").unwrap(), "example.com");
        assert_eq!(normalize_hostname("shop.example.com").unwrap(), "shop.example.com");
        assert!(normalize_hostname("example.com..").is_err());
    }
}
