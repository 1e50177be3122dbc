//! Client-side format checks for user-supplied values.
//!
//! These run before any submission so obviously-bad input never leaves the
//! page. They are advisory: the server re-validates everything and reports
//! its own outcomes through `transaction.errors`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?\d{7,15}$").unwrap())
}

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+$").unwrap())
}

/// One failed check, code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    pub code: &'static str,
    pub message: String,
}

/// Username length window and allowed identifier formats, read from the
/// connection's attribute validation block.
#[derive(Debug, Clone)]
pub struct UsernamePolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub allow_email_format: bool,
    pub allow_phone_format: bool,
}

impl Default for UsernamePolicy {
    fn default() -> Self {
        Self {
            min_length: 1,
            max_length: 30,
            allow_email_format: true,
            allow_phone_format: true,
        }
    }
}

impl UsernamePolicy {
    /// Builds a policy from the raw validation block
    /// (`connection.options.attributes.username.validation`). Unknown or
    /// mistyped keys fall back to defaults.
    pub fn from_value(value: &Value) -> Self {
        let defaults = Self::default();
        let as_usize =
            |key: &str, fallback: usize| value.get(key).and_then(Value::as_u64).map(|v| v as usize).unwrap_or(fallback);
        let formats = value.get("allowed_formats");
        let as_flag = |key: &str| {
            formats
                .and_then(|f| f.get(key))
                .and_then(Value::as_bool)
                .unwrap_or(true)
        };

        Self {
            min_length: as_usize("min_length", defaults.min_length),
            max_length: as_usize("max_length", defaults.max_length),
            allow_email_format: as_flag("username_in_email_format"),
            allow_phone_format: as_flag("username_in_phone_format"),
        }
    }
}

/// Checks a username against the policy. Without a policy the only check is
/// non-emptiness.
pub fn validate_username(username: &str, policy: Option<&UsernamePolicy>) -> Vec<RuleViolation> {
    let Some(policy) = policy else {
        if username.trim().is_empty() {
            return vec![RuleViolation {
                code: "username-required",
                message: "Username is required.".into(),
            }];
        }
        return Vec::new();
    };

    let mut errors = Vec::new();

    if username.len() < policy.min_length {
        errors.push(RuleViolation {
            code: "username-too-short",
            message: format!(
                "Username must be at least {} characters long.",
                policy.min_length
            ),
        });
    }

    if username.len() > policy.max_length {
        errors.push(RuleViolation {
            code: "username-too-long",
            message: format!(
                "Username must be no more than {} characters.",
                policy.max_length
            ),
        });
    }

    if !policy.allow_email_format && email_re().is_match(username) {
        errors.push(RuleViolation {
            code: "username-email-not-allowed",
            message: "Usernames in email format are not allowed.".into(),
        });
    }

    let normalized: String = username.split_whitespace().collect();
    if !policy.allow_phone_format && phone_re().is_match(&normalized) {
        errors.push(RuleViolation {
            code: "username-phone-not-allowed",
            message: "Usernames in phone number format are not allowed.".into(),
        });
    }

    errors
}

/// Password complexity classes checked by [`validate_password`].
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
    /// Reject three or more identical characters in a row.
    pub forbid_identical_run: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_lowercase: false,
            require_uppercase: false,
            require_digit: false,
            require_special: false,
            forbid_identical_run: false,
        }
    }
}

/// Checks a password against the policy, returning every unmet rule.
/// Without a policy the only check is non-emptiness.
pub fn validate_password(password: &str, policy: Option<&PasswordPolicy>) -> Vec<RuleViolation> {
    let Some(policy) = policy else {
        if password.is_empty() {
            return vec![RuleViolation {
                code: "password-required",
                message: "Password is required.".into(),
            }];
        }
        return Vec::new();
    };

    let mut errors = Vec::new();

    if password.len() < policy.min_length {
        errors.push(RuleViolation {
            code: "password-too-short",
            message: format!(
                "Password must be at least {} characters long.",
                policy.min_length
            ),
        });
    }
    if policy.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(RuleViolation {
            code: "password-missing-lowercase",
            message: "Password must contain a lowercase letter.".into(),
        });
    }
    if policy.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(RuleViolation {
            code: "password-missing-uppercase",
            message: "Password must contain an uppercase letter.".into(),
        });
    }
    if policy.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(RuleViolation {
            code: "password-missing-number",
            message: "Password must contain a number.".into(),
        });
    }
    if policy.require_special && !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        errors.push(RuleViolation {
            code: "password-missing-special",
            message: "Password must contain a special character.".into(),
        });
    }
    if policy.forbid_identical_run && has_identical_run(password, 3) {
        errors.push(RuleViolation {
            code: "password-identical-chars",
            message: "Password must not repeat a character three times in a row.".into(),
        });
    }

    errors
}

fn has_identical_run(s: &str, len: usize) -> bool {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(len).any(|w| w.iter().all(|c| *c == w[0]))
}

/// True when `code` is exactly `len` ASCII digits. The OTP screens accept
/// nothing else.
pub fn is_otp_code(code: &str, len: usize) -> bool {
    code.len() == len && digits_re().is_match(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn username_without_policy_only_checks_presence() {
        assert!(validate_username("anything", None).is_empty());
        assert_eq!(validate_username("  ", None)[0].code, "username-required");
    }

    #[test]
    fn username_policy_length_and_formats() {
        let policy = UsernamePolicy {
            min_length: 5,
            max_length: 10,
            allow_email_format: false,
            allow_phone_format: false,
        };

        assert_eq!(validate_username("abc", Some(&policy))[0].code, "username-too-short");
        assert_eq!(
            validate_username("abcdefghijk", Some(&policy))[0].code,
            "username-too-long"
        );
        assert!(validate_username("a@b.co", Some(&policy))
            .iter()
            .any(|e| e.code == "username-email-not-allowed"));
        assert!(validate_username("+15551234", Some(&policy))
            .iter()
            .any(|e| e.code == "username-phone-not-allowed"));
        assert!(validate_username("plainname", Some(&policy)).is_empty());
    }

    #[test]
    fn username_policy_parses_raw_block() {
        let policy = UsernamePolicy::from_value(&json!({
            "min_length": 3,
            "max_length": 12,
            "allowed_formats": { "username_in_email_format": false }
        }));
        assert_eq!(policy.min_length, 3);
        assert_eq!(policy.max_length, 12);
        assert!(!policy.allow_email_format);
        assert!(policy.allow_phone_format);
    }

    #[test]
    fn password_rules_report_each_miss() {
        let policy = PasswordPolicy {
            min_length: 8,
            require_lowercase: true,
            require_uppercase: true,
            require_digit: true,
            require_special: true,
            forbid_identical_run: true,
        };

        let errors = validate_password("aaa", Some(&policy));
        let codes: Vec<&str> = errors.iter().map(|e| e.code).collect();
        assert!(codes.contains(&"password-too-short"));
        assert!(codes.contains(&"password-missing-uppercase"));
        assert!(codes.contains(&"password-missing-number"));
        assert!(codes.contains(&"password-identical-chars"));

        assert!(validate_password("Str0ng!pw", Some(&policy)).is_empty());
    }

    #[test]
    fn otp_codes_are_fixed_length_digits() {
        assert!(is_otp_code("123456", 6));
        assert!(!is_otp_code("12345", 6));
        assert!(!is_otp_code("12345a", 6));
    }
}
