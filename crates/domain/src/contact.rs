//! Contact submission input and its validation rules.
//!
//! Validation collects every field violation in one pass instead of
//! short-circuiting, so the form can surface all problems at once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;
const EMAIL_MAX_CHARS: usize = 100;
const MESSAGE_MIN_CHARS: usize = 10;
const MESSAGE_MAX_CHARS: usize = 5000;

/// Contact form payload as received on the wire, before validation.
///
/// Every field is optional so a partial or mistyped body still reaches the
/// validator and comes back as per-field errors rather than a
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawContactRequest {
    /// Sender name, unvalidated.
    #[serde(default)]
    pub name: Option<String>,
    /// Sender email address, unvalidated.
    #[serde(default)]
    pub email: Option<String>,
    /// Message body, unvalidated.
    #[serde(default)]
    pub message: Option<String>,
}

/// Field-level validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    /// A single catch-all error for bodies that never reached field
    /// validation (not a JSON object, unreadable body).
    #[must_use]
    pub fn general(message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push("general", message);
        errors
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_owned(), message.into());
    }

    /// Returns the message recorded for a field, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// True when no violations were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Consumes the errors into a plain field-to-message map.
    #[must_use]
    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// A contact submission that passed validation. Holds trimmed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactSubmission {
    name: String,
    email: String,
    message: String,
}

impl ContactSubmission {
    /// Validates a raw request, collecting all violations.
    ///
    /// Missing fields behave as empty strings. On success the returned
    /// submission carries exactly the trimmed input values, making repeated
    /// validation of the same input idempotent.
    pub fn validate(raw: &RawContactRequest) -> Result<Self, ValidationErrors> {
        let name = raw.name.as_deref().unwrap_or_default();
        let email = raw.email.as_deref().unwrap_or_default();
        let message = raw.message.as_deref().unwrap_or_default();

        let mut errors = ValidationErrors::default();

        if name.trim().chars().count() < NAME_MIN_CHARS {
            errors.push("name", "Name must be at least 2 characters");
        } else if name.chars().count() > NAME_MAX_CHARS {
            errors.push("name", "Name must be less than 100 characters");
        }

        if !is_plausible_email(email) {
            errors.push("email", "Please enter a valid email address");
        } else if email.chars().count() > EMAIL_MAX_CHARS {
            errors.push("email", "Email must be less than 100 characters");
        }

        if message.trim().chars().count() < MESSAGE_MIN_CHARS {
            errors.push("message", "Message must be at least 10 characters");
        } else if message.chars().count() > MESSAGE_MAX_CHARS {
            errors.push("message", "Message must be less than 5000 characters");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            name: name.trim().to_owned(),
            email: email.trim().to_owned(),
            message: message.trim().to_owned(),
        })
    }

    /// Trimmed sender name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trimmed sender email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Trimmed message body.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Mirrors the form's `local@domain.tld` pattern: non-empty local part,
/// exactly one `@`, no whitespace, and a dot strictly inside the domain.
fn is_plausible_email(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    let bytes = domain.as_bytes();
    (1..bytes.len().saturating_sub(1)).any(|index| bytes[index] == b'.')
}

#[cfg(test)]
mod tests {
    use super::{ContactSubmission, RawContactRequest, ValidationErrors};

    fn raw(name: &str, email: &str, message: &str) -> RawContactRequest {
        RawContactRequest {
            name: Some(name.to_owned()),
            email: Some(email.to_owned()),
            message: Some(message.to_owned()),
        }
    }

    fn errors_of(input: &RawContactRequest) -> ValidationErrors {
        match ContactSubmission::validate(input) {
            Ok(submission) => panic!("expected validation failure, got {submission:?}"),
            Err(errors) => errors,
        }
    }

    #[test]
    fn accepts_a_valid_submission_with_trimmed_values() {
        let input = raw(
            "  Jo  ",
            "jo@x.com",
            "  Hello there, this is long enough.  ",
        );

        let submission = match ContactSubmission::validate(&input) {
            Ok(submission) => submission,
            Err(errors) => panic!("expected success, got {errors:?}"),
        };

        assert_eq!(submission.name(), "Jo");
        assert_eq!(submission.email(), "jo@x.com");
        assert_eq!(submission.message(), "Hello there, this is long enough.");
    }

    #[test]
    fn rejects_names_shorter_than_two_trimmed_characters() {
        for name in ["", "J", "  J  ", "   "] {
            let errors = errors_of(&raw(name, "jo@x.com", "A long enough message."));
            assert_eq!(errors.get("name"), Some("Name must be at least 2 characters"));
            assert_eq!(errors.len(), 1);
        }
    }

    #[test]
    fn rejects_overlong_fields() {
        let input = raw(
            &"n".repeat(101),
            &format!("{}@x.com", "a".repeat(100)),
            &"m".repeat(5001),
        );

        let errors = errors_of(&input);
        assert_eq!(errors.get("name"), Some("Name must be less than 100 characters"));
        assert_eq!(errors.get("email"), Some("Email must be less than 100 characters"));
        assert_eq!(
            errors.get("message"),
            Some("Message must be less than 5000 characters")
        );
    }

    #[test]
    fn rejects_invalid_email_shapes_regardless_of_other_fields() {
        for email in [
            "",
            "bad-email",
            "no-at-sign.com",
            "missing@tld",
            "two@@signs.com",
            "spaces in@mail.com",
            "@nolocal.com",
            "trailing@dot.",
            "leading@.dot",
        ] {
            let errors = errors_of(&raw("Valid Name", email, "A perfectly valid message body."));
            assert_eq!(errors.get("email"), Some("Please enter a valid email address"));
        }
    }

    #[test]
    fn accepts_subdomain_and_dotted_local_addresses() {
        for email in ["a.b@mail.example.co.uk", "jo+tag@x.io"] {
            let result = ContactSubmission::validate(&raw(
                "Valid Name",
                email,
                "A perfectly valid message body.",
            ));
            assert!(result.is_ok(), "expected {email} to validate");
        }
    }

    #[test]
    fn collects_all_violations_in_one_pass() {
        let errors = errors_of(&raw("J", "bad-email", "short"));

        assert_eq!(errors.len(), 3);
        assert!(errors.get("name").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("message").is_some());
    }

    #[test]
    fn missing_fields_behave_as_empty_strings() {
        let errors = errors_of(&RawContactRequest::default());

        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn validation_is_idempotent() {
        let input = raw("Jo", "jo@x.com", "Hello there, this is long enough.");

        let first = ContactSubmission::validate(&input);
        let second = ContactSubmission::validate(&input);

        assert_eq!(first, second);
    }
}
