//! Field-level input validation for signup and note payloads.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{NoteDraft, NoteInput};

/// Maximum title length, in characters.
pub const TITLE_MAX_LEN: usize = 255;

/// Maximum username length, in characters.
pub const USERNAME_MAX_LEN: usize = 150;

/// Maximum email length, in characters.
pub const EMAIL_MAX_LEN: usize = 254;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("valid email regex"));

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-field shorthand.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, otherwise `Error::Validation`.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Signup fields after validation (password still in plaintext).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupFields {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Check a required text field, trimming surrounding whitespace.
///
/// `blank_message` is reported for empty or whitespace-only values.
fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    blank_message: &str,
) -> Option<String> {
    match value.map(str::trim) {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some("") => {
            errors.add(field, blank_message);
            None
        }
        Some(v) => Some(v.to_string()),
    }
}

/// Validate a note create/update payload.
///
/// Title and content are required and must contain something other than
/// whitespace; both are stored trimmed. Titles longer than
/// [`TITLE_MAX_LEN`] characters are rejected.
pub fn validate_note(input: &NoteInput) -> Result<NoteDraft> {
    let mut errors = FieldErrors::new();

    let title = required_text(
        &mut errors,
        "title",
        input.title.as_deref(),
        "Note title cannot be empty",
    );
    if let Some(t) = &title {
        if t.chars().count() > TITLE_MAX_LEN {
            errors.add(
                "title",
                format!(
                    "Ensure this field has no more than {} characters.",
                    TITLE_MAX_LEN
                ),
            );
        }
    }

    let content = required_text(
        &mut errors,
        "content",
        input.content.as_deref(),
        "Note content cannot be empty",
    );

    match (title, content) {
        (Some(title), Some(content)) if errors.is_empty() => Ok(NoteDraft { title, content }),
        _ => Err(Error::Validation(errors)),
    }
}

/// Validate a signup payload.
///
/// Username: required, at most [`USERNAME_MAX_LEN`] characters of letters,
/// digits and `@.+-_`. Email: optional, but must look like an address when
/// given. Password: required and non-empty (not trimmed).
pub fn validate_signup(
    username: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<SignupFields> {
    let mut errors = FieldErrors::new();

    let username = required_text(&mut errors, "username", username, BLANK);
    if let Some(u) = &username {
        if u.chars().count() > USERNAME_MAX_LEN {
            errors.add(
                "username",
                format!(
                    "Ensure this field has no more than {} characters.",
                    USERNAME_MAX_LEN
                ),
            );
        } else if !USERNAME_RE.is_match(u) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
    }

    let email = email.map(str::trim).unwrap_or_default().to_string();
    if !email.is_empty() && !is_valid_email(&email) {
        errors.add("email", "Enter a valid email address.");
    }

    let password = match password {
        None => {
            errors.add("password", REQUIRED);
            None
        }
        Some("") => {
            errors.add("password", BLANK);
            None
        }
        Some(p) => Some(p.to_string()),
    };

    errors.into_result()?;
    match (username, password) {
        (Some(username), Some(password)) => Ok(SignupFields {
            username,
            email,
            password,
        }),
        _ => Err(Error::Internal(
            "signup validation accepted incomplete fields".to_string(),
        )),
    }
}

/// Syntactic email check.
pub fn is_valid_email(email: &str) -> bool {
    email.chars().count() <= EMAIL_MAX_LEN && EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_errors(err: Error) -> FieldErrors {
        match err {
            Error::Validation(fields) => fields,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_note_ok_trims() {
        let draft = validate_note(&NoteInput::new("  Groceries ", "milk\n")).unwrap();
        assert_eq!(draft.title, "Groceries");
        assert_eq!(draft.content, "milk");
    }

    #[test]
    fn test_validate_note_rejects_whitespace_title() {
        let err = validate_note(&NoteInput::new(" \t\n", "body")).unwrap_err();
        let fields = field_errors(err);
        assert_eq!(
            fields.get("title").unwrap(),
            &["Note title cannot be empty".to_string()]
        );
        assert!(fields.get("content").is_none());
    }

    #[test]
    fn test_validate_note_rejects_empty_content() {
        let err = validate_note(&NoteInput::new("title", "")).unwrap_err();
        let fields = field_errors(err);
        assert_eq!(
            fields.get("content").unwrap(),
            &["Note content cannot be empty".to_string()]
        );
    }

    #[test]
    fn test_validate_note_reports_missing_fields() {
        let err = validate_note(&NoteInput::default()).unwrap_err();
        let fields = field_errors(err);
        assert_eq!(fields.get("title").unwrap(), &[REQUIRED.to_string()]);
        assert_eq!(fields.get("content").unwrap(), &[REQUIRED.to_string()]);
    }

    #[test]
    fn test_validate_note_title_length() {
        let at_limit = "a".repeat(TITLE_MAX_LEN);
        assert!(validate_note(&NoteInput::new(at_limit, "c")).is_ok());

        let over = "é".repeat(TITLE_MAX_LEN + 1);
        let fields = field_errors(validate_note(&NoteInput::new(over, "c")).unwrap_err());
        assert!(fields.get("title").unwrap()[0].contains("255"));
    }

    #[test]
    fn test_validate_signup_ok() {
        let fields =
            validate_signup(Some("alice"), Some("alice@example.com"), Some("pw")).unwrap();
        assert_eq!(fields.username, "alice");
        assert_eq!(fields.email, "alice@example.com");
        assert_eq!(fields.password, "pw");
    }

    #[test]
    fn test_validate_signup_email_optional() {
        let fields = validate_signup(Some("bob"), None, Some("pw")).unwrap();
        assert_eq!(fields.email, "");
        assert!(validate_signup(Some("bob"), Some(""), Some("pw")).is_ok());
    }

    #[test]
    fn test_validate_signup_invalid_email() {
        let err = validate_signup(Some("bob"), Some("not-an-email"), Some("pw")).unwrap_err();
        let fields = field_errors(err);
        assert_eq!(
            fields.get("email").unwrap(),
            &["Enter a valid email address.".to_string()]
        );
    }

    #[test]
    fn test_validate_signup_bad_username_chars() {
        let err = validate_signup(Some("bob smith"), None, Some("pw")).unwrap_err();
        assert!(field_errors(err).get("username").is_some());
    }

    #[test]
    fn test_validate_signup_collects_all_errors() {
        let err = validate_signup(None, Some("x@"), Some("")).unwrap_err();
        let fields = field_errors(err);
        assert!(fields.get("username").is_some());
        assert!(fields.get("email").is_some());
        assert_eq!(fields.get("password").unwrap(), &[BLANK.to_string()]);
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@c.com"));
        assert!(!is_valid_email("a@b."));
    }

    #[test]
    fn test_field_errors_display() {
        let mut errors = FieldErrors::new();
        errors.add("b", "second");
        errors.add("a", "first");
        assert_eq!(errors.to_string(), "a: first; b: second");
    }
}
