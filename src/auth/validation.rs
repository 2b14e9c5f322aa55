//! Form validation
//!
//! Field-level checks for the login and signup forms. Every failing field gets one message.

use std::{collections::BTreeMap, fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^01[0-9]-?[0-9]{4}-?[0-9]{4}$").expect("valid phone pattern"));

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Minimum display name length.
pub const MIN_NAME_LEN: usize = 2;

/// Form fields that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// Email address
    Email,

    /// Password
    Password,

    /// Password confirmation
    ConfirmPassword,

    /// Display name
    Name,

    /// Mobile number
    Phone,

    /// Terms of service consent
    AgreeTerms,

    /// Privacy policy consent
    AgreePrivacy,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Email => "email",
            Field::Password => "password",
            Field::ConfirmPassword => "confirmPassword",
            Field::Name => "name",
            Field::Phone => "phone",
            Field::AgreeTerms => "agreeTerms",
            Field::AgreePrivacy => "agreePrivacy",
        })
    }
}

/// Validation messages keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    /// Whether no field failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for a field, if it failed.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Record a failure. The first message for a field wins.
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Failing fields and their messages.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// `Ok(())` when empty, otherwise the errors.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (field, message)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }

            write!(f, "{field}: {message}")?;
        }

        Ok(())
    }
}

pub(crate) fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.is_empty() {
        errors.insert(Field::Email, "Please enter your email.");
    } else if !EMAIL.is_match(email) {
        errors.insert(Field::Email, "Please enter a valid email address.");
    }
}

pub(crate) fn check_password(errors: &mut FieldErrors, field: Field, password: &str) {
    if password.is_empty() {
        errors.insert(field, "Please enter a password.");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(
            field,
            format!("Passwords must be at least {MIN_PASSWORD_LEN} characters."),
        );
    }
}

pub(crate) fn check_name(errors: &mut FieldErrors, name: &str) {
    if name.is_empty() {
        errors.insert(Field::Name, "Please enter your name.");
    } else if name.chars().count() < MIN_NAME_LEN {
        errors.insert(
            Field::Name,
            format!("Names must be at least {MIN_NAME_LEN} characters."),
        );
    }
}

pub(crate) fn check_phone(errors: &mut FieldErrors, phone: &str) {
    if phone.is_empty() {
        errors.insert(Field::Phone, "Please enter your mobile number.");
    } else if !is_valid_phone(phone) {
        errors.insert(Field::Phone, "Please enter a valid mobile number.");
    }
}

/// Whether a mobile number looks like `010-1234-5678` (dashes optional).
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE.is_match(&phone.replace('-', ""))
}

/// Whether an email address is well formed.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Email login form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Email address
    pub email: String,

    /// Password
    pub password: String,
}

impl LoginForm {
    /// Create a login form.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Check every field.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();

        check_email(&mut errors, &self.email);
        check_password(&mut errors, Field::Password, &self.password);

        errors
    }
}

/// Account signup form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    /// Email address
    pub email: String,

    /// Password
    pub password: String,

    /// Password, typed again
    pub confirm_password: String,

    /// Display name
    pub name: String,

    /// Mobile number
    pub phone: String,

    /// Birth date, free-form
    pub birth_date: Option<String>,

    /// Accepted the terms of service
    pub agree_terms: bool,

    /// Accepted the privacy policy
    pub agree_privacy: bool,

    /// Opted into marketing messages
    pub agree_marketing: bool,
}

impl SignupForm {
    /// Check every field.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();

        check_email(&mut errors, &self.email);
        check_password(&mut errors, Field::Password, &self.password);

        if self.confirm_password.is_empty() {
            errors.insert(Field::ConfirmPassword, "Please confirm your password.");
        } else if self.confirm_password != self.password {
            errors.insert(Field::ConfirmPassword, "Passwords do not match.");
        }

        check_name(&mut errors, &self.name);
        check_phone(&mut errors, &self.phone);

        if !self.agree_terms {
            errors.insert(Field::AgreeTerms, "Please accept the terms of service.");
        }

        if !self.agree_privacy {
            errors.insert(Field::AgreePrivacy, "Please accept the privacy policy.");
        }

        errors
    }
}
