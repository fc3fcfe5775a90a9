//! Form input and validation.
//!
//! Each form collects every field error before returning, so the user sees
//! all problems at once. Validation happens before any network call.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use dummymart_core::{Email, Password, Username};

/// A form field that can carry an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Username,
    Email,
    Password,
    Name,
    Message,
}

impl Field {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Username => "Username",
            Self::Email => "Email",
            Self::Password => "Password",
            Self::Name => "Name",
            Self::Message => "Message",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, String>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; the first error for a field wins.
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    /// `Ok(value)` if no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field failed.
    pub fn into_result<T>(self, value: impl FnOnce() -> Option<T>) -> Result<T, Self> {
        if !self.is_empty() {
            return Err(self);
        }
        value().ok_or(self)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for message in self.errors.values() {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

fn required(errors: &mut ValidationErrors, field: Field, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, format!("{field} is required"));
        return false;
    }
    true
}

fn email_field(errors: &mut ValidationErrors, raw: &str) -> Option<Email> {
    if !required(errors, Field::Email, raw) {
        return None;
    }
    match Email::parse(raw.trim()) {
        Ok(email) => Some(email),
        Err(_) => {
            errors.add(Field::Email, "Enter a valid email address");
            None
        }
    }
}

// =============================================================================
// Login
// =============================================================================

/// Raw login input.
#[derive(Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl LoginForm {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields must be non-blank. The password is otherwise sent as
    /// typed.
    ///
    /// # Errors
    ///
    /// Returns the blank fields.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, Field::Username, &self.username);
        required(&mut errors, Field::Password, &self.password);
        errors.into_result(|| Some(()))
    }
}

// =============================================================================
// Sign-up
// =============================================================================

/// Raw sign-up input.
#[derive(Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Sign-up input that passed validation.
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub username: Username,
    pub email: Email,
    pub password: Password,
}

impl SignupForm {
    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns one message per failing field.
    pub fn validate(&self) -> Result<ValidSignup, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = Username::parse(self.username.trim())
            .map_err(|e| errors.add(Field::Username, e.to_string()))
            .ok();
        let email = email_field(&mut errors, &self.email);
        let password = Password::parse(&self.password)
            .map_err(|e| errors.add(Field::Password, e.to_string()))
            .ok();

        errors.into_result(|| {
            Some(ValidSignup {
                username: username?,
                email: email?,
                password: password?,
            })
        })
    }
}

// =============================================================================
// Contact
// =============================================================================

/// Raw contact-form input.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// A validated contact message, as posted to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: Email,
    pub message: String,
}

impl ContactForm {
    /// All fields are required and the email must be well-formed.
    ///
    /// # Errors
    ///
    /// Returns one message per failing field.
    pub fn validate(&self) -> Result<ContactMessage, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        required(&mut errors, Field::Name, &self.name);
        let email = email_field(&mut errors, &self.email);
        required(&mut errors, Field::Message, &self.message);

        errors.into_result(|| {
            Some(ContactMessage {
                name: self.name.trim().to_string(),
                email: email?,
                message: self.message.trim().to_string(),
            })
        })
    }
}
