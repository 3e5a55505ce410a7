use std::collections::BTreeMap;
use std::fmt;

use crate::domain::Cents;

/// Minimum number of letters, digits, symbols and spaces in a password.
pub const MIN_PASSWORD_CHARS: usize = 7;

/// Largest amount a single operation may carry (100 billion units).
pub const MAX_AMOUNT_CENTS: Cents = 10_000_000_000_000;

/// Field name -> message for every rejected field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Input for registering a user.
#[derive(Debug, Clone)]
pub struct Registration {
    pub login: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub birth: chrono::NaiveDate,
}

/// Character classes found in a password.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PasswordStrength {
    pub counted_chars: usize,
    pub has_digit: bool,
    pub has_upper: bool,
    pub has_special: bool,
}

impl PasswordStrength {
    pub fn of(password: &str) -> Self {
        let mut strength = Self::default();
        for c in password.chars() {
            if c.is_numeric() {
                strength.has_digit = true;
            } else if c.is_uppercase() {
                strength.has_upper = true;
            } else if is_special(c) {
                strength.has_special = true;
            } else if !(c.is_alphabetic() || c == ' ') {
                continue;
            }
            strength.counted_chars += 1;
        }
        strength
    }

    pub fn is_strong(&self) -> bool {
        self.counted_chars >= MIN_PASSWORD_CHARS
            && self.has_digit
            && self.has_upper
            && self.has_special
    }
}

fn is_special(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c,
            '€' | '£' | '¥' | '₽' | '¢' | '§' | '¶' | '°' | '±' | '×' | '÷' | '№' | '«' | '»' | '…'
        )
}

pub fn validate_operation(subject: &str, amount_cents: Cents) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if subject.trim().is_empty() {
        errors.add("subject", "enter a subject");
    }
    if amount_cents <= 0 {
        errors.add("amount", "enter a positive amount");
    } else if amount_cents > MAX_AMOUNT_CENTS {
        errors.add("amount", "amount is too large");
    }
    errors.into_result()
}

pub fn validate_credentials(login: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if login.trim().is_empty() {
        errors.add("login", "enter a login");
    }
    if password.trim().is_empty() {
        errors.add("password", "enter a password");
    }
    errors.into_result()
}

pub fn validate_registration(form: &Registration) -> Result<(), ValidationErrors> {
    let mut errors = match validate_credentials(&form.login, &form.password) {
        Ok(()) => ValidationErrors::default(),
        Err(errors) => errors,
    };

    if form.confirm_password.trim().is_empty() {
        errors.add("confirm_password", "enter the password again");
    } else if form.confirm_password != form.password {
        errors.add("confirm_password", "passwords do not match");
    }
    if errors.get("password").is_none() && !PasswordStrength::of(&form.password).is_strong() {
        errors.add(
            "password",
            format!(
                "password needs at least {} characters, a digit, an uppercase letter and a symbol",
                MIN_PASSWORD_CHARS
            ),
        );
    }
    if form.name.trim().is_empty() {
        errors.add("name", "enter your name");
    }
    errors.into_result()
}
