//! Account field validation
//!
//! Every check returns the user-facing message carried by a `400` response.

use regex::Regex;
use std::sync::OnceLock;

const LOGIN_LENGTH: (usize, usize) = (3, 32);
const MAIL_MAX_LENGTH: usize = 254;
const PASSWORD_LENGTH: (usize, usize) = (8, 128);

/// Character classes a password must contain, with the message for a missing one
const PASSWORD_CLASSES: [(fn(&char) -> bool, &str); 3] = [
    (char::is_ascii_uppercase, "uppercase letter"),
    (char::is_ascii_lowercase, "lowercase letter"),
    (char::is_ascii_digit, "digit"),
];

fn mail_pattern() -> &'static Regex {
    static MAIL: OnceLock<Regex> = OnceLock::new();
    MAIL.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,7}$")
            .expect("mail pattern is a valid regex")
    })
}

fn check_length(field: &str, value: &str, (min, max): (usize, usize)) -> Result<(), String> {
    match value.len() {
        0 => Err(format!("{} is required", field)),
        n if n < min => Err(format!("{} must be at least {} characters long", field, min)),
        n if n > max => Err(format!("{} must be at most {} characters long", field, max)),
        _ => Ok(()),
    }
}

/// Letters, digits and underscores, 3 to 32 characters
pub fn validate_login(login: &str) -> Result<(), String> {
    check_length("Login", login, LOGIN_LENGTH)?;

    if !login.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("Login can only contain letters, numbers, and underscores".to_string());
    }
    Ok(())
}

pub fn validate_email(mail: &str) -> Result<(), String> {
    check_length("Email", mail, (1, MAIL_MAX_LENGTH))?;

    if !mail_pattern().is_match(mail) {
        return Err("wrong email address".to_string());
    }
    Ok(())
}

/// 8 to 128 characters mixing upper case, lower case and digits
pub fn validate_password(password: &str) -> Result<(), String> {
    check_length("Password", password, PASSWORD_LENGTH)?;

    for (is_class, name) in PASSWORD_CLASSES {
        if !password.chars().any(|c| is_class(&c)) {
            return Err(format!("Password must contain at least one {}", name));
        }
    }
    Ok(())
}

/// Sign-up fields, mail first so a bad address is reported whatever else is wrong
pub fn validate_signup(login: &str, mail: &str, password: &str) -> Result<(), String> {
    validate_email(mail)?;
    validate_login(login)?;
    validate_password(password)
}
