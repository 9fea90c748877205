//! Password policy for new passwords.

use stockdesk_core::config::AuthConfig;
use stockdesk_core::error::AppError;

/// Checks new passwords against length, character-class, and strength rules.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    min_length: usize,
}

impl PasswordValidator {
    /// Create a validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Validate a password. `user_inputs` (email, name, ...) count against
    /// its strength.
    ///
    /// Returns the first violated rule as a `Validation` error.
    pub fn validate(&self, password: &str, user_inputs: &[&str]) -> Result<(), AppError> {
        if password.chars().count() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        let rules: [(fn(char) -> bool, &str); 3] = [
            (char::is_alphabetic, "a letter"),
            (|c| c.is_ascii_digit(), "a digit"),
            (|c| !c.is_alphanumeric(), "a symbol"),
        ];
        for (rule, name) in rules {
            if !password.chars().any(rule) {
                return Err(AppError::validation(format!("Password must contain {name}")));
            }
        }

        let estimate = zxcvbn::zxcvbn(password, user_inputs);
        if estimate.score() < zxcvbn::Score::Three {
            return Err(AppError::validation(
                "Password is too easy to guess; use a longer or less predictable one",
            ));
        }

        Ok(())
    }
}
