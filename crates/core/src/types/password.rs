//! Sign-up password rules.

use core::fmt;

/// Errors returned by [`Password::parse`] and [`Password::confirm`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },
    #[error("password must contain at least one digit")]
    MissingDigit,
    #[error("passwords do not match")]
    Mismatch,
}

/// A password that satisfies the sign-up rules.
///
/// The value is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub const MIN_LENGTH: usize = 8;

    /// Validate a candidate password.
    ///
    /// # Errors
    ///
    /// Returns `TooShort` below eight characters and `MissingDigit` when no
    /// ASCII digit is present.
    pub fn parse(s: &str) -> Result<Self, PasswordError> {
        if s.chars().count() < Self::MIN_LENGTH {
            return Err(PasswordError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if !s.chars().any(|c| c.is_ascii_digit()) {
            return Err(PasswordError::MissingDigit);
        }
        Ok(Self(s.to_owned()))
    }

    /// Check that the confirmation field repeats the password.
    ///
    /// # Errors
    ///
    /// Returns `Mismatch` when the two differ.
    pub fn confirm(&self, confirmation: &str) -> Result<(), PasswordError> {
        if self.0 == confirmation {
            Ok(())
        } else {
            Err(PasswordError::Mismatch)
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}
