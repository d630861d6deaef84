//! Phone number formats.
//!
//! Two formats are in play: the sign-up form takes bare digits, while the
//! delivery form takes a mobile number split into three fields and joins it
//! as `AAA-BBBB-CCCC`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Mobile prefixes accepted on the delivery form.
pub const MOBILE_PREFIXES: [&str; 4] = ["010", "011", "016", "017"];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number must contain digits only")]
    NonDigit,
    #[error("phone number must be 10 or 11 digits")]
    Length,
    #[error("unsupported mobile prefix: {0}")]
    Prefix(String),
    #[error("each phone segment must be 3 or 4 digits")]
    Segment,
    #[error("phone number must look like 010-1234-5678")]
    Format,
}

/// Phone number given at sign-up: 10 or 11 digits, no separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignupPhone(String);

impl SignupPhone {
    /// # Errors
    ///
    /// Returns `NonDigit` or `Length` when the input is not 10-11 digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let s = s.trim();
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::NonDigit);
        }
        if !(10..=11).contains(&s.len()) {
            return Err(PhoneError::Length);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Delivery contact number in `AAA-BBBB-CCCC` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeliveryPhone {
    prefix: String,
    middle: String,
    last: String,
}

impl DeliveryPhone {
    /// Build from the three form fields.
    ///
    /// # Errors
    ///
    /// Returns `Prefix` for an unknown mobile prefix and `NonDigit` or
    /// `Segment` when the middle or last part is not 3-4 digits.
    pub fn from_parts(prefix: &str, middle: &str, last: &str) -> Result<Self, PhoneError> {
        let prefix = prefix.trim();
        if !MOBILE_PREFIXES.contains(&prefix) {
            return Err(PhoneError::Prefix(prefix.to_owned()));
        }
        let middle = validate_segment(middle)?;
        let last = validate_segment(last)?;
        Ok(Self {
            prefix: prefix.to_owned(),
            middle,
            last,
        })
    }

    /// Parse the joined `AAA-BBBB-CCCC` form.
    ///
    /// # Errors
    ///
    /// Returns `Format` when the input does not have three dash-separated
    /// parts, otherwise the same errors as [`DeliveryPhone::from_parts`].
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let mut parts = s.trim().split('-');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(middle), Some(last), None) => {
                Self::from_parts(prefix, middle, last)
            }
            _ => Err(PhoneError::Format),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn middle(&self) -> &str {
        &self.middle
    }

    #[must_use]
    pub fn last(&self) -> &str {
        &self.last
    }
}

fn validate_segment(segment: &str) -> Result<String, PhoneError> {
    let segment = segment.trim();
    if !segment.chars().all(|c| c.is_ascii_digit()) {
        return Err(PhoneError::NonDigit);
    }
    if !(3..=4).contains(&segment.len()) {
        return Err(PhoneError::Segment);
    }
    Ok(segment.to_owned())
}

impl fmt::Display for DeliveryPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.prefix, self.middle, self.last)
    }
}

impl TryFrom<String> for DeliveryPhone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DeliveryPhone> for String {
    fn from(phone: DeliveryPhone) -> Self {
        phone.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_phone() {
        assert!(SignupPhone::parse("01012345678").is_ok());
        assert!(SignupPhone::parse("0212345678").is_ok());
        assert_eq!(SignupPhone::parse("010-1234"), Err(PhoneError::NonDigit));
        assert_eq!(SignupPhone::parse("123456789"), Err(PhoneError::Length));
        assert_eq!(SignupPhone::parse("012345678901"), Err(PhoneError::Length));
    }

    #[test]
    fn test_delivery_phone_from_parts() {
        let phone = DeliveryPhone::from_parts("010", "1234", "5678").unwrap();
        assert_eq!(phone.to_string(), "010-1234-5678");
        assert!(DeliveryPhone::from_parts("017", "123", "4567").is_ok());
    }

    #[test]
    fn test_delivery_phone_rejects_prefix() {
        assert_eq!(
            DeliveryPhone::from_parts("019", "1234", "5678"),
            Err(PhoneError::Prefix("019".to_string()))
        );
    }

    #[test]
    fn test_delivery_phone_rejects_segments() {
        assert_eq!(
            DeliveryPhone::from_parts("010", "12345", "5678"),
            Err(PhoneError::Segment)
        );
        assert_eq!(
            DeliveryPhone::from_parts("010", "12a4", "5678"),
            Err(PhoneError::NonDigit)
        );
    }

    #[test]
    fn test_delivery_phone_parse_joined() {
        let phone = DeliveryPhone::parse("011-987-6543").unwrap();
        assert_eq!(phone.prefix(), "011");
        assert_eq!(phone.middle(), "987");
        assert_eq!(phone.last(), "6543");
        assert_eq!(DeliveryPhone::parse("01098765432"), Err(PhoneError::Format));
    }

    #[test]
    fn test_delivery_phone_serde() {
        let phone: DeliveryPhone = serde_json::from_str("\"016-111-2222\"").unwrap();
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"016-111-2222\"");
        assert!(serde_json::from_str::<DeliveryPhone>("\"999-1-2\"").is_err());
    }
}
