//! Small enums mirrored from backend string values.

use serde::{Deserialize, Serialize};

/// Role carried in the access token's `auth` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[default]
    #[serde(rename = "ROLE_USER", other)]
    User,
}

impl Role {
    /// Parse a claim value. Unknown roles are treated as ordinary users.
    #[must_use]
    pub fn from_claim(claim: &str) -> Self {
        if claim.split(',').any(|part| part.trim() == "ROLE_ADMIN") {
            Self::Admin
        } else {
            Self::User
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// How a coupon discounts a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponKind {
    /// Fixed amount off.
    Amount,
    /// Percentage of the unit price.
    #[serde(other)]
    Percentage,
}

/// `"Y"`/`"N"` flag used by the address API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum YesNo {
    #[serde(rename = "Y")]
    Yes,
    #[default]
    #[serde(rename = "N")]
    No,
}

impl YesNo {
    #[must_use]
    pub const fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value { Self::Yes } else { Self::No }
    }
}
