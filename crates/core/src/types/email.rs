//! Account email addresses.

use std::fmt;

use serde::Serialize;

/// Why a string was rejected as an account email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    #[error("email is required")]
    Blank,
    #[error("email must be at most {max} characters", max = Email::MAX_LEN)]
    TooLong,
    #[error("email must look like name@domain")]
    Malformed,
}

/// The login identifier of an account.
///
/// Stored trimmed and lower-cased so `Ann@Shop.io` and `ann@shop.io` land on
/// the same unique `users.email` row.
///
/// ```
/// use bazaar_core::Email;
///
/// let email = Email::parse(" Ann@Shop.io ").unwrap();
/// assert_eq!(email.as_str(), "ann@shop.io");
/// assert!(Email::parse("ann.shop.io").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Width of the `users.email` column.
    pub const MAX_LEN: usize = 254;

    /// # Errors
    ///
    /// Returns an [`EmailError`] for blank, oversized or `@`-less input.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let candidate = raw.trim();
        if candidate.is_empty() {
            return Err(EmailError::Blank);
        }
        if candidate.chars().count() > Self::MAX_LEN {
            return Err(EmailError::TooLong);
        }
        match candidate.split_once('@') {
            Some((mailbox, host))
                if !mailbox.is_empty() && !host.is_empty() && !host.contains('@') =>
            {
                Ok(Self(candidate.to_lowercase()))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalises_for_lookup() {
        let email = Email::parse("  Jane.Doe@Example.COM ").unwrap();
        assert_eq!(email, Email::parse("jane.doe@example.com").unwrap());
        assert_eq!(email.to_string(), "jane.doe@example.com");
    }

    #[test]
    fn test_rejections() {
        assert_eq!(Email::parse("   "), Err(EmailError::Blank));
        assert_eq!(Email::parse("no-at-sign"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("@shop.io"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("ann@"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("a@b@c"), Err(EmailError::Malformed));

        let long = format!("{}@shop.io", "a".repeat(250));
        assert_eq!(Email::parse(&long), Err(EmailError::TooLong));
        assert_eq!(
            EmailError::TooLong.to_string(),
            "email must be at most 254 characters"
        );
    }

    #[test]
    fn test_serializes_as_string() {
        let email = Email::parse("ann@shop.io").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"ann@shop.io\"");
    }
}
