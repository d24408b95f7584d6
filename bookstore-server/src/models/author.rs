//! Author field validation

use super::validation::{check_length, ValidationError};

const MIN_NAME_LEN: usize = 2;
const MAX_NAME_LEN: usize = 100;

/// Validated author name (2-100 characters)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorName(String);

impl AuthorName {
    /// Create a new author name.
    ///
    /// # Example
    /// ```
    /// use bookstore_server::models::AuthorName;
    ///
    /// assert!(AuthorName::new("Ursula K. Le Guin").is_ok());
    /// assert!(AuthorName::new("U").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        check_length("name", s, MIN_NAME_LEN, MAX_NAME_LEN)?;
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        assert!(AuthorName::new("Al").is_ok());
        assert!(AuthorName::new(&"a".repeat(100)).is_ok());
        assert!(matches!(
            AuthorName::new("A").unwrap_err(),
            ValidationError::TooShort { min: 2, .. }
        ));
        assert!(matches!(
            AuthorName::new(&"a".repeat(101)).unwrap_err(),
            ValidationError::TooLong { max: 100, .. }
        ));
    }

    #[test]
    fn keeps_input_verbatim() {
        let name = AuthorName::new("  Spaced  ").unwrap();
        assert_eq!(name.as_str(), "  Spaced  ");
    }
}
