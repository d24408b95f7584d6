//! Book field validation
//!
//! Title length, digit-only ISBN, positive price and non-negative stock.

use super::validation::{check_length, ValidationError};

const MIN_TITLE_LEN: usize = 2;
const MAX_TITLE_LEN: usize = 100;
const MIN_ISBN_LEN: usize = 10;
const MAX_ISBN_LEN: usize = 13;

/// Validated book title (2-100 characters)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookTitle(String);

impl BookTitle {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        check_length("title", s, MIN_TITLE_LEN, MAX_TITLE_LEN)?;
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Validated ISBN: 10 to 13 ASCII digits, nothing else.
///
/// # Example
/// ```
/// use bookstore_server::models::Isbn;
///
/// assert!(Isbn::new("9780441013593").is_ok());
/// assert!(Isbn::new("978-0441013593").is_err());
/// assert!(Isbn::new("044101359X").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Isbn(String);

impl Isbn {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        // digit check first so a bad character is reported regardless of length
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidFormat {
                field: "isbn",
                reason: "ISBN must contain only digits",
            });
        }
        check_length("isbn", s, MIN_ISBN_LEN, MAX_ISBN_LEN)?;
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Validated price, strictly greater than zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Price(f64);

impl Price {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "price",
                expected: "greater than 0",
            });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Validated stock count, zero or more
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stock(i32);

impl Stock {
    pub fn new(value: i32) -> Result<Self, ValidationError> {
        if value < 0 {
            return Err(ValidationError::OutOfRange {
                field: "stock",
                expected: "greater than or equal to 0",
            });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i32 {
        self.0
    }
}
