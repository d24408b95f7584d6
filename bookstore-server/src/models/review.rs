//! Review field validation

use super::validation::ValidationError;

const MAX_COMMENT_LEN: usize = 500;

/// Validated star rating, 1 through 5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating(i32);

impl Rating {
    pub fn new(value: i32) -> Result<Self, ValidationError> {
        if !(1..=5).contains(&value) {
            return Err(ValidationError::OutOfRange {
                field: "rating",
                expected: "between 1 and 5",
            });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

/// Validated review comment (at most 500 characters, may be empty)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment(String);

impl Comment {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.chars().count() > MAX_COMMENT_LEN {
            return Err(ValidationError::TooLong {
                field: "comment",
                max: MAX_COMMENT_LEN,
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}
