//! Input sanitization for participant names and wishlists.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Character outside the allowed set.
    InvalidCharacter { field: String, found: char },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::InvalidCharacter { field, found } => {
                write!(f, "{} contains an invalid character '{}'", field, found)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for participant names.
pub const MAX_NAME_LENGTH: usize = 100;

/// Wishlists longer than this are truncated.
pub const MAX_WISHLIST_LENGTH: usize = 1000;

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == ' ' || c == '-' || c == '\''
}

/// Validate and escape a participant name.
///
/// The name is trimmed, must be 1 to 100 characters of word characters,
/// spaces, hyphens or apostrophes, and is returned HTML-escaped.
pub fn sanitize_name(input: &str) -> Result<String, ValidationError> {
    let name = input.trim();

    if name.is_empty() {
        return Err(ValidationError::Empty("name".to_string()));
    }

    let length = name.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
            actual: length,
        });
    }

    if let Some(found) = name.chars().find(|c| !is_name_char(*c)) {
        return Err(ValidationError::InvalidCharacter {
            field: "name".to_string(),
            found,
        });
    }

    Ok(html_escape::encode_safe(name).into_owned())
}

/// Escape a wishlist, truncating it to the maximum length.
///
/// Never fails: overlong input is cut at a character boundary before
/// escaping so entities are never split.
pub fn sanitize_wishlist(input: &str) -> String {
    let trimmed = input.trim();
    let truncated = match trimmed.char_indices().nth(MAX_WISHLIST_LENGTH) {
        Some((cut, _)) => &trimmed[..cut],
        None => trimmed,
    };
    html_escape::encode_safe(truncated).into_owned()
}
