//! Validated text types shared by the report crates.

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input text has fewer characters than allowed
    #[error("Text must be at least {min} characters")]
    TooShort { min: usize },
    /// The input text has more characters than allowed
    #[error("Text cannot exceed {max} characters")]
    TooLong { max: usize },
}

/// A string type that guarantees non-empty content.
///
/// Construction trims leading and trailing whitespace. Use [`NonEmptyText::bounded`] when the
/// value must also fall inside a character-count range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText`, rejecting input that is empty after trimming.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Creates a new `NonEmptyText` whose untrimmed length lies within `min..=max` characters.
    ///
    /// Lengths are counted in `char`s on the raw input, so surrounding whitespace counts
    /// towards the bound while the stored value is still trimmed.
    pub fn bounded(input: impl AsRef<str>, min: usize, max: usize) -> Result<Self, TextError> {
        let raw = input.as_ref();
        let text = Self::new(raw)?;

        let len = raw.chars().count();
        if len < min {
            return Err(TextError::TooShort { min });
        }
        if len > max {
            return Err(TextError::TooLong { max });
        }

        Ok(text)
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
