/// Longest display name accepted, in bytes.
pub const MAX_DISPLAY_NAME_LEN: usize = 255;

/// Result of validating an uploaded file's display name.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    /// Name is empty or whitespace-only.
    Empty,
    /// Name is longer than [`MAX_DISPLAY_NAME_LEN`] bytes.
    TooLong,
    /// Name contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Name is `.` or `..`.
    PathTraversal,
    /// Name contains control characters (CR, LF, NUL, etc.).
    ControlCharacter,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::TooLong => "Filename exceeds 255 bytes",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '.' and '..' are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

/// Validates a display name and returns it trimmed.
///
/// The name is opaque to storage, but it is echoed back in
/// `Content-Disposition`, so anything that could break the header is refused.
pub fn validate_display_name(name: &str) -> Result<&str, FilenameError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.len() > MAX_DISPLAY_NAME_LEN {
        return Err(FilenameError::TooLong);
    }

    // Covers NUL and CRLF header injection.
    if trimmed.chars().any(char::is_control) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == "." || trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    Ok(trimmed)
}
