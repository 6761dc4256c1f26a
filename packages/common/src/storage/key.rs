use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Top-level namespace for uploaded file blobs.
const FILES_PREFIX: &str = "files";

/// Maximum key length accepted by S3-compatible services.
const MAX_KEY_LEN: usize = 1024;

/// A validated blob key.
///
/// Keys are `/`-separated segments of `[A-Za-z0-9._-]`. Empty segments and
/// `.`/`..` are rejected so a key always maps to a single object, whether the
/// backend is a bucket or a directory tree.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlobKey(String);

impl BlobKey {
    /// Build an owner-scoped key: `files/{owner}/{name}`.
    pub fn scoped(owner: &str, name: &str) -> Result<Self, StorageError> {
        Self::parse(&format!("{FILES_PREFIX}/{owner}/{name}"))
    }

    /// Parse and validate a key string.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.is_empty() {
            return Err(StorageError::InvalidKey("key cannot be empty".into()));
        }
        if s.len() > MAX_KEY_LEN {
            return Err(StorageError::InvalidKey(format!(
                "key exceeds {MAX_KEY_LEN} bytes"
            )));
        }

        for segment in s.split('/') {
            if segment.is_empty() {
                return Err(StorageError::InvalidKey("empty path segment".into()));
            }
            if segment == "." || segment == ".." {
                return Err(StorageError::InvalidKey(
                    "relative path segments are not allowed".into(),
                ));
            }
            if !segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
            {
                return Err(StorageError::InvalidKey(format!(
                    "invalid character in segment '{segment}'"
                )));
            }
        }

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the `/`-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({})", self.0)
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for BlobKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BlobKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
