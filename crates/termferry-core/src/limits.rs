//! Content-type and size limits applied to both transfer directions.

use crate::error::Rejection;

/// Content types accepted by default
pub const DEFAULT_ALLOWED_TYPES: &[&str] = &["text/plain", "application/json", "text/x-python"];

/// Default size ceiling (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Allow-set and size ceiling for transferred files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLimits {
    allowed_types: Vec<String>,
    max_file_size: u64,
}

impl Default for TransferLimits {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_TYPES.iter().copied(), DEFAULT_MAX_FILE_SIZE)
    }
}

/// Lowercase essence of a MIME type (`Text/Plain; charset=utf-8` -> `text/plain`)
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

impl TransferLimits {
    /// Create limits from an allow-set and a size ceiling
    pub fn new<I, S>(allowed_types: I, max_file_size: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_types: allowed_types
                .into_iter()
                .map(|t| essence(t.as_ref()))
                .collect(),
            max_file_size,
        }
    }

    /// Accepted content types
    #[must_use]
    pub fn allowed_types(&self) -> &[String] {
        &self.allowed_types
    }

    /// Size ceiling in bytes
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Check a content type against the allow-set
    pub fn check_type(&self, content_type: &str) -> Result<(), Rejection> {
        let essence = essence(content_type);
        if self.allowed_types.iter().any(|t| *t == essence) {
            Ok(())
        } else {
            Err(Rejection::UnsupportedType(content_type.to_string()))
        }
    }

    /// Check a size against the ceiling (inclusive)
    pub fn check_size(&self, size: u64) -> Result<(), Rejection> {
        if size > self.max_file_size {
            Err(Rejection::TooLarge {
                size,
                limit: self.max_file_size,
            })
        } else {
            Ok(())
        }
    }

    /// Type check, then size check
    pub fn check(&self, content_type: &str, size: u64) -> Result<(), Rejection> {
        self.check_type(content_type)?;
        self.check_size(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allow_set() {
        let limits = TransferLimits::default();
        assert!(limits.check_type("text/plain").is_ok());
        assert!(limits.check_type("application/json").is_ok());
        assert!(limits.check_type("text/x-python").is_ok());
        assert!(limits.check_type("Text/Plain; charset=utf-8").is_ok());
        assert_eq!(
            limits.check_type("image/png"),
            Err(Rejection::UnsupportedType("image/png".into()))
        );
        assert!(limits.check_type("").is_err());
    }

    #[test]
    fn test_size_ceiling_is_inclusive() {
        let limits = TransferLimits::default();
        assert!(limits.check_size(10_485_760).is_ok());
        assert_eq!(
            limits.check_size(10_485_761),
            Err(Rejection::TooLarge {
                size: 10_485_761,
                limit: 10_485_760
            })
        );
    }

    #[test]
    fn test_type_checked_before_size() {
        let limits = TransferLimits::new(["text/plain"], 4);
        assert!(matches!(
            limits.check("image/png", 100),
            Err(Rejection::UnsupportedType(_))
        ));
        assert!(matches!(
            limits.check("text/plain", 100),
            Err(Rejection::TooLarge { .. })
        ));
        assert!(limits.check("text/plain", 4).is_ok());
    }
}
