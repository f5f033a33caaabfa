//! Offset pagination parameters shared by listing endpoints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `?skip=&limit=` query parameters.
///
/// `skip` must be zero or more and `limit` within `1..=MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub skip: i64,
    pub limit: i64,
}

/// Pagination parameter out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("skip must be greater than or equal to 0")]
    NegativeSkip,
    #[error("limit must be between 1 and {max}", max = PageParams::MAX_LIMIT)]
    LimitOutOfRange,
}

impl PageParams {
    /// Largest page a client may request.
    pub const MAX_LIMIT: i64 = 100;

    /// Validate, using `default_limit` when no limit was given.
    ///
    /// # Errors
    ///
    /// Returns `PageError` for a negative `skip` or a `limit` outside
    /// `1..=MAX_LIMIT`.
    pub fn window(self, default_limit: i64) -> Result<Window, PageError> {
        let skip = self.skip.unwrap_or(0);
        if skip < 0 {
            return Err(PageError::NegativeSkip);
        }

        let limit = self.limit.unwrap_or(default_limit);
        if !(1..=Self::MAX_LIMIT).contains(&limit) {
            return Err(PageError::LimitOutOfRange);
        }

        Ok(Window { skip, limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(skip: Option<i64>, limit: Option<i64>) -> PageParams {
        PageParams { skip, limit }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            params(None, None).window(10),
            Ok(Window { skip: 0, limit: 10 })
        );
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert_eq!(
            params(Some(0), Some(1)).window(10),
            Ok(Window { skip: 0, limit: 1 })
        );
        assert_eq!(
            params(Some(20), Some(100)).window(10),
            Ok(Window {
                skip: 20,
                limit: 100
            })
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(
            params(Some(-5), None).window(10),
            Err(PageError::NegativeSkip)
        );
        assert_eq!(
            params(None, Some(0)).window(10),
            Err(PageError::LimitOutOfRange)
        );
        assert_eq!(
            params(None, Some(1000)).window(10),
            Err(PageError::LimitOutOfRange)
        );
    }

    #[test]
    fn test_error_message_names_bound() {
        assert_eq!(
            PageError::LimitOutOfRange.to_string(),
            "limit must be between 1 and 100"
        );
    }
}
