//! Offset/limit pagination parameters.

use crate::error::ApiError;
use crate::http::Params;

/// Largest page the platform serves.
pub const MAX_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    offset: u32,
    limit: u32,
}

impl Pagination {
    pub fn new(offset: u32, limit: u32) -> Result<Self, ApiError> {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(ApiError::Validation(format!(
                "page limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        Ok(Self { offset, limit })
    }

    /// Parse caller-supplied strings, as they arrive from query strings or CLIs.
    pub fn parse(offset: &str, limit: &str) -> Result<Self, ApiError> {
        let offset = offset.trim().parse::<u32>().map_err(|_| {
            ApiError::Validation(format!("page offset must be a non-negative integer, got '{offset}'"))
        })?;
        let limit = limit.trim().parse::<u32>().map_err(|_| {
            ApiError::Validation(format!("page limit must be a positive integer, got '{limit}'"))
        })?;
        Self::new(offset, limit)
    }

    pub fn offset(self) -> u32 {
        self.offset
    }

    pub fn limit(self) -> u32 {
        self.limit
    }

    pub fn append_to(self, params: &mut Params) {
        params.push(("offset".to_string(), self.offset.to_string()));
        params.push(("limit".to_string(), self.limit.to_string()));
    }

    pub fn to_params(self) -> Params {
        let mut params = Params::new();
        self.append_to(&mut params);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_page_emits_offset_and_limit() {
        let page = Pagination::new(50, 25).unwrap();
        assert_eq!(
            page.to_params(),
            vec![
                ("offset".to_string(), "50".to_string()),
                ("limit".to_string(), "25".to_string())
            ]
        );
    }

    #[test]
    fn limit_bounds_are_enforced() {
        assert!(Pagination::new(0, 0).is_err());
        assert!(Pagination::new(0, MAX_LIMIT + 1).is_err());
        assert!(Pagination::new(0, MAX_LIMIT).is_ok());
    }

    #[test]
    fn parse_rejects_negative_offsets() {
        assert!(matches!(Pagination::parse("-1", "10"), Err(ApiError::Validation(_))));
        assert!(matches!(Pagination::parse("0", "ten"), Err(ApiError::Validation(_))));
        assert_eq!(Pagination::parse(" 5 ", "10").unwrap().offset(), 5);
    }
}
