// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE: i64 = 1_000_000;

/// Corpo de `POST /<entidade>/pagination`: `{ "page": 1, "pageSize": 10 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default = "first_page")]
    #[validate(range(min = 1, max = 1_000_000, message = "A página deve estar entre 1 e 1000000."))]
    #[schema(example = 1)]
    pub page: i64,

    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "O tamanho da página deve estar entre 1 e 100."))]
    #[schema(example = 10)]
    pub page_size: i64,
}

fn first_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: first_page(), page_size: default_page_size() }
    }
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page.clamp(1, MAX_PAGE) - 1) * self.limit()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Page<T> {
    pub total: i64,
    pub rows: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_zero_based_from_page_one() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 25).offset(), 50);
        assert_eq!(PageRequest::new(3, 25).limit(), 25);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let request: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, PageRequest::default());

        let request: PageRequest = serde_json::from_str(r#"{"page": 2, "pageSize": 5}"#).unwrap();
        assert_eq!(request, PageRequest::new(2, 5));
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        assert!(PageRequest::new(0, 10).validate().is_err());
        assert!(PageRequest::new(1, 0).validate().is_err());
        assert!(PageRequest::new(1, 101).validate().is_err());
        assert!(PageRequest::new(1, 100).validate().is_ok());
        assert!(PageRequest::new(i64::MAX, 100).validate().is_err());
        assert!(PageRequest::new(MAX_PAGE, 100).validate().is_ok());
    }

    #[test]
    fn huge_pages_never_overflow_the_offset() {
        assert_eq!(PageRequest::new(i64::MAX, 100).offset(), (MAX_PAGE - 1) * 100);
        assert_eq!(PageRequest::new(i64::MIN, 100).offset(), 0);
    }
}
