//! Paging parameters and paged responses.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationErrors};

use crate::{dao::models::CarPageEntity, dto::car::CarResponse};

/// Zero-based index of the page returned when the client omits `page`.
pub const DEFAULT_PAGE: i64 = 0;
/// Page size used when the client omits `size`.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

fn default_page() -> i64 {
    DEFAULT_PAGE
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// `page` / `size` query parameters of listing endpoints.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PageRequest {
    /// Zero-based page index.
    #[serde(default = "default_page")]
    #[validate(range(min = 0, message = "Page has to be greater or equal to 0"))]
    pub page: i64,
    /// Number of items per page.
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, message = "Size has to be greater or equal to 1"))]
    pub size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Validated zero-based page index and page size.
    pub fn bounds(&self) -> Result<(u64, u64), ValidationErrors> {
        self.validate()?;
        Ok((self.page.unsigned_abs(), self.size.unsigned_abs()))
    }
}

/// Position of the returned page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    pub page_number: u64,
    pub page_size: u64,
}

/// One page of cars plus totals across the whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarPageResponse {
    pub content: Vec<CarResponse>,
    pub pageable: Pageable,
    pub total_pages: u64,
    pub total_elements: u64,
}

impl CarPageResponse {
    pub fn from_page(page: CarPageEntity, page_number: u64, page_size: u64) -> Self {
        Self {
            content: page.items.into_iter().map(Into::into).collect(),
            pageable: Pageable {
                page_number,
                page_size,
            },
            total_pages: page.total_pages,
            total_elements: page.total_elements,
        }
    }
}
