mod parsers;

use crate::error::ApiResult;
use flicks_dal::{movie::MovieFilter, Batch, ListingParams};
use flicks_types::{validator::permitted_value, Validator};
use garde::Validate;
use serde::Serialize;

const SORT_SAFELIST: &[&str] = flicks_dal::movie::SORTABLE_FIELDS;

/// Query string of the movie listing.
#[derive(Debug, Clone, Default, Validate, serde::Deserialize)]
#[garde(allow_unvalidated)]
pub struct Filters {
    title: Option<String>,
    genres: Option<String>,
    #[garde(range(min = 1, max = 10_000_000))]
    page: Option<u32>,
    #[garde(range(min = 1, max = 100))]
    page_size: Option<u32>,
    #[garde(length(max = 255))]
    sort: Option<String>,
}

impl Filters {
    pub fn page_size(&self, default_page_size: u32) -> u32 {
        self.page_size.unwrap_or(default_page_size)
    }

    pub fn movie_filter(&self) -> MovieFilter {
        MovieFilter {
            title: self.title.clone().unwrap_or_default(),
            genres: self
                .genres
                .as_deref()
                .map(parsers::parse_genres)
                .unwrap_or_default(),
        }
    }

    pub fn into_listing_params(self, default_page_size: u32) -> ApiResult<ListingParams> {
        let page = i64::from(self.page.unwrap_or(1));
        let page_size = i64::from(self.page_size(default_page_size));
        let mut params = ListingParams::new((page - 1) * page_size, page_size);

        if let Some(sort) = self.sort {
            let order = parsers::parse_ordering(&sort)?;
            let mut v = Validator::new();
            for o in &order {
                v.check(
                    permitted_value(&o.as_ref(), SORT_SAFELIST),
                    "sort",
                    "invalid sort value",
                );
            }
            v.into_result()?;
            params = params.with_order(order);
        }

        Ok(params)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    page: u64,
    page_size: u64,
    total_pages: u64,
    total: u64,
}

impl Metadata {
    pub fn from_batch<T>(batch: &Batch<T>, page_size: u32) -> Self {
        let page_size = u64::from(page_size.max(1));
        let offset = u64::try_from(batch.offset).unwrap_or_default();
        Self {
            page: offset / page_size + 1,
            page_size,
            total_pages: batch.total.div_ceil(page_size),
            total: batch.total,
        }
    }
}
