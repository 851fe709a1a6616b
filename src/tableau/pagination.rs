//! Paginated listings
//!
//! Tableau list endpoints return one page at a time together with a
//! `pagination` block. [`Pager`] walks those pages lazily and [`find_first`]
//! stops fetching as soon as an item matches.

use eyre::Result;
use serde::{Deserialize, Deserializer};
use std::future::Future;

/// Page size used when none is given
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// One page of a listing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub number: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn first(size: u32) -> Self {
        Self {
            number: 1,
            size: size.max(1),
        }
    }

    pub fn next(self) -> Self {
        Self {
            number: self.number + 1,
            size: self.size,
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("pageSize", self.size.to_string()),
            ("pageNumber", self.number.to_string()),
        ]
    }
}

/// The `pagination` block of a listing response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(deserialize_with = "number_from_string")]
    pub page_number: u32,
    #[serde(deserialize_with = "number_from_string")]
    pub page_size: u32,
    #[serde(deserialize_with = "number_from_string")]
    pub total_available: u32,
}

/// A fetched page of items
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// True when no further page can hold items
    pub fn is_last(&self) -> bool {
        let Pagination {
            page_number,
            page_size,
            total_available,
        } = self.pagination;
        self.items.is_empty()
            || u64::from(page_number) * u64::from(page_size) >= u64::from(total_available)
    }
}

/// A listing that can be fetched one page at a time
pub trait PageSource: Send + Sync {
    type Item: Send;

    fn fetch_page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Page<Self::Item>>> + Send;
}

/// Lazy walk over every page of a [`PageSource`]
pub struct Pager<'a, S> {
    source: &'a S,
    next: Option<PageRequest>,
}

impl<'a, S: PageSource> Pager<'a, S> {
    pub fn new(source: &'a S, page_size: u32) -> Self {
        Self {
            source,
            next: Some(PageRequest::first(page_size)),
        }
    }

    /// Fetch the next page, or `None` once the listing is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<S::Item>>> {
        let Some(request) = self.next else {
            return Ok(None);
        };

        let page = self.source.fetch_page(request).await?;
        log::trace!(
            "Fetched page {} ({} item(s), {} available)",
            request.number,
            page.items.len(),
            page.pagination.total_available
        );

        self.next = if page.is_last() {
            None
        } else {
            Some(request.next())
        };

        Ok(Some(page.items))
    }

    /// Drain every remaining page
    pub async fn collect_all(mut self) -> Result<Vec<S::Item>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }
}

/// Anything with a display name that can be looked up
pub trait Named {
    fn name(&self) -> &str;
}

/// First item, across all pages, for which `predicate` holds
pub async fn find_first<S, F>(source: &S, page_size: u32, predicate: F) -> Result<Option<S::Item>>
where
    S: PageSource,
    F: Fn(&S::Item) -> bool,
{
    let mut pager = Pager::new(source, page_size);
    while let Some(page) = pager.next_page().await? {
        if let Some(found) = page.into_iter().find(|item| predicate(item)) {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// First item, across all pages, whose name equals `name` exactly
pub async fn find_by_name<S>(source: &S, name: &str) -> Result<Option<S::Item>>
where
    S: PageSource,
    S::Item: Named,
{
    find_first(source, DEFAULT_PAGE_SIZE, |item| item.name() == name).await
}

/// Tableau serializes pagination counters as strings in JSON responses
fn number_from_string<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
