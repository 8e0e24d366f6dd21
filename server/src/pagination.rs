// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Page-number pagination shared by `/api/tasks/` and `/tasks/`.

use common::{Page, TaskFilter};

use crate::config::MAX_PAGE_SIZE;

/// Returned when `?page=` is not a positive number or points past the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-indexed.
    pub page: i64,
    pub page_size: i64,
    /// Whether `page_size` came from the query string and must be kept in links.
    explicit_size: bool,
}

impl PageRequest {
    /// Reads `page` and `page_size` from the query. A bad `page_size` falls
    /// back to the default; sizes above the maximum are capped.
    pub fn from_filter(filter: &TaskFilter, default_size: u32) -> Result<Self, InvalidPage> {
        let page = match filter.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some("last") => i64::MAX,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(InvalidPage),
            },
        };
        let requested_size = filter
            .page_size
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|n| *n >= 1);

        Ok(Self {
            page,
            page_size: requested_size
                .unwrap_or(default_size as i64)
                .min(MAX_PAGE_SIZE as i64),
            explicit_size: requested_size.is_some(),
        })
    }

    pub fn num_pages(&self, count: i64) -> i64 {
        if count == 0 {
            1
        } else {
            (count + self.page_size - 1) / self.page_size
        }
    }

    /// Pins `last` to the final page and rejects pages past the end.
    /// Page 1 always exists, even when there is nothing to show.
    pub fn resolve(mut self, count: i64) -> Result<Self, InvalidPage> {
        let num_pages = self.num_pages(count);
        if self.page == i64::MAX {
            self.page = num_pages;
        }
        if self.page > num_pages {
            return Err(InvalidPage);
        }
        Ok(self)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    fn link(&self, path: &str, filter: &TaskFilter, page: i64) -> String {
        let mut pairs = filter.filter_pairs();
        pairs.push(("page", page.to_string()));
        if self.explicit_size {
            pairs.push(("page_size", self.page_size.to_string()));
        }
        // Encoding a list of string pairs cannot fail.
        let query = serde_urlencoded::to_string(&pairs).unwrap_or_default();
        format!("{path}?{query}")
    }

    /// Wraps one page of results with the total count and navigation links.
    pub fn into_page<T>(self, results: Vec<T>, count: i64, path: &str, filter: &TaskFilter) -> Page<T> {
        let num_pages = self.num_pages(count);
        Page {
            count,
            next: (self.page < num_pages).then(|| self.link(path, filter, self.page + 1)),
            previous: (self.page > 1).then(|| self.link(path, filter, self.page - 1)),
            results,
        }
    }
}
