use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::config::MAX_PAGE_SIZE;
use crate::error::SearchError;
use crate::types::{RawArticle, SearchQuery};

pub type ArticleStream<'a> = BoxStream<'a, Result<RawArticle, SearchError>>;

/// One page of results as returned by a single API call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub current_page: u32,
    pub total_pages: Option<u32>,
    pub results: Vec<RawArticle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub page_size: u32,
    pub max_articles: Option<usize>,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            max_articles: None,
        }
    }
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Page size and article cap used by [`SearchClient::fetch`].
    fn limits(&self) -> PageLimits {
        PageLimits::default()
    }

    /// Fetches a single page. Pages are numbered from 1.
    async fn fetch_page(
        &self,
        query: &SearchQuery,
        page: u32,
        page_size: u32,
    ) -> Result<SearchPage, SearchError>;

    /// Lazily walks every result page for `query`, starting at page 1.
    fn fetch<'a>(&'a self, query: &'a SearchQuery) -> ArticleStream<'a> {
        paginate(self, query, self.limits())
    }
}

struct Pager<'a, C: ?Sized> {
    client: &'a C,
    query: &'a SearchQuery,
    page_size: u32,
    remaining: Option<usize>,
    next_page: u32,
    total_pages: Option<u32>,
    buffer: VecDeque<RawArticle>,
    exhausted: bool,
}

impl<C: ?Sized> Pager<'_, C> {
    fn request_size(&self) -> u32 {
        match self.remaining {
            Some(remaining) => remaining.min(self.page_size as usize) as u32,
            None => self.page_size,
        }
    }

    fn more_pages_known(&self, page: u32) -> bool {
        self.total_pages.map_or(false, |total| page < total)
    }
}

/// Turns page-at-a-time access into a stream of articles.
///
/// A page is requested only after every item of the previous page has been
/// consumed. The stream ends after a short or empty page, after the last page
/// the API reported, or once `max_articles` items were yielded. A malformed
/// page is yielded as an error and skipped if a later page is known to exist;
/// fatal errors are yielded once and end the stream.
///
/// A malformed page seen before any page reported `total_pages` also ends the
/// stream. Without a total there is nothing to say another page exists, and an
/// upstream that keeps answering with garbage would otherwise be paged forever.
pub fn paginate<'a, C>(client: &'a C, query: &'a SearchQuery, limits: PageLimits) -> ArticleStream<'a>
where
    C: SearchClient + ?Sized,
{
    let pager = Pager {
        client,
        query,
        page_size: limits.page_size.clamp(1, MAX_PAGE_SIZE),
        remaining: limits.max_articles,
        next_page: 1,
        total_pages: None,
        buffer: VecDeque::new(),
        exhausted: false,
    };

    stream::unfold(pager, |mut pager| async move {
        loop {
            if let Some(article) = pager.buffer.pop_front() {
                if let Some(remaining) = pager.remaining.as_mut() {
                    *remaining = remaining.saturating_sub(1);
                }
                return Some((Ok(article), pager));
            }
            if pager.exhausted || pager.remaining == Some(0) {
                return None;
            }

            let page = pager.next_page;
            let size = pager.request_size();
            pager.next_page += 1;
            tracing::debug!(page, page_size = size, "requesting search page");

            match pager.client.fetch_page(pager.query, page, size).await {
                Ok(result) => {
                    if result.total_pages.is_some() {
                        pager.total_pages = result.total_pages;
                    }
                    let last_page = pager.total_pages.map_or(false, |total| page >= total);
                    if result.results.len() < size as usize || last_page {
                        pager.exhausted = true;
                    }
                    pager.buffer.extend(result.results);
                    if let Some(remaining) = pager.remaining {
                        pager.buffer.truncate(remaining);
                    }
                }
                Err(err) if !err.is_fatal() => {
                    if !pager.more_pages_known(page) {
                        pager.exhausted = true;
                    }
                    return Some((Err(err), pager));
                }
                Err(err) => {
                    pager.exhausted = true;
                    return Some((Err(err), pager));
                }
            }
        }
    })
    .boxed()
}
