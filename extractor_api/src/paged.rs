use std::sync::Arc;

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt, TryFutureExt};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::debug;

type PageFetcher<T> =
    Arc<dyn Fn(u32) -> BoxFuture<'static, Result<Vec<Option<T>>>> + Send + Sync>;

/// List that is fetched page by page, only when the entries are consumed.
///
/// The fetcher gets a 0-based page index, and returns up to `page_size` items.
/// A page shorter than that (or an empty one) means there is nothing more.
/// With [`OnDemandPagedList::with_gaps`], unusable items still count towards the page length.
pub struct OnDemandPagedList<T> {
    page_size: usize,
    fetch: PageFetcher<T>,
}

impl<T> Clone for OnDemandPagedList<T> {
    fn clone(&self) -> Self {
        OnDemandPagedList {
            page_size: self.page_size,
            fetch: self.fetch.clone(),
        }
    }
}

impl<T: Send + 'static> OnDemandPagedList<T> {
    pub fn new<F>(page_size: usize, fetch: F) -> Self
    where
        F: Fn(u32) -> BoxFuture<'static, Result<Vec<T>>> + Send + Sync + 'static,
    {
        Self::with_gaps(page_size, move |page| {
            fetch(page)
                .map_ok(|items| items.into_iter().map(Some).collect())
                .boxed()
        })
    }

    /// The fetcher returns `None` for upstream items that can't be listed (deleted videos etc.).
    /// These are left out of the entries, but the page is still judged full by its upstream length.
    pub fn with_gaps<F>(page_size: usize, fetch: F) -> Self
    where
        F: Fn(u32) -> BoxFuture<'static, Result<Vec<Option<T>>>> + Send + Sync + 'static,
    {
        OnDemandPagedList {
            page_size,
            fetch: Arc::new(fetch),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetches a single page. Pages don't depend on each other, so any order is fine.
    pub async fn get_page(&self, page: u32) -> Result<Vec<T>> {
        Ok(self.get_raw_page(page).await?.into_iter().flatten().collect())
    }

    async fn get_raw_page(&self, page: u32) -> Result<Vec<Option<T>>> {
        debug!("fetching page {}", page + 1);
        (self.fetch)(page).await
    }

    /// Starts over from the first page.
    ///
    /// The next page is only requested once all items of the previous one were consumed.
    /// If a page fails, its error is the last item.
    pub fn entries(&self) -> BoxStream<'static, Result<T>> {
        stream::try_unfold(
            (self.clone(), Some(0u32)),
            |(list, page)| async move {
                let page = match page {
                    Some(page) => page,
                    None => return Ok::<_, anyhow::Error>(None),
                };
                let items = list.get_raw_page(page).await?;
                let next = if items.is_empty() || items.len() < list.page_size {
                    None
                } else {
                    Some(page + 1)
                };
                Ok(Some((
                    stream::iter(items.into_iter().flatten().map(Ok::<T, anyhow::Error>)),
                    (list, next),
                )))
            },
        )
        .try_flatten()
        .boxed()
    }
}
