use crate::domain::errors::ApiError;
use crate::domain::models::pagination::ListRequest;
use async_stream::try_stream;
use chrono::{DateTime, Utc};
use futures_util::{Stream, TryStreamExt};
use std::future::Future;
use std::num::NonZeroU32;

/// Requests pages 1, 2, 3, ... one at a time and yields each page's items.
///
/// The stream ends after the first page holding fewer than `page_size` items
/// (an empty page included). A failed page is yielded as the final item.
pub fn pages<T, F, Fut>(
    page_size: NonZeroU32,
    since: Option<DateTime<Utc>>,
    mut fetch_page: F,
) -> impl Stream<Item = Result<Vec<T>, ApiError>>
where
    F: FnMut(ListRequest) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ApiError>>,
{
    let full_page = usize::try_from(page_size.get()).unwrap_or(usize::MAX);

    try_stream! {
        let mut request = ListRequest::first(page_size, since);
        loop {
            tracing::debug!("Fetching page {} (per_page={})", request.page, page_size);
            let items = fetch_page(request).await?;
            let is_last_page = items.len() < full_page;
            tracing::debug!("Page {} returned {} items", request.page, items.len());

            yield items;

            if is_last_page {
                break;
            }
            request = request.next();
        }
    }
}

/// Concatenates every page in page order.
///
/// The fetch is all-or-nothing: if any page fails, the items gathered so far
/// are dropped and that page's error is returned.
pub async fn fetch_all<T, F, Fut>(
    page_size: NonZeroU32,
    since: Option<DateTime<Utc>>,
    fetch_page: F,
) -> Result<Vec<T>, ApiError>
where
    F: FnMut(ListRequest) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ApiError>>,
{
    pages(page_size, since, fetch_page).try_concat().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::future::ready;

    fn size(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN)
    }

    #[tokio::test]
    async fn test_concatenates_pages_until_short_page() -> anyhow::Result<()> {
        let server_pages = [vec![1, 2], vec![3, 4], vec![5]];
        let mut requested = Vec::new();

        let collection = fetch_all(size(2), None, |request| {
            requested.push(request.page);
            let index = request.page as usize - 1;
            ready(Ok(server_pages.get(index).cloned().unwrap_or_default()))
        })
        .await?;

        assert_eq!(collection, vec![1, 2, 3, 4, 5]);
        assert_eq!(requested, vec![1, 2, 3]);
        Ok(())
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_one_extra_empty_page() -> anyhow::Result<()> {
        let server_pages = [vec!["a", "b"], vec!["c", "d"]];
        let mut requests = 0;

        let collection = fetch_all(size(2), None, |request| {
            requests += 1;
            let index = request.page as usize - 1;
            ready(Ok(server_pages.get(index).cloned().unwrap_or_default()))
        })
        .await?;

        assert_eq!(collection, vec!["a", "b", "c", "d"]);
        assert_eq!(requests, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_first_page_stops_immediately() -> anyhow::Result<()> {
        let mut requests = 0;
        let collection: Vec<u64> = fetch_all(size(100), None, |_| {
            requests += 1;
            ready(Ok(Vec::new()))
        })
        .await?;

        assert!(collection.is_empty());
        assert_eq!(requests, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_page_discards_collected_items() {
        let mut requested = Vec::new();

        let result = fetch_all(size(1), None, |request| {
            requested.push(request.page);
            ready(match request.page {
                1 | 2 => Ok(vec![request.page]),
                _ => Err(ApiError::new(502, "Bad Gateway")),
            })
        })
        .await;

        assert_eq!(result, Err(ApiError::new(502, "Bad Gateway")));
        assert_eq!(requested, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_since_filter_is_sent_with_every_page() -> anyhow::Result<()> {
        let since = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>()?;
        let mut filters = Vec::new();

        fetch_all(size(1), Some(since), |request| {
            filters.push(request.created_after);
            ready(Ok(if request.page < 3 { vec![()] } else { Vec::new() }))
        })
        .await?;

        assert_eq!(filters, vec![Some(since); 3]);
        Ok(())
    }

    #[tokio::test]
    async fn test_page_stream_ends_after_error() {
        let stream = pages(size(1), None, |request| {
            ready(if request.page == 1 {
                Ok(vec![1])
            } else {
                Err(ApiError::unexpected())
            })
        });

        let items: Vec<_> = stream.collect().await;
        assert_eq!(items, vec![Ok(vec![1]), Err(ApiError::unexpected())]);
    }
}
