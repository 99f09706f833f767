use chrono::{DateTime, SecondsFormat, Utc};
use std::num::NonZeroU32;

/// GitHub の一覧 API が受け付ける 1 ページあたりの最大件数
pub const MAX_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(100) {
    Some(size) => size,
    None => NonZeroU32::MIN,
};

/// One page fetch against a listing endpoint. Built fresh for every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRequest {
    /// 1-based page index.
    pub page: u32,
    pub per_page: NonZeroU32,
    pub created_after: Option<DateTime<Utc>>,
}

impl ListRequest {
    pub fn first(per_page: NonZeroU32, created_after: Option<DateTime<Utc>>) -> Self {
        Self {
            page: 1,
            per_page,
            created_after,
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            ..self
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(created_after) = self.created_after {
            pairs.push((
                "created",
                format!(
                    ">{}",
                    created_after.to_rfc3339_opts(SecondsFormat::Secs, true)
                ),
            ));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_query_pairs_without_filter() {
        let request = ListRequest::first(MAX_PAGE_SIZE, None);
        assert_eq!(
            request.query_pairs(),
            vec![("page", "1".to_string()), ("per_page", "100".to_string())]
        );
    }

    #[test]
    fn test_query_pairs_with_created_filter() -> anyhow::Result<()> {
        let since = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| anyhow::anyhow!("invalid timestamp"))?;
        let request = ListRequest::first(MAX_PAGE_SIZE, Some(since)).next();

        assert_eq!(request.page, 2);
        assert_eq!(
            request.query_pairs(),
            vec![
                ("page", "2".to_string()),
                ("per_page", "100".to_string()),
                ("created", ">2024-01-01T00:00:00Z".to_string()),
            ]
        );
        Ok(())
    }
}
