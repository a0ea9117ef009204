use crate::options::FindOptions;

/// Pagination metadata returned alongside find results.
///
/// Computed from the query options and the total row count reported by
/// the paired COUNT statement. `page` and `total_pages` are only
/// meaningful when the query carries a limit; without one the whole
/// result set is a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    /// Total number of rows matching the filter, ignoring limit/skip.
    pub total_count: u64,
    /// Number of rows skipped before the first returned row.
    pub skip: u64,
    /// Maximum number of rows in the page, if a limit was requested.
    pub limit: Option<u64>,
    /// 1-based page number derived from skip and limit.
    pub page: u64,
    /// Total number of pages at the requested limit.
    pub total_pages: u64,
}

impl PageMetadata {
    /// Computes pagination metadata for a result set.
    pub fn compute(options: &FindOptions, total_count: u64) -> PageMetadata {
        let skip = options.skip.unwrap_or(0);
        let limit = options.limit;

        let (page, total_pages) = match limit {
            Some(limit) if limit > 0 => {
                (skip / limit + 1, total_count.div_ceil(limit))
            }
            _ => (1, 1),
        };

        PageMetadata {
            total_count,
            skip,
            limit,
            page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FindOptions;

    #[test]
    fn test_compute_without_limit() {
        let metadata = PageMetadata::compute(&FindOptions::new(), 42);
        assert_eq!(metadata.total_count, 42);
        assert_eq!(metadata.skip, 0);
        assert_eq!(metadata.limit, None);
        assert_eq!(metadata.page, 1);
        assert_eq!(metadata.total_pages, 1);
    }

    #[test]
    fn test_compute_with_limit_and_skip() {
        let options = FindOptions::new().limit(10).skip(20);
        let metadata = PageMetadata::compute(&options, 45);
        assert_eq!(metadata.page, 3);
        assert_eq!(metadata.total_pages, 5);
        assert_eq!(metadata.limit, Some(10));
        assert_eq!(metadata.skip, 20);
    }

    #[test]
    fn test_compute_exact_page_boundary() {
        let options = FindOptions::new().limit(10);
        let metadata = PageMetadata::compute(&options, 40);
        assert_eq!(metadata.total_pages, 4);
        assert_eq!(metadata.page, 1);
    }

    #[test]
    fn test_compute_zero_limit_is_single_page() {
        let options = FindOptions::new().limit(0);
        let metadata = PageMetadata::compute(&options, 9);
        assert_eq!(metadata.page, 1);
        assert_eq!(metadata.total_pages, 1);
    }
}
