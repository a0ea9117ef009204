/// Specifies the direction for sorting result rows.
///
/// # Purpose
/// Defines whether rows should be sorted in ascending (low to high) or
/// descending (high to low) order. Used in query options to control
/// result ordering and rendered into ORDER BY clauses by the compiler.
///
/// # Usage
/// Used with the `order_by()` helper when querying collections:
/// ```text
/// let options = order_by("age", SortOrder::Ascending);
/// let result = connector.find(&filter, "people", &options, &schema)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z, oldest to newest)
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A, newest to oldest)
    Descending,
}

impl SortOrder {
    /// Interprets a Mongo-style numeric sort direction: `1` means
    /// ascending, anything else means descending.
    pub fn from_spec(direction: i64) -> SortOrder {
        if direction == 1 {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }

    /// The SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_spec() {
        assert_eq!(SortOrder::from_spec(1), SortOrder::Ascending);
        assert_eq!(SortOrder::from_spec(-1), SortOrder::Descending);
        assert_eq!(SortOrder::from_spec(0), SortOrder::Descending);
        assert_eq!(SortOrder::from_spec(2), SortOrder::Descending);
    }

    #[test]
    fn test_as_sql() {
        assert_eq!(SortOrder::Ascending.as_sql(), "ASC");
        assert_eq!(SortOrder::Descending.as_sql(), "DESC");
    }
}
