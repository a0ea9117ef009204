use crate::common::SortOrder;

/// An ordered list of fields to sort query results by.
///
/// Fields are applied in insertion order: results are sorted by the
/// first field, ties are broken by the second, and so on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortableFields {
    pub(crate) sorted_fields: Vec<(String, SortOrder)>,
}

impl SortableFields {
    /// Creates an empty list of sortable fields.
    pub fn new() -> SortableFields {
        SortableFields {
            sorted_fields: Vec::new(),
        }
    }

    /// Appends a field with the given sort order.
    pub fn add_sorted_field(mut self, field_name: String, sort_order: SortOrder) -> SortableFields {
        self.sorted_fields.push((field_name, sort_order));
        self
    }

    /// Returns an iterator over the sorted fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(String, SortOrder)> {
        self.sorted_fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted_fields.is_empty()
    }
}

/// Options for controlling find operations on documents.
///
/// `FindOptions` allows you to specify sorting, pagination, and field
/// projection for query results. It supports method chaining for
/// convenient configuration.
///
/// # Examples
///
/// ```rust,ignore
/// use reldoc::options::{order_by, skip_by, limit_to, project, FindOptions};
/// use reldoc::SortOrder;
///
/// // Create options with sorting, skip, and limit
/// let options = FindOptions::new()
///     .sort_by("age".to_string(), SortOrder::Descending)
///     .skip(10)
///     .limit(20);
///
/// // Use convenience functions
/// let options = order_by("name", SortOrder::Ascending);
/// let options = skip_by(5);
/// let options = limit_to(100);
/// let options = project(vec!["name", "age"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub(crate) sort_by: Option<SortableFields>,
    pub(crate) skip: Option<u64>,
    pub(crate) limit: Option<u64>,
    pub(crate) projection: Option<Vec<String>>,
}

/// Creates `FindOptions` with sorting by a field.
///
/// # Arguments
///
/// * `field_name` - The field to sort by
/// * `sort_order` - The sort order (Ascending or Descending)
pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    let fields = SortableFields::new();
    let fields = fields.add_sorted_field(field_name.to_string(), sort_order);

    FindOptions {
        sort_by: Some(fields),
        skip: None,
        limit: None,
        projection: None,
    }
}

/// Creates `FindOptions` that skips a number of results.
///
/// Useful for pagination: skip the first N results and process the remaining.
pub fn skip_by(skip: u64) -> FindOptions {
    FindOptions {
        sort_by: None,
        skip: Some(skip),
        limit: None,
        projection: None,
    }
}

/// Creates `FindOptions` that limits the number of results.
///
/// Combined with skip for pagination: skip(10).limit(20) returns results 11-30.
pub fn limit_to(limit: u64) -> FindOptions {
    FindOptions {
        sort_by: None,
        skip: None,
        limit: Some(limit),
        projection: None,
    }
}

/// Creates `FindOptions` that restricts results to the named fields.
///
/// The document id column is always included in projected results and
/// always comes first, whether or not it is listed.
pub fn project(fields: Vec<&str>) -> FindOptions {
    FindOptions {
        sort_by: None,
        skip: None,
        limit: None,
        projection: Some(fields.into_iter().map(str::to_string).collect()),
    }
}

impl FindOptions {
    /// Creates a new `FindOptions` with default settings.
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    /// Sets the number of documents to skip.
    pub fn skip(mut self, skip: u64) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: u64) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Appends a sort field. Multiple calls sort by the first field,
    /// breaking ties with each subsequent one.
    pub fn sort_by(mut self, field_name: String, sort_order: SortOrder) -> FindOptions {
        let fields = self.sort_by.unwrap_or_else(SortableFields::new);
        let fields = fields.add_sorted_field(field_name, sort_order);
        self.sort_by = Some(fields);
        self
    }

    /// Restricts the result documents to the named fields.
    pub fn project(mut self, fields: Vec<&str>) -> FindOptions {
        self.projection = Some(fields.into_iter().map(str::to_string).collect());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_by() {
        let options = order_by("name", SortOrder::Ascending);
        let sort_by = options.sort_by.unwrap();
        assert_eq!(
            sort_by.sorted_fields,
            vec![("name".to_string(), SortOrder::Ascending)]
        );
        assert!(options.skip.is_none());
        assert!(options.limit.is_none());
    }

    #[test]
    fn test_skip_and_limit_chaining() {
        let options = skip_by(5).limit(10);
        assert_eq!(options.skip, Some(5));
        assert_eq!(options.limit, Some(10));
    }

    #[test]
    fn test_sort_by_preserves_order() {
        let options = FindOptions::new()
            .sort_by("age".to_string(), SortOrder::Descending)
            .sort_by("name".to_string(), SortOrder::Ascending);
        let fields: Vec<_> = options.sort_by.unwrap().sorted_fields;
        assert_eq!(fields[0].0, "age");
        assert_eq!(fields[1].0, "name");
    }

    #[test]
    fn test_projection() {
        let options = project(vec!["name", "age"]);
        assert_eq!(
            options.projection,
            Some(vec!["name".to_string(), "age".to_string()])
        );
    }

    #[test]
    fn test_default_is_empty() {
        let options = FindOptions::new();
        assert!(options.sort_by.is_none());
        assert!(options.skip.is_none());
        assert!(options.limit.is_none());
        assert!(options.projection.is_none());
    }
}
