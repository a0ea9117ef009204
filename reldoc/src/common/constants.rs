// doc constants
pub const DOC_ID: &str = "_id";
pub const DOC_API_VERSION: &str = "_apiVersion";
pub const DOC_VERSION: &str = "_version";
pub const DOC_HISTORY: &str = "_history";
pub const DOC_CREATED_AT: &str = "_createdAt";
pub const DOC_CREATED_BY: &str = "_createdBy";
pub const DOC_LAST_MODIFIED_BY: &str = "_lastModifiedBy";
pub const DOC_LAST_MODIFIED_AT: &str = "_lastModifiedAt";

/// The reserved bookkeeping columns present on every managed table.
pub const RESERVED_FIELDS: [&str; 8] = [
    DOC_ID,
    DOC_API_VERSION,
    DOC_VERSION,
    DOC_HISTORY,
    DOC_CREATED_AT,
    DOC_CREATED_BY,
    DOC_LAST_MODIFIED_BY,
    DOC_LAST_MODIFIED_AT,
];

// Compile-time assertion for reserved fields count
const _: () = {
    const RESERVED_FIELDS_COUNT: usize = 8;
    const ACTUAL_COUNT: usize = RESERVED_FIELDS.len();
    const _: [(); 1] = [(); (ACTUAL_COUNT == RESERVED_FIELDS_COUNT) as usize];
};

/// Internal fields carrying timestamp values. Update compilation wraps
/// these in the backend timestamp constructor.
pub const TIMESTAMP_FIELDS: [&str; 2] = [DOC_CREATED_AT, DOC_LAST_MODIFIED_AT];

/// Keys with this prefix denote references to other documents. They are
/// dropped from insert column lists and never mutated by update.
pub const REFERENCE_PREFIX: &str = "ref_";

// event constants
pub const CONNECTION_EVENT: &str = "reldoc_connection_event";

pub const RELDOC_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns true if the field is one of the eight reserved internal fields.
pub fn is_reserved_field(field: &str) -> bool {
    RESERVED_FIELDS.contains(&field)
}

/// Returns true if the key denotes a document reference.
pub fn is_reference_field(field: &str) -> bool {
    field.starts_with(REFERENCE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_fields() {
        assert!(is_reserved_field("_id"));
        assert!(is_reserved_field("_createdAt"));
        assert!(is_reserved_field("_lastModifiedBy"));
        assert!(!is_reserved_field("title"));
        assert!(!is_reserved_field("_unknown"));
    }

    #[test]
    fn test_reference_fields() {
        assert!(is_reference_field("ref_author"));
        assert!(!is_reference_field("author"));
        assert!(!is_reference_field("reference"));
    }

    #[test]
    fn test_timestamp_fields_are_reserved() {
        for field in TIMESTAMP_FIELDS {
            assert!(is_reserved_field(field));
        }
    }
}
