//! Curated column projection

use dkh_core::{DocumentId, EntryStatus, Fields, Record, Value};

/// Displayed fields, in display order
pub const DISPLAY_COLUMNS: [&str; 6] = ["name", "message", "createdAt", "address", "phone", "email"];

/// Header of the trailing actions column
pub const ACTIONS_HEADER: &str = "Actions";

/// Column header for a field: first letter upper-cased, rest untouched
pub fn header(field: &str) -> String {
    let mut chars = field.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Headers of the display columns followed by the actions column
pub fn headers() -> Vec<String> {
    DISPLAY_COLUMNS
        .iter()
        .map(|field| header(field))
        .chain(std::iter::once(ACTIONS_HEADER.to_string()))
        .collect()
}

/// A record reduced to the display columns plus what the row actions need
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedEntry {
    /// Document identifier
    pub id: DocumentId,
    /// Display fields that are present, in display order
    pub columns: Fields,
    /// Raw `status` field, if present
    pub status: Option<Value>,
}

impl ProjectedEntry {
    /// Project a record. Fields outside the display columns are dropped.
    pub fn project(record: &Record) -> Self {
        let columns = DISPLAY_COLUMNS
            .iter()
            .filter_map(|field| {
                record
                    .get(field)
                    .map(|value| ((*field).to_string(), value.clone()))
            })
            .collect();

        Self {
            id: record.id.clone(),
            columns,
            status: record.get(EntryStatus::FIELD).cloned(),
        }
    }

    /// Value of a display column; `None` when the record lacks the field
    pub fn cell(&self, field: &str) -> Option<&Value> {
        self.columns.get(field)
    }

    /// Status as a known variant
    pub fn known_status(&self) -> Option<EntryStatus> {
        self.status.as_ref().and_then(EntryStatus::from_value)
    }

    /// Turn the projection back into a record holding only the kept fields
    pub fn into_record(self) -> Record {
        let mut fields = self.columns;
        if let Some(status) = self.status {
            fields.insert(EntryStatus::FIELD.to_string(), status);
        }
        Record::new(self.id, fields)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("createdAt", "CreatedAt")]
    #[case("name", "Name")]
    #[case("email", "Email")]
    #[case("", "")]
    fn test_header(#[case] field: &str, #[case] expected: &str) {
        assert_eq!(header(field), expected);
    }

    #[test]
    fn test_headers_end_with_actions() {
        assert_eq!(
            headers(),
            ["Name", "Message", "CreatedAt", "Address", "Phone", "Email", "Actions"]
        );
    }

    #[test]
    fn test_projection_orders_and_filters() {
        let record = Record::new("a", Fields::new())
            .with_field("email", "x@y.z")
            .with_field("internalNote", "hidden")
            .with_field("name", "X")
            .with_field("status", "pending");

        let projected = ProjectedEntry::project(&record);

        assert_eq!(projected.columns.keys().collect::<Vec<_>>(), ["name", "email"]);
        assert_eq!(projected.cell("address"), None);
        assert_eq!(projected.known_status(), Some(EntryStatus::Pending));
    }

    #[test]
    fn test_projection_is_idempotent() {
        let record = Record::new("a", Fields::new())
            .with_field("phone", "123")
            .with_field("extra", true)
            .with_field("status", "new");

        let once = ProjectedEntry::project(&record);
        let twice = ProjectedEntry::project(&once.clone().into_record());

        assert_eq!(once, twice);
    }
}
