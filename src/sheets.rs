//! Static sheet definitions for the compatibility spreadsheet.
//!
//! The spreadsheet has one tab per RimWorld version bucket. Tabs are
//! identified by an opaque `gid` selector and listed newest version first.

/// Public id of the compatibility spreadsheet document.
pub const DEFAULT_DOCUMENT_ID: &str = "1jaDxV8F7bcz4E9zeIRmZGKuaX7d0kvWWq28aKckISaY";

const SPREADSHEET_BASE: &str = "https://docs.google.com/spreadsheets/d";

/// One tab of the compatibility spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetDescriptor {
    /// Version bucket shown to users (e.g. "1.4/1.5").
    pub version_label: &'static str,
    /// Opaque tab selector (`gid` in the export URL).
    pub selector: &'static str,
    /// Optional note displayed next to the version.
    pub note: Option<&'static str>,
    /// Added to a table row index to get the spreadsheet row number.
    ///
    /// Tied to the exact layout of the upstream document. Edits above the
    /// data block (extra title rows, frozen headers) silently break links.
    pub row_offset: u32,
}

/// All configured sheets, newest version first.
pub static SHEETS: &[SheetDescriptor] = &[
    SheetDescriptor {
        version_label: "1.4/1.5",
        selector: "278315082",
        note: None,
        row_offset: 1,
    },
    SheetDescriptor {
        version_label: "1.3",
        selector: "1929617741",
        note: None,
        row_offset: 1,
    },
    SheetDescriptor {
        version_label: "1.1/1.2",
        selector: "1558498516",
        note: Some("Older versions, rarely updated"),
        row_offset: 2,
    },
    SheetDescriptor {
        version_label: "1.0",
        selector: "94361219",
        note: Some("Legacy list, no longer maintained"),
        row_offset: 2,
    },
];

impl SheetDescriptor {
    /// Read-only CSV export URL for this tab.
    pub fn export_url(&self, document_id: &str) -> String {
        export_url(document_id, self.selector)
    }

    /// Link to a row of this tab in the spreadsheet editor.
    ///
    /// `table_row` is the index into the parsed table (header row is 0).
    pub fn row_link(&self, document_id: &str, table_row: usize) -> String {
        let row = table_row as u64 + self.row_offset as u64;
        format!(
            "{}/{}/edit#gid={}&range=A{}",
            SPREADSHEET_BASE, document_id, self.selector, row
        )
    }
}

/// Builds the CSV export URL for a tab selector.
pub fn export_url(document_id: &str, selector: &str) -> String {
    format!(
        "{}/{}/export?format=csv&gid={}",
        SPREADSHEET_BASE, document_id, selector
    )
}

/// The most recent version's sheet.
pub fn latest() -> &'static SheetDescriptor {
    &SHEETS[0]
}

/// Finds a sheet by its tab selector.
pub fn by_selector(selector: &str) -> Option<&'static SheetDescriptor> {
    SHEETS.iter().find(|s| s.selector == selector)
}

/// Finds a sheet by its version label (e.g. "1.3").
pub fn by_version_label(label: &str) -> Option<&'static SheetDescriptor> {
    SHEETS.iter().find(|s| s.version_label == label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheets_are_newest_first_and_unique() {
        let labels: Vec<_> = SHEETS.iter().map(|s| s.version_label).collect();
        assert_eq!(labels, vec!["1.4/1.5", "1.3", "1.1/1.2", "1.0"]);

        let mut selectors: Vec<_> = SHEETS.iter().map(|s| s.selector).collect();
        selectors.sort();
        selectors.dedup();
        assert_eq!(selectors.len(), SHEETS.len());
    }

    #[test]
    fn test_export_url() {
        assert_eq!(
            export_url("DOC", "278315082"),
            "https://docs.google.com/spreadsheets/d/DOC/export?format=csv&gid=278315082"
        );
    }

    #[test]
    fn test_row_link_applies_offset() {
        let sheet = by_version_label("1.0").unwrap();
        assert_eq!(
            sheet.row_link("DOC", 5),
            "https://docs.google.com/spreadsheets/d/DOC/edit#gid=94361219&range=A7"
        );
    }

    #[test]
    fn test_lookup() {
        assert_eq!(latest().version_label, "1.4/1.5");
        assert_eq!(by_selector("1929617741").unwrap().version_label, "1.3");
        assert!(by_selector("nope").is_none());
        assert!(by_version_label("2.0").is_none());
    }
}
