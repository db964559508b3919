//! Parsed spreadsheet tables and the delimited-text parser.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::mem::take;

/// Column holding the raw compatibility status.
pub const STATUS_COLUMN: usize = 0;
/// Column holding the workshop id used as lookup key.
pub const KEY_COLUMN: usize = 2;
/// Column holding free-form notes.
pub const NOTES_COLUMN: usize = 5;

const FIELD_SEPARATOR: char = ',';
const QUOTE: char = '"';

/// Rows of one sheet, header row included at index 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedTable {
    rows: Vec<Vec<String>>,
}

impl ParsedTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// All rows, header included.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Rows after the header, paired with their table index.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, row)| (i, row.as_slice()))
    }

    /// First data row whose key column equals `key` exactly.
    pub fn find_row(&self, key: &str) -> Option<(usize, &[String])> {
        self.data_rows()
            .find(|(_, row)| field(row, KEY_COLUMN) == Some(key))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Returns a field of a row, or `None` when the row is too short.
pub fn field(row: &[String], column: usize) -> Option<&str> {
    row.get(column).map(String::as_str)
}

/// All loaded sheets keyed by tab selector.
///
/// Replaced wholesale on every successful refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    sheets: BTreeMap<String, ParsedTable>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, selector: impl Into<String>, table: ParsedTable) {
        self.sheets.insert(selector.into(), table);
    }

    pub fn sheet(&self, selector: &str) -> Option<&ParsedTable> {
        self.sheets.get(selector)
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.sheets.contains_key(selector)
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Parses a CSV export into rows of trimmed fields.
///
/// A double quote toggles quoted mode, in which the separator is literal
/// text. Quote characters themselves are dropped and embedded quotes cannot
/// be escaped. Every line produces a row, so a trailing line break yields a
/// final row holding one empty field.
pub fn parse(text: &str) -> ParsedTable {
    ParsedTable::new(text.split('\n').map(parse_line).collect())
}

fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            QUOTE => in_quotes = !in_quotes,
            FIELD_SEPARATOR if !in_quotes => {
                fields.push(take(&mut current).trim().to_string());
            }
            _ => current.push(ch),
        }
    }

    fields.push(current.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_quoted_separator_is_literal() {
        let table = parse(r#"a,"b,c",d"#);
        assert_eq!(table.rows(), &[row(&["a", "b,c", "d"])]);
    }

    #[test]
    fn test_fields_are_trimmed_and_crlf_tolerated() {
        let table = parse("status , name ,id\r\n 4 ,  Foo , 123 \r\n");
        assert_eq!(table.rows()[0], row(&["status", "name", "id"]));
        assert_eq!(table.rows()[1], row(&["4", "Foo", "123"]));
    }

    #[test]
    fn test_trailing_newline_yields_degenerate_row() {
        let table = parse("h1,h2\n1,2\n");
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[2], row(&[""]));
    }

    #[test]
    fn test_empty_input_is_one_empty_row() {
        let table = parse("");
        assert_eq!(table.rows(), &[row(&[""])]);
        assert!(table.data_rows().next().is_none());
    }

    #[test]
    fn test_embedded_quotes_are_not_escaped() {
        // "" closes and reopens quoting; both quote characters are dropped.
        let table = parse(r#""say ""hi"", ok",x"#);
        assert_eq!(table.rows()[0], row(&["say hi, ok", "x"]));
    }

    #[test]
    fn test_unterminated_quote_swallows_rest_of_line() {
        let table = parse("a,\"b,c\nd,e");
        assert_eq!(table.rows()[0], row(&["a", "b,c"]));
        assert_eq!(table.rows()[1], row(&["d", "e"]));
    }

    #[test]
    fn test_find_row_skips_header_and_matches_exactly() {
        let table = parse("x,y,12345\n3,,12345\n4,,123456");
        let (index, found) = table.find_row("12345").unwrap();
        assert_eq!(index, 1);
        assert_eq!(field(found, STATUS_COLUMN), Some("3"));

        assert_eq!(table.find_row("123456").unwrap().0, 2);
        assert!(table.find_row("1234").is_none());
    }

    #[test]
    fn test_short_rows_do_not_match() {
        let table = parse("header\n1,2\n");
        assert!(table.find_row("").is_none());
    }

    #[test]
    fn test_dataset_serializes_as_selector_map() {
        let mut dataset = Dataset::new();
        dataset.insert("42", parse("a,b\n1,2"));

        let json = serde_json::to_string(&dataset).unwrap();
        assert_eq!(json, r#"{"42":[["a","b"],["1","2"]]}"#);

        let back: Dataset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dataset);
    }
}
