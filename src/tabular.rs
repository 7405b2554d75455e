// tabular.rs

use std::borrow::Cow;
use std::fmt::Display;
use std::fs;
use std::path::Path;

use encoding_rs::{UTF_8, WINDOWS_1252};
use tracing::{debug, warn};

use crate::error::MapResult;

/// Column that always stays text so county codes keep their leading zeros.
pub const TEXT_COLUMN: &str = "FIPS";

/// One untyped attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

impl Cell {
    /// Parses a raw delimited-text field. Empty fields are missing values.
    pub fn parse(raw: &str, keep_text: bool) -> Self {
        if raw.is_empty() {
            return Cell::Missing;
        }
        if !keep_text {
            if let Ok(number) = raw.parse::<f64>() {
                if number.is_finite() {
                    return Cell::Number(number);
                }
            }
        }
        Cell::Text(raw.to_string())
    }

    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Cell::Missing,
            serde_json::Value::String(s) => Cell::Text(s.clone()),
            serde_json::Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Missing),
            serde_json::Value::Bool(b) => Cell::Text(b.to_string()),
            other => Cell::Text(other.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Missing => Ok(()),
        }
    }
}

/// Rows of cells under a shared header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl DataTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column, in row order.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Cell> + 'a> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[index]))
    }
}

/// Decodes raw file bytes as UTF-8, or as ISO-8859-1 when that fails.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return text;
    }
    warn!("Data file is not valid UTF-8, falling back to ISO-8859-1");
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text
}

/// Field delimiter for a data file, picked from its extension.
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/// Parses delimited text with a header row.
pub fn parse_table(text: &str, delimiter: u8) -> MapResult<DataTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let keep_text: Vec<bool> = columns.iter().map(|c| c == TEXT_COLUMN).collect();

    let mut table = DataTable::new(columns);
    for record in reader.records() {
        let record = record?;
        let row = record
            .iter()
            .zip(&keep_text)
            .map(|(raw, keep)| Cell::parse(raw, *keep))
            .collect();
        table.rows.push(row);
    }
    Ok(table)
}

/// Reads the operator's data file.
pub fn read_data(path: &Path) -> MapResult<DataTable> {
    let bytes = fs::read(path)?;
    let text = decode_text(&bytes);
    let table = parse_table(&text, delimiter_for(path))?;
    debug!(
        rows = table.len(),
        columns = table.columns.len(),
        "Parsed data file"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn fips_stays_text_with_leading_zeros() {
        let table = parse_table("FIPS,Value,Code\n01001,12.5,007\n", b',').unwrap();
        assert_eq!(table.columns, vec!["FIPS", "Value", "Code"]);
        assert_eq!(
            table.rows[0],
            vec![
                Cell::Text("01001".into()),
                Cell::Number(12.5),
                Cell::Number(7.0)
            ]
        );
    }

    #[test]
    fn empty_fields_are_missing() {
        let table = parse_table("name,Value\nAlabama,\n", b',').unwrap();
        assert_eq!(table.rows[0][1], Cell::Missing);
        assert!(table.rows[0][1].is_missing());
    }

    #[test]
    fn non_finite_literals_stay_text() {
        assert_eq!(Cell::parse("inf", false), Cell::Text("inf".into()));
        assert_eq!(Cell::parse("NaN", false), Cell::Text("NaN".into()));
    }

    #[test]
    fn column_accessor_walks_rows() {
        let table = parse_table("a,b\n1,x\n2,y\n", b',').unwrap();
        let b: Vec<String> = table.column("b").unwrap().map(|c| c.to_string()).collect();
        assert_eq!(b, vec!["x", "y"]);
        assert!(table.column("c").is_none());
    }

    #[test]
    fn latin1_bytes_fall_back_transparently() {
        let bytes = b"fullname,Value\nPe\xf1asco,3\n";
        assert_eq!(decode_text(bytes), "fullname,Value\nPeñasco,3\n");
    }

    #[test]
    fn utf8_bom_is_removed() {
        let bytes = "\u{feff}FIPS,Value\n".as_bytes();
        assert_eq!(decode_text(bytes), "FIPS,Value\n");
    }

    #[test]
    fn read_data_uses_tab_for_tsv() {
        let mut tmp = NamedTempFile::with_suffix(".tsv").unwrap();
        write!(tmp, "USPS\tValue\nAL\t4\n").unwrap();

        let table = read_data(tmp.path()).unwrap();
        assert_eq!(table.columns, vec!["USPS", "Value"]);
        assert_eq!(table.rows[0][1], Cell::Number(4.0));
    }

    #[test]
    fn read_data_propagates_missing_file() {
        let err = read_data(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, crate::error::MapError::Io(_)));
    }
}
