use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the student table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a CSV column is inferred as.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

/// Cells serialize as their natural JSON type; `Null` becomes `null`.
impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::String(s) => serializer.serialize_str(s),
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            CellValue::Float(v) => serializer.serialize_f64(*v),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Null => serializer.serialize_unit(),
        }
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64` for score arithmetic.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Infer a typed cell from raw CSV text. `nan`, `inf` and floats that
    /// overflow to infinity read as `Null`.
    pub fn parse(s: &str) -> CellValue {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            if !f.is_finite() {
                return CellValue::Null;
            }
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Record – one student row
// ---------------------------------------------------------------------------

/// A single student (one row of the source CSV), keyed by column name.
///
/// Each cell keeps its source text next to the inferred value: numbers and
/// JSON come from the value, category keys come from the text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, CellValue>,
    #[serde(skip)]
    text: BTreeMap<String, String>,
}

impl Record {
    /// Cell for `column`; a column the row does not carry reads as `Null`.
    pub fn get(&self, column: &str) -> &CellValue {
        self.values.get(column).unwrap_or(&CellValue::Null)
    }

    /// Source text of `column`, `None` when the cell is empty or absent.
    pub fn text(&self, column: &str) -> Option<&str> {
        self.text
            .get(column)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Build a row from `(column, raw cell text)` pairs.
impl FromIterator<(String, String)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let text: BTreeMap<String, String> = iter.into_iter().collect();
        let values = text
            .iter()
            .map(|(column, raw)| (column.clone(), CellValue::parse(raw)))
            .collect();
        Record { values, text }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table. Row order and row count never change after load;
/// a student is addressed by its 0-based position.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
    /// Column names in file order (index artifacts already removed).
    column_names: Vec<String>,
}

impl Dataset {
    pub fn new(column_names: Vec<String>, records: Vec<Record>) -> Self {
        Dataset {
            records,
            column_names,
        }
    }

    /// Number of students.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Row at a 0-based position, `None` when out of bounds.
    pub fn row(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a dataset from `(column, raw cell)` rows, cells parsed like the loader does.
    pub(crate) fn dataset_from(columns: &[&str], rows: &[&[&str]]) -> Dataset {
        let records = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(row.iter())
                    .map(|(c, v)| (c.to_string(), v.to_string()))
                    .collect()
            })
            .collect();
        Dataset::new(columns.iter().map(|c| c.to_string()).collect(), records)
    }

    #[test]
    fn parse_infers_cell_types() {
        assert_eq!(CellValue::parse(""), CellValue::Null);
        assert_eq!(CellValue::parse("71"), CellValue::Integer(71));
        assert_eq!(CellValue::parse("3.5"), CellValue::Float(3.5));
        assert_eq!(CellValue::parse("true"), CellValue::Bool(true));
        assert_eq!(
            CellValue::parse("group A"),
            CellValue::String("group A".into())
        );
    }

    #[test]
    fn non_finite_numbers_read_as_null() {
        assert_eq!(CellValue::parse("inf"), CellValue::Null);
        assert_eq!(CellValue::parse("-infinity"), CellValue::Null);
        assert_eq!(CellValue::parse("1e400"), CellValue::Null);
        assert_eq!(CellValue::parse("NaN"), CellValue::Null);
        assert_eq!(CellValue::Float(f64::INFINITY).as_f64(), None);
        assert_eq!(CellValue::parse("1e300").as_f64(), Some(1e300));
    }

    #[test]
    fn text_keeps_source_spelling() {
        let record: Record = [
            ("WklyStudyHours".to_string(), "5.0".to_string()),
            ("NrSiblings".to_string(), "007".to_string()),
            ("TestPrep".to_string(), String::new()),
        ]
        .into_iter()
        .collect();
        assert_eq!(record.get("WklyStudyHours"), &CellValue::Float(5.0));
        assert_eq!(record.text("WklyStudyHours"), Some("5.0"));
        assert_eq!(record.text("NrSiblings"), Some("007"));
        assert_eq!(record.text("TestPrep"), None);
        assert_eq!(record.text("Gender"), None);
    }

    #[test]
    fn cells_serialize_as_plain_json() {
        let record: Record = [
            ("Gender".to_string(), "female".to_string()),
            ("MathScore".to_string(), "71".to_string()),
            ("TestPrep".to_string(), String::new()),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"Gender": "female", "MathScore": 71, "TestPrep": null})
        );
    }

    #[test]
    fn row_is_bounded_by_len() {
        let ds = dataset_from(&["Gender"], &[&["male"], &["female"]]);
        assert_eq!(ds.len(), 2);
        assert!(ds.row(1).is_some());
        assert!(ds.row(2).is_none());
        assert_eq!(ds.row(0).unwrap().get("Gender").to_string(), "male");
    }
}
