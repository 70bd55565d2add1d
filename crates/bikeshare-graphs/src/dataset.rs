//! In-memory column table loaded from the cleaned bike sharing CSV.

use bikeshare_common::{DashboardError, Result};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Anything that can answer "does this column exist?".
pub trait ColumnSchema {
    /// Whether a column with exactly this name exists.
    fn has_column(&self, name: &str) -> bool;
}

impl ColumnSchema for HashSet<String> {
    fn has_column(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl ColumnSchema for BTreeSet<String> {
    fn has_column(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl ColumnSchema for [&str] {
    fn has_column(&self, name: &str) -> bool {
        self.contains(&name)
    }
}

/// Typed cells of one column. Nulls are empty cells.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Every non-empty cell parsed as a number
    Numeric(Vec<Option<f64>>),
    /// At least one non-empty cell is not a number
    Text(Vec<Option<String>>),
}

impl ColumnData {
    fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Text(values) => values.len(),
        }
    }

    /// Cells rendered as display strings, nulls as empty strings.
    pub fn labels(&self) -> Vec<String> {
        match self {
            Self::Numeric(values) => values
                .iter()
                .map(|v| v.map(|n| CellValue::Number(n).to_string()).unwrap_or_default())
                .collect(),
            Self::Text(values) => values.iter().map(|v| v.clone().unwrap_or_default()).collect(),
        }
    }
}

/// A single cell used as a grouping key or filter operand.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Numeric cell
    Number(f64),
    /// Text cell
    Text(String),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Number(n) => {
                0u8.hash(state);
                n.to_bits().hash(state);
            }
            Self::Text(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{n:.0}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Creates a numeric column.
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    /// Creates a text column.
    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Typed cells.
    pub const fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the column holds numbers.
    pub const fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    /// Numeric cells, or `None` for a text column.
    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Text(_) => None,
        }
    }

    /// Cell at `row` as a key value; `None` for nulls.
    pub fn cell(&self, row: usize) -> Option<CellValue> {
        match &self.data {
            ColumnData::Numeric(values) => values.get(row).copied().flatten().map(CellValue::Number),
            ColumnData::Text(values) => values
                .get(row)
                .and_then(Option::as_ref)
                .map(|s| CellValue::Text(s.clone())),
        }
    }

    fn take(&self, rows: &[usize]) -> Self {
        let data = match &self.data {
            ColumnData::Numeric(values) => {
                ColumnData::Numeric(rows.iter().map(|&r| values[r]).collect())
            }
            ColumnData::Text(values) => {
                ColumnData::Text(rows.iter().map(|&r| values[r].clone()).collect())
            }
        };
        Self {
            name: self.name.clone(),
            data,
        }
    }
}

/// Immutable rectangular table, one row per observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    row_count: usize,
}

impl Dataset {
    /// Builds a dataset from columns of equal length with unique names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map_or(0, Column::len);
        let mut index = HashMap::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            if column.len() != row_count {
                return Err(DashboardError::data(format!(
                    "column '{}' has {} rows, expected {row_count}",
                    column.name,
                    column.len()
                )));
            }
            if index.insert(column.name.clone(), position).is_some() {
                return Err(DashboardError::data(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
        }
        Ok(Self {
            columns,
            index,
            row_count,
        })
    }

    /// Loads a CSV file with a header row.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            DashboardError::data(format!("failed to open dataset '{}': {e}", path.display()))
        })?;
        let dataset = Self::from_reader(file)?;
        info!(
            rows = dataset.row_count,
            columns = dataset.columns.len(),
            "Loaded dataset"
        );
        Ok(dataset)
    }

    /// Reads CSV text with a header row from any reader.
    ///
    /// A column becomes numeric when every non-empty cell parses as a number;
    /// empty cells (and `NaN`) are nulls.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                // Spreadsheet exports prefix the first header with a BOM.
                if idx == 0 {
                    name.trim_start_matches('\u{feff}').to_string()
                } else {
                    name.to_string()
                }
            })
            .collect();

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            for (cells, field) in raw.iter_mut().zip(record.iter()) {
                cells.push(field.to_string());
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| infer_column(name, cells))
            .collect();

        let dataset = Self::new(columns)?;
        debug!(rows = dataset.row_count, "Parsed CSV");
        Ok(dataset)
    }

    /// Number of rows.
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in file order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    /// All columns in file order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks a column up by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    /// Looks a column up by name, failing with [`DashboardError::MissingColumn`].
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.get_column(name)
            .ok_or_else(|| DashboardError::missing_column(name))
    }

    /// Numeric cells of a column, failing for missing or text columns.
    pub fn numeric_column(&self, name: &str) -> Result<&[Option<f64>]> {
        self.column(name)?
            .as_numeric()
            .ok_or_else(|| DashboardError::non_numeric_column(name))
    }

    /// New dataset holding the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            index: self.index.clone(),
            row_count: rows.len(),
        }
    }
}

impl ColumnSchema for Dataset {
    fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok()
}

fn infer_column(name: String, cells: Vec<String>) -> Column {
    let numeric = cells
        .iter()
        .all(|cell| cell.is_empty() || parse_number(cell).is_some());

    if numeric {
        let values = cells
            .iter()
            .map(|cell| parse_number(cell).filter(|v| !v.is_nan()))
            .collect();
        Column::numeric(name, values)
    } else {
        let values = cells
            .into_iter()
            .map(|cell| if cell.is_empty() { None } else { Some(cell) })
            .collect();
        Column::text(name, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> Dataset {
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_type_inference() {
        let ds = load("hr,Season,Temperature\n0,Spring,0.24\n1,Summer,\n2,Fall,0.3\n");
        assert_eq!(ds.row_count(), 3);
        assert!(ds.column("hr").unwrap().is_numeric());
        assert!(!ds.column("Season").unwrap().is_numeric());
        assert_eq!(
            ds.numeric_column("Temperature").unwrap(),
            &[Some(0.24), None, Some(0.3)]
        );
    }

    #[test]
    fn test_mixed_column_is_text() {
        let ds = load("Weather Situation\n1\nClear\n");
        let column = ds.column("Weather Situation").unwrap();
        assert!(column.as_numeric().is_none());
        assert_eq!(column.cell(0), Some(CellValue::Text("1".to_string())));
    }

    #[test]
    fn test_missing_and_non_numeric_errors() {
        let ds = load("Season,Count\nSpring,4\n");
        assert!(matches!(
            ds.column("Holiday"),
            Err(DashboardError::MissingColumn { .. })
        ));
        assert!(matches!(
            ds.numeric_column("Season"),
            Err(DashboardError::NonNumericColumn { .. })
        ));
    }

    #[test]
    fn test_ragged_rows_fail() {
        assert!(Dataset::from_reader("a,b\n1,2\n3\n".as_bytes()).is_err());
    }

    #[test]
    fn test_bom_and_whitespace_trimmed() {
        let ds = load("\u{feff}hr , Weekday\n 3 , Monday \n");
        assert!(ds.has_column("hr"));
        assert!(ds.has_column("Weekday"));
        assert_eq!(ds.column("Weekday").unwrap().cell(0), Some(CellValue::Text("Monday".into())));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = Dataset::new(vec![
            Column::numeric("x", vec![Some(1.0)]),
            Column::numeric("x", vec![Some(2.0)]),
        ]);
        assert!(matches!(result, Err(DashboardError::Data { .. })));
    }

    #[test]
    fn test_take_rows_keeps_schema() {
        let ds = load("k,v\na,1\nb,2\nc,3\n");
        let subset = ds.take_rows(&[2, 0]);
        assert_eq!(subset.row_count(), 2);
        assert_eq!(subset.numeric_column("v").unwrap(), &[Some(3.0), Some(1.0)]);
        assert_eq!(subset.column_names().collect::<Vec<_>>(), vec!["k", "v"]);
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Number(3.0).to_string(), "3");
        assert_eq!(CellValue::Number(0.25).to_string(), "0.25");
        assert_eq!(CellValue::Text("Fall".into()).to_string(), "Fall");
    }

    #[test]
    fn test_schema_impls() {
        let names: HashSet<String> = ["Total Rentals".to_string()].into_iter().collect();
        assert!(names.has_column("Total Rentals"));
        let slice: &[&str] = &["hr", "Season"];
        assert!(slice.has_column("Season"));
        assert!(!slice.has_column("Holiday"));
    }
}
