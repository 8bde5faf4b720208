//! In-memory numeric table.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use ms_core::{Error, Result};

/// Column-oriented table of optional `f64` cells.
#[derive(Debug, Clone, Default)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
    index: HashMap<String, usize>,
}

impl Table {
    /// Build from named columns. All columns must have the same length.
    pub fn from_columns(columns: Vec<(String, Vec<Option<f64>>)>) -> Result<Self> {
        let n_rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        let mut names = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());
        for (name, col) in columns {
            if col.len() != n_rows {
                return Err(Error::MalformedInput(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    col.len(),
                    n_rows
                )));
            }
            names.push(name);
            data.push(col);
        }
        let names = dedup_names(names);
        let index = names.iter().enumerate().map(|(i, n)| (n.clone(), i)).collect();
        Ok(Self { names, columns: data, index })
    }

    /// Read a comma-separated file with a header row.
    ///
    /// The file handle is released when this returns, on success or error.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            rows = table.n_rows(),
            columns = table.names.len(),
            "table loaded"
        );
        Ok(table)
    }

    /// Read CSV from any reader. The first record is the header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        if headers.is_empty() {
            return Err(Error::MalformedInput("CSV has no columns".to_string()));
        }

        let n_cols = headers.len();
        let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); n_cols];
        for result in rdr.records() {
            let record = result?;
            for (j, col) in columns.iter_mut().enumerate() {
                col.push(record.get(j).and_then(parse_cell));
            }
        }

        Self::from_columns(headers.into_iter().zip(columns).collect())
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Column names in file order (duplicates suffixed `.1`, `.2`, ...).
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Raw column cells.
    pub fn column(&self, name: &str) -> Result<&[Option<f64>]> {
        self.index
            .get(name)
            .map(|&i| self.columns[i].as_slice())
            .ok_or_else(|| Error::MalformedInput(format!("missing column: '{}'", name)))
    }

    /// Column values; every cell must be present.
    pub fn complete_column(&self, name: &str) -> Result<Vec<f64>> {
        self.column(name)?
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| {
                    Error::MalformedInput(format!("column '{}' has a missing value at row {}", name, row))
                })
            })
            .collect()
    }

    /// Column values with missing cells replaced by `fill`.
    pub fn column_or(&self, name: &str, fill: f64) -> Result<Vec<f64>> {
        Ok(self.column(name)?.iter().map(|v| v.unwrap_or(fill)).collect())
    }

    /// Rows where `column == value`.
    pub fn filter_eq(&self, column: &str, value: f64) -> Result<Table> {
        let key = self.column(column)?;
        let keep: Vec<usize> = key
            .iter()
            .enumerate()
            .filter_map(|(i, v)| (*v == Some(value)).then_some(i))
            .collect();
        let columns =
            self.columns.iter().map(|col| keep.iter().map(|&i| col[i]).collect()).collect();
        Ok(Table { names: self.names.clone(), columns, index: self.index.clone() })
    }

    /// Drop every column that has at least one missing cell.
    pub fn drop_incomplete_columns(self) -> Table {
        let (names, columns): (Vec<String>, Vec<Vec<Option<f64>>>) = self
            .names
            .into_iter()
            .zip(self.columns)
            .filter(|(_, col)| col.iter().all(Option::is_some))
            .unzip();
        let index = names.iter().enumerate().map(|(i, n)| (n.clone(), i)).collect();
        Table { names, columns, index }
    }
}

fn parse_cell(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_nan() { None } else { Some(v) }
}

/// Spreadsheet exports repeat header names; later copies get `.1`, `.2`, ... suffixes.
/// A suffix already used by another header is skipped, so every name stays unique.
fn dedup_names(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(names.len());
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let unique = if taken.contains(&name) {
            let k = next_suffix.entry(name.clone()).or_insert(1);
            let mut candidate = format!("{}.{}", name, k);
            while taken.contains(&candidate) {
                *k += 1;
                candidate = format!("{}.{}", name, k);
            }
            *k += 1;
            candidate
        } else {
            name
        };
        taken.insert(unique.clone());
        out.push(unique);
    }
    out
}
