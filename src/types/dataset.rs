/// In-memory dataset: ordered column identifiers plus ordered rows

use super::{Row, Value};
use crate::error::{Result, SearchError};
use ahash::AHashMap;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
    index: AHashMap<String, usize>,
}

impl Dataset {
    /// Build a dataset, checking that every row matches the column count
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(SearchError::InvalidData(format!(
                "row {} has {} values, expected {}",
                i,
                row.len(),
                columns.len()
            )));
        }
        let index = build_index(&columns);
        Ok(Self { columns, rows, index })
    }

    /// A dataset with no columns and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Cell at `row` for the named column
    pub fn cell<'a>(&self, row: &'a Row, column: &str) -> Option<&'a Value> {
        self.column_index(column).and_then(|i| row.get(i))
    }

    /// All values of one column, in row order
    pub fn column_values<'a>(&'a self, column: &str) -> Option<impl Iterator<Item = &'a Value> + 'a> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Dataset {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
            index: self.index.clone(),
        }
    }

    /// Add a column, or replace it if it already exists
    pub fn with_column(mut self, name: &str, values: Vec<Value>) -> Result<Dataset> {
        if values.len() != self.rows.len() {
            return Err(SearchError::InvalidData(format!(
                "column '{}' has {} values, dataset has {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        match self.column_index(name) {
            Some(idx) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
                self.index = build_index(&self.columns);
            }
        }
        Ok(self)
    }

    /// Read a CSV stream with a header row
    ///
    /// Short records are padded with `Null`, long records are truncated.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut row: Row = record.iter().take(width).map(Value::infer).collect();
            row.resize(width, Value::Null);
            rows.push(row);
        }

        Self::new(columns, rows)
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let ds = Self::from_csv_reader(std::io::BufReader::new(file))?;
        tracing::info!(
            path = %path.as_ref().display(),
            rows = ds.len(),
            columns = ds.columns.len(),
            "dataset loaded"
        );
        Ok(ds)
    }

    /// Write the header and every row as CSV; `Null` cells are written empty
    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(Value::to_string))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.to_csv_writer(std::io::BufWriter::new(file))?;
        tracing::info!(
            path = %path.as_ref().display(),
            rows = self.len(),
            "dataset saved"
        );
        Ok(())
    }

    /// Load a CSV file, returning an empty dataset on any failure
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_csv_path(path.as_ref()) {
            Ok(ds) => ds,
            Err(e) => {
                tracing::error!(
                    path = %path.as_ref().display(),
                    error = %e,
                    "error loading dataset"
                );
                Self::empty()
            }
        }
    }
}

fn build_index(columns: &[String]) -> AHashMap<String, usize> {
    let mut index = AHashMap::with_capacity(columns.len());
    for (i, c) in columns.iter().enumerate() {
        // first occurrence wins on duplicate headers
        index.entry(c.clone()).or_insert(i);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
First Name -MyData,City -MyData,Zip –MyData,Voter Status
John,Mesa,85201,true
Jane,Tucson,,false
";

    #[test]
    fn test_from_csv_reader() {
        let ds = Dataset::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(ds.columns().len(), 4);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column_index("Zip –MyData"), Some(2));
        assert_eq!(ds.rows()[0][2], Value::Integer(85201));
        assert_eq!(ds.rows()[1][2], Value::Null);
        assert_eq!(ds.rows()[1][3], Value::Bool(false));
    }

    #[test]
    fn test_ragged_records_are_padded() {
        let ds = Dataset::from_csv_reader("a,b,c\n1\n1,2,3,4\n".as_bytes()).unwrap();
        assert_eq!(ds.rows()[0], vec![Value::Integer(1), Value::Null, Value::Null]);
        assert_eq!(ds.rows()[1].len(), 3);
    }

    #[test]
    fn test_load_or_empty_on_missing_file() {
        let ds = Dataset::load_or_empty("/definitely/not/here/macrodata.csv");
        assert!(ds.is_empty());
        assert!(ds.columns().is_empty());
    }

    #[test]
    fn test_from_csv_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macrodata.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(CSV.as_bytes()).unwrap();
        drop(f);

        let ds = Dataset::load_or_empty(&path);
        assert_eq!(ds.len(), 2);
        let row = &ds.rows()[0];
        assert_eq!(ds.cell(row, "City -MyData"), Some(&Value::Text("Mesa".into())));
    }

    #[test]
    fn test_to_csv_path_reloads_same_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("microdata.csv");
        let ds = Dataset::from_csv_reader(CSV.as_bytes())
            .unwrap()
            .with_column("lat", vec![Value::Float(33.415), Value::Null])
            .unwrap();
        ds.to_csv_path(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.ends_with(",lat"));

        let back = Dataset::from_csv_path(&path).unwrap();
        assert_eq!(back.columns(), ds.columns());
        assert_eq!(back.len(), 2);
        assert_eq!(back.cell(&back.rows()[0], "lat"), Some(&Value::Float(33.415)));
        assert_eq!(back.cell(&back.rows()[1], "lat"), Some(&Value::Null));
    }

    #[test]
    fn test_to_csv_writer_quotes_embedded_commas() {
        let ds = Dataset::new(
            vec!["Address".into()],
            vec![vec![Value::from("12 Main St, Apt 4")]],
        )
        .unwrap();
        let mut out = Vec::new();
        ds.to_csv_writer(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Address\n\"12 Main St, Apt 4\"\n");
    }

    #[test]
    fn test_new_rejects_misaligned_rows() {
        let err = Dataset::new(vec!["a".into()], vec![vec![Value::Null, Value::Null]]);
        assert!(matches!(err, Err(SearchError::InvalidData(_))));
    }

    #[test]
    fn test_with_column_appends_and_replaces() {
        let ds = Dataset::from_csv_reader(CSV.as_bytes()).unwrap();
        let ds = ds
            .with_column("lat", vec![Value::Float(33.4), Value::Null])
            .unwrap();
        assert_eq!(ds.columns().last().map(String::as_str), Some("lat"));
        let ds = ds
            .with_column("lat", vec![Value::Null, Value::Float(32.2)])
            .unwrap();
        assert_eq!(ds.columns().len(), 5);
        assert_eq!(ds.rows()[1][4], Value::Float(32.2));
        assert!(ds.with_column("lon", vec![]).is_err());
    }
}
