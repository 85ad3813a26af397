//! Column-major table with explicit nullable cells.
//!
//! Every cell is a [`Value`]. Missing data is always `Value::Null`; arithmetic
//! helpers elsewhere in the crate decide how nulls combine instead of relying on
//! NaN propagation.

use crate::error::DataError;
use serde::{Serialize, Serializer};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;
use tracing::warn;

/// A single table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    /// Interpret a raw CSV field: empty is null, finite numbers are numbers,
    /// anything else is text. `NaN`, `inf` and overflowing literals are null.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if !n.is_finite() => Value::Null,
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String form used for joins and grouping. Nulls have no key.
    pub fn key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        if n.is_nan() {
            Value::Null
        } else {
            Value::Number(n)
        }
    }
}

impl From<Option<f64>> for Value {
    fn from(n: Option<f64>) -> Self {
        n.map(Value::from).unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            _ => serializer.serialize_none(),
        }
    }
}

/// Ordered, named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<Value>>,
    rows: usize,
}

impl Table {
    /// An empty table with `rows` rows and no columns.
    pub fn with_rows(rows: usize) -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            rows,
        }
    }

    /// Build a table from `(name, values)` pairs. All columns must have the same length.
    pub fn from_columns<N: Into<String>>(columns: Vec<(N, Vec<Value>)>) -> Self {
        let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut table = Self::with_rows(rows);
        for (name, values) in columns {
            table.set_column(name, values);
        }
        table
    }

    pub fn read_csv(path: &Path) -> Result<Self, DataError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)?;
        Self::from_csv_reader(reader)
    }

    pub fn from_reader<R: io::Read>(rdr: R) -> Result<Self, DataError> {
        let reader = csv::ReaderBuilder::new().has_headers(true).from_reader(rdr);
        Self::from_csv_reader(reader)
    }

    fn from_csv_reader<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, DataError> {
        let names: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
        let mut rows = 0;
        for record in reader.records() {
            let record = record?;
            for (i, column) in columns.iter_mut().enumerate() {
                column.push(record.get(i).map(Value::parse).unwrap_or(Value::Null));
            }
            rows += 1;
        }
        Ok(Self {
            names,
            columns,
            rows,
        })
    }

    /// Write all columns, header included.
    pub fn write_csv<W: io::Write>(&self, out: W) -> Result<(), DataError> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
        writer.write_record(&self.names)?;
        for row in 0..self.rows {
            writer.write_record(self.columns.iter().map(|c| c[row].to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String, DataError> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.column_index(name).map(|i| self.columns[i].as_slice())
    }

    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        self.column(name).and_then(|c| c.get(row))
    }

    /// Coerce a column to optional numbers. `Ok(None)` when the column is absent.
    pub fn numeric(&self, name: &str) -> Result<Option<Vec<Option<f64>>>, DataError> {
        let Some(column) = self.column(name) else {
            return Ok(None);
        };
        column
            .iter()
            .enumerate()
            .map(|(row, value)| match value {
                Value::Null => Ok(None),
                Value::Number(n) => Ok(Some(*n)),
                Value::Text(s) => Err(DataError::NonNumeric {
                    column: name.to_string(),
                    row,
                    value: s.clone(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Add a column, or overwrite it in place if the name already exists.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<Value>) {
        let name = name.into();
        if self.names.is_empty() && self.rows == 0 {
            self.rows = values.len();
        }
        assert_eq!(
            values.len(),
            self.rows,
            "column '{}' has {} values for a {}-row table",
            name,
            values.len(),
            self.rows
        );
        match self.column_index(&name) {
            Some(i) => self.columns[i] = values,
            None => {
                self.names.push(name);
                self.columns.push(values);
            }
        }
    }

    pub fn set_numeric(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        self.set_column(name, values.into_iter().map(Value::from).collect());
    }

    /// Replace nulls in `name` with `fill`. Absent columns are left absent.
    pub fn fill_null(&mut self, name: &str, fill: &Value) {
        if let Some(i) = self.column_index(name) {
            for cell in self.columns[i].iter_mut().filter(|c| c.is_null()) {
                *cell = fill.clone();
            }
        }
    }

    /// Keep rows where `mask` is true.
    pub fn filter(&self, mask: &[bool]) -> Table {
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.then_some(i))
            .collect();
        self.take_rows(&indices)
    }

    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| indices.iter().map(|&i| c[i].clone()).collect())
                .collect(),
            rows: indices.len(),
        }
    }

    /// Project onto the listed columns that exist, in the listed order.
    pub fn select(&self, names: &[&str]) -> Table {
        let mut out = Table::with_rows(self.rows);
        for name in names {
            if let Some(column) = self.column(name) {
                out.set_column(*name, column.to_vec());
            }
        }
        out
    }

    /// Left join `right` onto `self` by `key`.
    ///
    /// Row order and count of `self` are preserved. The first right row per key
    /// wins. Right columns that already exist on the left only fill left nulls.
    pub fn left_join(&self, right: &Table, key: &str, right_name: &str) -> Result<Table, DataError> {
        let left_keys = self.column(key).ok_or_else(|| DataError::MissingKeyColumn {
            source_name: "merged table".to_string(),
            column: key.to_string(),
        })?;
        let right_keys = right.column(key).ok_or_else(|| DataError::MissingKeyColumn {
            source_name: right_name.to_string(),
            column: key.to_string(),
        })?;

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut duplicates = 0usize;
        for (row, value) in right_keys.iter().enumerate() {
            if let Some(k) = value.key() {
                match index.entry(k) {
                    Entry::Occupied(_) => duplicates += 1,
                    Entry::Vacant(slot) => {
                        slot.insert(row);
                    }
                }
            }
        }
        if duplicates > 0 {
            warn!(
                source = right_name,
                duplicates, "Duplicate join keys, keeping the first match"
            );
        }

        let matches: Vec<Option<usize>> = left_keys
            .iter()
            .map(|v| v.key().and_then(|k| index.get(&k).copied()))
            .collect();

        let mut out = self.clone();
        for (name, column) in right.names.iter().zip(&right.columns) {
            if name == key {
                continue;
            }
            let joined: Vec<Value> = matches
                .iter()
                .map(|m| m.map(|r| column[r].clone()).unwrap_or(Value::Null))
                .collect();
            match out.column_index(name) {
                Some(i) => {
                    for (cell, incoming) in out.columns[i].iter_mut().zip(joined) {
                        if cell.is_null() {
                            *cell = incoming;
                        }
                    }
                }
                None => {
                    out.names.push(name.clone());
                    out.columns.push(joined);
                }
            }
        }
        Ok(out)
    }

    /// Rows as JSON objects, columns in table order.
    pub fn to_json_rows(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        (0..self.rows)
            .map(|row| {
                self.names
                    .iter()
                    .zip(&self.columns)
                    .map(|(name, column)| {
                        let value =
                            serde_json::to_value(&column[row]).unwrap_or(serde_json::Value::Null);
                        (name.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> Table {
        Table::from_reader("Order_ID,Carrier\nA,BlueDart\nB,\nC,Delhivery\n".as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_cells() {
        assert_eq!(Value::parse(""), Value::Null);
        assert_eq!(Value::parse("  "), Value::Null);
        assert_eq!(Value::parse("12.5"), Value::Number(12.5));
        assert_eq!(Value::parse("NaN"), Value::Null);
        assert_eq!(Value::parse("inf"), Value::Null);
        assert_eq!(Value::parse("-infinity"), Value::Null);
        assert_eq!(Value::parse("1e400"), Value::Null);
        assert_eq!(Value::parse("Fog"), Value::Text("Fog".into()));
    }

    #[test]
    fn test_read_csv_keeps_nulls() {
        let t = orders();
        assert_eq!(t.num_rows(), 3);
        assert_eq!(t.column_names(), &["Order_ID".to_string(), "Carrier".to_string()]);
        assert_eq!(t.get(1, "Carrier"), Some(&Value::Null));
    }

    #[test]
    fn test_numeric_rejects_text() {
        let t = Table::from_reader("Fuel_Cost_INR\n10\nabc\n".as_bytes()).unwrap();
        let err = t.numeric("Fuel_Cost_INR").unwrap_err();
        assert!(matches!(err, DataError::NonNumeric { row: 1, .. }));
        assert!(t.numeric("Missing").unwrap().is_none());
    }

    #[test]
    fn test_left_join_preserves_anchor_rows() {
        let right = Table::from_reader("Order_ID,Delay\nC,5\nA,30\nZ,99\nA,1\n".as_bytes()).unwrap();
        let joined = orders().left_join(&right, "Order_ID", "delivery").unwrap();

        assert_eq!(joined.num_rows(), 3);
        let ids: Vec<String> = joined
            .column("Order_ID")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(joined.get(0, "Delay"), Some(&Value::Number(30.0)));
        assert_eq!(joined.get(1, "Delay"), Some(&Value::Null));
        assert_eq!(joined.get(2, "Delay"), Some(&Value::Number(5.0)));
    }

    #[test]
    fn test_left_join_coalesces_shared_columns() {
        let right = Table::from_reader("Order_ID,Carrier\nA,Other\nB,Ecom\n".as_bytes()).unwrap();
        let joined = orders().left_join(&right, "Order_ID", "extra").unwrap();
        assert_eq!(joined.get(0, "Carrier"), Some(&Value::from("BlueDart")));
        assert_eq!(joined.get(1, "Carrier"), Some(&Value::from("Ecom")));
        assert_eq!(joined.column_names().len(), 2);
    }

    #[test]
    fn test_left_join_requires_key() {
        let right = Table::from_reader("Id,Delay\nA,1\n".as_bytes()).unwrap();
        let err = orders().left_join(&right, "Order_ID", "delivery").unwrap_err();
        assert!(matches!(err, DataError::MissingKeyColumn { .. }));
    }

    #[test]
    fn test_csv_round_trip_text() {
        let csv = orders().to_csv_string().unwrap();
        assert_eq!(csv, "Order_ID,Carrier\nA,BlueDart\nB,\nC,Delhivery\n");
    }

    #[test]
    fn test_json_rows() {
        let rows = orders().to_json_rows();
        assert_eq!(rows[1]["Carrier"], serde_json::Value::Null);
        assert_eq!(rows[2]["Carrier"], "Delhivery");
    }
}
