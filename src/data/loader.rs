//! Order Table Loader Module
//! Reads the first sheet of a spreadsheet (or a CSV export) into a Polars DataFrame.

use crate::data::dates::excel_serial_to_datetime;
use calamine::{open_workbook_auto, Data, Reader};
use log::{debug, info};
use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File '{}' not found", .0.display())]
    FileNotFound(PathBuf),
    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("Workbook has no sheet at index {0}")]
    SheetNotFound(usize),
    #[error("Sheet has no header row")]
    EmptySheet,
    #[error("Failed to build table: {0}")]
    Polars(#[from] PolarsError),
}

/// Stand-in for cells past the end of a short row.
static EMPTY_CELL: Data = Data::Empty;

/// Storage type chosen for one spreadsheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

/// Loads order tables from disk.
pub struct OrderLoader;

impl OrderLoader {
    /// Load the sheet at `sheet_index` (ignored for CSV files).
    pub fn load(path: &Path, sheet_index: usize) -> Result<DataFrame, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.to_path_buf()));
        }

        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        let df = if is_csv {
            Self::load_csv(path)?
        } else {
            Self::load_workbook(path, sheet_index)?
        };

        info!(
            "Loaded {} rows, {} columns from {}",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(df)
    }

    /// Load a CSV file using Polars.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;
        Ok(df)
    }

    /// Load one sheet of an xlsx/xls/ods workbook. The first row is the header.
    pub fn load_workbook(path: &Path, sheet_index: usize) -> Result<DataFrame, LoaderError> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(sheet_index)
            .ok_or(LoaderError::SheetNotFound(sheet_index))??;

        let mut rows = range.rows();
        let header = rows.next().ok_or(LoaderError::EmptySheet)?;
        let names = Self::header_names(header);
        let body: Vec<&[Data]> = rows.collect();
        debug!("Sheet {} has {} data rows", sheet_index, body.len());

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells: Vec<&Data> = body
                    .iter()
                    .map(|row| row.get(idx).unwrap_or(&EMPTY_CELL))
                    .collect();
                Self::build_column(name, &cells)
            })
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    /// Column names from the header row, made unique the way pandas does.
    fn header_names(header: &[Data]) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        header
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let base = Self::cell_text(cell).unwrap_or_else(|| format!("Unnamed: {}", idx));
                let mut name = base.clone();
                let mut suffix = 1;
                while !seen.insert(name.clone()) {
                    name = format!("{}.{}", base, suffix);
                    suffix += 1;
                }
                name
            })
            .collect()
    }

    fn infer_kind(cells: &[&Data]) -> ColumnKind {
        let mut any_value = false;
        let mut all_numeric = true;
        let mut all_integral = true;
        let mut all_bool = true;

        for cell in cells {
            match cell {
                Data::Empty | Data::Error(_) => continue,
                // Blank text is a missing value, not evidence of a text column
                Data::String(s) if s.trim().is_empty() => continue,
                Data::Int(_) => all_bool = false,
                Data::Float(f) => {
                    all_bool = false;
                    if f.fract() != 0.0 || !f.is_finite() {
                        all_integral = false;
                    }
                }
                Data::Bool(_) => {
                    all_numeric = false;
                }
                _ => {
                    all_numeric = false;
                    all_bool = false;
                }
            }
            any_value = true;
        }

        if !any_value {
            ColumnKind::Text
        } else if all_numeric && all_integral {
            ColumnKind::Integer
        } else if all_numeric {
            ColumnKind::Float
        } else if all_bool {
            ColumnKind::Boolean
        } else {
            ColumnKind::Text
        }
    }

    fn build_column(name: String, cells: &[&Data]) -> Column {
        let name: PlSmallStr = name.into();
        match Self::infer_kind(cells) {
            ColumnKind::Integer => {
                let values: Vec<Option<i64>> = cells
                    .iter()
                    .map(|cell| match cell {
                        Data::Int(i) => Some(*i),
                        Data::Float(f) => Some(*f as i64),
                        _ => None,
                    })
                    .collect();
                Column::new(name, values)
            }
            ColumnKind::Float => {
                let values: Vec<Option<f64>> = cells
                    .iter()
                    .map(|cell| match cell {
                        Data::Int(i) => Some(*i as f64),
                        Data::Float(f) => Some(*f),
                        _ => None,
                    })
                    .collect();
                Column::new(name, values)
            }
            ColumnKind::Boolean => {
                let values: Vec<Option<bool>> = cells
                    .iter()
                    .map(|cell| match cell {
                        Data::Bool(b) => Some(*b),
                        _ => None,
                    })
                    .collect();
                Column::new(name, values)
            }
            ColumnKind::Text => {
                let values: Vec<Option<String>> =
                    cells.iter().map(|cell| Self::cell_text(cell)).collect();
                Column::new(name, values)
            }
        }
    }

    /// Render a cell as text. Empty and error cells have no text.
    fn cell_text(cell: &Data) -> Option<String> {
        match cell {
            Data::Empty | Data::Error(_) => None,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
            Data::Float(f) => Some(f.to_string()),
            Data::Int(i) => Some(i.to_string()),
            Data::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
            Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// Structural summary of a table: columns, non-null counts and dtypes.
    pub fn describe(df: &DataFrame) -> String {
        let mut out = String::new();
        let height = df.height();

        if height == 0 {
            let _ = writeln!(out, "RangeIndex: 0 entries");
        } else {
            let _ = writeln!(out, "RangeIndex: {} entries, 0 to {}", height, height - 1);
        }
        let _ = writeln!(out, "Data columns (total {} columns):", df.width());

        let name_width = df
            .get_column_names()
            .iter()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max("Column".len());

        let _ = writeln!(
            out,
            " {:<3} {:<name_width$}  {:<14}  Dtype",
            "#", "Column", "Non-Null Count"
        );
        let _ = writeln!(
            out,
            "---  {:<name_width$}  {:<14}  -----",
            "------", "--------------"
        );

        let mut dtype_counts: BTreeMap<String, usize> = BTreeMap::new();
        for (idx, column) in df.get_columns().iter().enumerate() {
            let non_null = column.len() - column.null_count();
            let dtype = column.dtype().to_string();
            let _ = writeln!(
                out,
                " {:<3} {:<name_width$}  {:<14}  {}",
                idx,
                column.name().as_str(),
                format!("{} non-null", non_null),
                dtype
            );
            *dtype_counts.entry(dtype).or_default() += 1;
        }

        let tally: Vec<String> = dtype_counts
            .iter()
            .map(|(dtype, count)| format!("{}({})", dtype, count))
            .collect();
        let _ = write!(out, "dtypes: {}", tally.join(", "));
        out
    }
}

/// Check whether a dtype holds plain numbers.
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    fn write_orders_workbook(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        let header = ["Order Date", "Category", "Product Name", "Price", "Quantity"];
        for (col, name) in header.iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }

        sheet.write_string(1, 0, "2024-01-05").unwrap();
        sheet.write_string(1, 1, "Snacks").unwrap();
        sheet.write_string(1, 2, "Chips").unwrap();
        sheet.write_number(1, 3, 50.0).unwrap();
        sheet.write_number(1, 4, 2.0).unwrap();

        sheet.write_string(2, 0, "N/A").unwrap();
        sheet.write_string(2, 1, "Dairy").unwrap();
        // Product name left empty
        sheet.write_number(2, 3, 12.5).unwrap();
        sheet.write_number(2, 4, 1.0).unwrap();

        workbook.save(path).unwrap();
    }

    #[test]
    fn loads_first_sheet_with_inferred_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.xlsx");
        write_orders_workbook(&path);

        let df = OrderLoader::load(&path, 0).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names()
                .iter()
                .map(|name| name.as_str())
                .collect::<Vec<_>>(),
            vec!["Order Date", "Category", "Product Name", "Price", "Quantity"]
        );
        assert_eq!(df.column("Order Date").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("Price").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Quantity").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("Product Name").unwrap().null_count(), 1);
    }

    #[test]
    fn blank_text_cells_keep_numeric_columns_numeric() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Price").unwrap();
        sheet.write_string(0, 1, "Quantity").unwrap();
        sheet.write_number(1, 0, 50.0).unwrap();
        sheet.write_string(1, 1, "").unwrap();
        sheet.write_string(2, 0, "  ").unwrap();
        sheet.write_number(2, 1, 3.0).unwrap();
        workbook.save(&path).unwrap();

        let df = OrderLoader::load(&path, 0).unwrap();

        let price = df.column("Price").unwrap();
        assert_eq!(price.dtype(), &DataType::Float64);
        assert_eq!(price.f64().unwrap().get(0), Some(50.0));
        assert_eq!(price.null_count(), 1);

        let quantity = df.column("Quantity").unwrap();
        assert_eq!(quantity.dtype(), &DataType::Int64);
        assert_eq!(quantity.null_count(), 1);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does-not-exist.xlsx");

        match OrderLoader::load(&path, 0) {
            Err(LoaderError::FileNotFound(reported)) => assert_eq!(reported, path),
            other => panic!("expected FileNotFound, got {:?}", other.map(|df| df.height())),
        }
    }

    #[test]
    fn missing_sheet_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.xlsx");
        write_orders_workbook(&path);

        assert!(matches!(
            OrderLoader::load(&path, 3),
            Err(LoaderError::SheetNotFound(3))
        ));
    }

    #[test]
    fn loads_csv_exports() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        std::fs::write(
            &path,
            "Order Date,Category,Product Name,Price,Quantity\n\
             2024-01-05,Snacks,Chips,50,2\n\
             2024-01-20,Snacks,Nachos,30,1\n",
        )
        .unwrap();

        let df = OrderLoader::load(&path, 0).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 5);
        assert!(is_numeric_dtype(df.column("Price").unwrap().dtype()));
    }

    #[test]
    fn header_names_are_unique() {
        let header = vec![
            Data::String("Price".to_string()),
            Data::Empty,
            Data::String("Price".to_string()),
        ];
        assert_eq!(
            OrderLoader::header_names(&header),
            vec!["Price", "Unnamed: 1", "Price.1"]
        );
    }

    #[test]
    fn describe_lists_every_column() {
        let df = DataFrame::new(vec![
            Column::new("Category".into(), vec![Some("Snacks"), None]),
            Column::new("Price".into(), vec![Some(50.0), Some(30.0)]),
        ])
        .unwrap();

        let summary = OrderLoader::describe(&df);
        assert!(summary.contains("RangeIndex: 2 entries, 0 to 1"));
        assert!(summary.contains("Category"));
        assert!(summary.contains("1 non-null"));
        assert!(summary.contains("2 non-null"));
        assert!(summary.contains("Data columns (total 2 columns):"));
    }
}
