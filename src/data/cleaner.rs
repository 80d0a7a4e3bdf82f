//! Data Cleaner Module
//! Normalizes blank text cells to null and derives the de-duplicated table.

use log::info;
use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Output of the cleaning stage.
#[derive(Debug, Clone)]
pub struct CleanedTables {
    /// Every blank or whitespace-only text cell replaced by null.
    pub normalized: DataFrame,
    /// Rows without nulls, exact duplicates collapsed. Not used downstream.
    pub cleaned: DataFrame,
}

/// Handles data cleaning operations.
pub struct DataCleaner;

impl DataCleaner {
    /// Run both cleaning steps over a freshly loaded table.
    pub fn clean(df: &DataFrame) -> Result<CleanedTables, CleanerError> {
        let normalized = Self::normalize_blanks(df)?;
        let cleaned = Self::drop_incomplete_and_duplicates(&normalized)?;

        info!(
            "Cleaned table keeps {} of {} rows",
            cleaned.height(),
            normalized.height()
        );

        Ok(CleanedTables {
            normalized,
            cleaned,
        })
    }

    /// Replace empty or whitespace-only strings with null in every text column.
    pub fn normalize_blanks(df: &DataFrame) -> Result<DataFrame, CleanerError> {
        let columns = df
            .get_columns()
            .iter()
            .map(|column| -> PolarsResult<Column> {
                if column.dtype() != &DataType::String {
                    return Ok(column.clone());
                }

                let values: Vec<Option<&str>> = column
                    .str()?
                    .into_iter()
                    .map(|value| value.filter(|s| !s.trim().is_empty()))
                    .collect();
                Ok(Column::new(column.name().clone(), values))
            })
            .collect::<PolarsResult<Vec<Column>>>()?;

        Ok(DataFrame::new(columns)?)
    }

    /// Drop rows holding any null, then keep the first of each duplicate row.
    pub fn drop_incomplete_and_duplicates(df: &DataFrame) -> Result<DataFrame, CleanerError> {
        let complete = df.drop_nulls::<String>(None)?;
        let unique = complete.unique_stable(None, UniqueKeepStrategy::First, None)?;
        Ok(unique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                "Category".into(),
                vec![Some("Snacks"), Some("   "), Some("Snacks"), Some("Dairy")],
            ),
            Column::new(
                "Product Name".into(),
                vec![Some("Chips"), Some("Milk"), Some("Chips"), Some("")],
            ),
            Column::new("Price".into(), vec![Some(50.0), Some(20.0), Some(50.0), None]),
        ])
        .unwrap()
    }

    #[test]
    fn blanks_become_null() {
        let normalized = DataCleaner::normalize_blanks(&sample_table()).unwrap();

        let category = normalized.column("Category").unwrap().str().unwrap();
        assert_eq!(category.get(0), Some("Snacks"));
        assert_eq!(category.get(1), None);

        let product = normalized.column("Product Name").unwrap().str().unwrap();
        assert_eq!(product.get(3), None);
        assert_eq!(product.null_count(), 1);
    }

    #[test]
    fn non_text_columns_are_untouched() {
        let table = sample_table();
        let normalized = DataCleaner::normalize_blanks(&table).unwrap();

        assert_eq!(normalized.height(), table.height());
        assert_eq!(normalized.column("Price").unwrap().null_count(), 1);
        assert_eq!(
            normalized.column("Price").unwrap().dtype(),
            &DataType::Float64
        );
    }

    #[test]
    fn cleaned_table_has_no_nulls_or_duplicates() {
        let tables = DataCleaner::clean(&sample_table()).unwrap();

        // Row 1 has a blank category, row 3 a blank product and null price,
        // and row 2 duplicates row 0.
        assert_eq!(tables.cleaned.height(), 1);
        assert_eq!(tables.normalized.height(), 4);
        for column in tables.cleaned.get_columns() {
            assert_eq!(column.null_count(), 0);
        }
    }

    #[test]
    fn duplicates_keep_first_occurrence_order() {
        let df = DataFrame::new(vec![
            Column::new("Category".into(), vec!["B", "A", "B", "C", "A"]),
            Column::new("Price".into(), vec![1i64, 2, 1, 3, 2]),
        ])
        .unwrap();

        let unique = DataCleaner::drop_incomplete_and_duplicates(&df).unwrap();
        let category: Vec<Option<&str>> = unique
            .column("Category")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(category, vec![Some("B"), Some("A"), Some("C")]);
    }
}
