//! Order Aggregator Module
//! Derives the summary views drawn by the charts from the normalized order table.

use crate::data::dates::{
    date_from_unix_days, days_since_unix_epoch, excel_serial_to_datetime, parse_date_text,
};
use crate::data::{
    is_numeric_dtype, CATEGORY, ORDER_DATE, PRICE, PRODUCT_NAME, QUANTITY, REQUIRED_COLUMNS,
};
use crate::settings::PipelineSettings;
use crate::stats::{PriceSummary, StatsCalculator};
use chrono::NaiveDate;
use log::{debug, info};
use polars::prelude::*;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Required column '{0}' is missing")]
    MissingColumn(String),
    #[error("Column '{column}' must be numeric, found {dtype}")]
    NonNumericColumn { column: String, dtype: String },
}

/// Calendar month used as a grouping key. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Every summary view computed from one order table.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderAggregates {
    /// Descending by count, ties by category name.
    pub orders_per_category: Vec<(String, u64)>,
    /// Ascending by category name.
    pub revenue_per_category: Vec<(String, f64)>,
    /// Mean quantity per product, descending, at most `top_n` entries.
    /// Products without any quantity have no mean and sort last.
    pub top_products_by_quantity: Vec<(String, Option<f64>)>,
    pub monthly_orders: Vec<(MonthKey, u64)>,
    /// Non-null prices in table order.
    pub prices: Vec<f64>,
    /// Ascending by category name.
    pub quantity_per_category: Vec<(String, f64)>,
    pub daily_orders: Vec<(NaiveDate, u64)>,
    /// Centered rolling mean over `daily_orders`, aligned index by index.
    pub daily_rolling_mean: Vec<Option<f64>>,
    pub price_summary: Option<PriceSummary>,
    /// Order dates present in the table that could not be parsed.
    pub unparsed_order_dates: usize,
}

/// Computes aggregate views. Every operation is a read-only reduction.
pub struct OrderAggregator;

impl OrderAggregator {
    /// Compute all views from the blank-normalized order table.
    pub fn compute(
        df: &DataFrame,
        settings: &PipelineSettings,
    ) -> Result<OrderAggregates, AggregateError> {
        let df = &Self::coerce_numeric_text(df)?;
        Self::validate(df)?;

        let present_dates = df.height() - df.column(ORDER_DATE)?.null_count();
        let dated = Self::parse_order_dates(df)?;
        let parsed_dates = dated.height() - dated.column(ORDER_DATE)?.null_count();
        let unparsed_order_dates = present_dates.saturating_sub(parsed_dates);
        if unparsed_order_dates > 0 {
            debug!(
                "{} order dates could not be parsed and are left out of time buckets",
                unparsed_order_dates
            );
        }

        let daily_orders = Self::daily_orders(&dated)?;
        let daily_counts: Vec<f64> = daily_orders.iter().map(|(_, n)| *n as f64).collect();
        let daily_rolling_mean =
            StatsCalculator::centered_rolling_mean(&daily_counts, settings.rolling_window);

        let prices = Self::prices(&dated)?;
        let price_summary = StatsCalculator::summarize(&prices);

        let aggregates = OrderAggregates {
            orders_per_category: Self::orders_per_category(&dated)?,
            revenue_per_category: Self::revenue_per_category(&dated)?,
            top_products_by_quantity: Self::top_products_by_quantity(&dated, settings.top_n)?,
            monthly_orders: Self::monthly_orders(&dated)?,
            prices,
            quantity_per_category: Self::quantity_per_category(&dated)?,
            daily_orders,
            daily_rolling_mean,
            price_summary,
            unparsed_order_dates,
        };

        info!(
            "Aggregated {} categories, {} months, {} days",
            aggregates.orders_per_category.len(),
            aggregates.monthly_orders.len(),
            aggregates.daily_orders.len()
        );
        Ok(aggregates)
    }

    /// Check required columns exist and that Price and Quantity are numeric.
    pub fn validate(df: &DataFrame) -> Result<(), AggregateError> {
        for name in REQUIRED_COLUMNS {
            if df.column(name).is_err() {
                return Err(AggregateError::MissingColumn(name.to_string()));
            }
        }

        for name in [PRICE, QUANTITY] {
            let dtype = df.column(name)?.dtype();
            if !is_numeric_dtype(dtype) {
                return Err(AggregateError::NonNumericColumn {
                    column: name.to_string(),
                    dtype: dtype.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Cast text Price/Quantity columns to `Float64` when every non-null value
    /// parses as a number. Anything else is left for `validate` to reject.
    pub fn coerce_numeric_text(df: &DataFrame) -> Result<DataFrame, AggregateError> {
        let columns = df
            .get_columns()
            .iter()
            .map(|column| {
                let name = column.name().as_str();
                if column.dtype() != &DataType::String || (name != PRICE && name != QUANTITY) {
                    return column.clone();
                }

                match column
                    .as_materialized_series()
                    .strict_cast(&DataType::Float64)
                {
                    Ok(series) => {
                        debug!("Column '{}' holds numeric text, cast to f64", name);
                        Column::from(series)
                    }
                    Err(_) => column.clone(),
                }
            })
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    /// Replace `Order Date` with a `Date` column. Unparseable entries become null.
    pub fn parse_order_dates(df: &DataFrame) -> Result<DataFrame, AggregateError> {
        let source = df.column(ORDER_DATE)?;

        let parsed = match source.dtype() {
            DataType::Date => source.clone(),
            DataType::Datetime(_, _) => source.cast(&DataType::Date)?,
            DataType::String => {
                let days: Vec<Option<i32>> = source
                    .str()?
                    .into_iter()
                    .map(|value| value.and_then(parse_date_text).map(days_since_unix_epoch))
                    .collect();
                Column::new(ORDER_DATE.into(), days).cast(&DataType::Date)?
            }
            dtype if is_numeric_dtype(dtype) => {
                let serials = source.cast(&DataType::Float64)?;
                let days: Vec<Option<i32>> = serials
                    .f64()?
                    .into_iter()
                    .map(|value| {
                        value
                            .and_then(excel_serial_to_datetime)
                            .map(|dt| days_since_unix_epoch(dt.date()))
                    })
                    .collect();
                Column::new(ORDER_DATE.into(), days).cast(&DataType::Date)?
            }
            _ => Column::full_null(ORDER_DATE.into(), df.height(), &DataType::Date),
        };

        let columns: Vec<Column> = df
            .get_columns()
            .iter()
            .map(|column| {
                if column.name().as_str() == ORDER_DATE {
                    parsed.clone()
                } else {
                    column.clone()
                }
            })
            .collect();
        Ok(DataFrame::new(columns)?)
    }

    /// Number of orders per category, most frequent first.
    pub fn orders_per_category(df: &DataFrame) -> Result<Vec<(String, u64)>, AggregateError> {
        let counts = df
            .clone()
            .lazy()
            .filter(col(CATEGORY).is_not_null())
            .group_by([col(CATEGORY).cast(DataType::String)])
            .agg([len().alias("orders")])
            .sort(
                ["orders", CATEGORY],
                SortMultipleOptions::default().with_order_descending_multi([true, false]),
            )
            .collect()?;

        let keys = counts.column(CATEGORY)?.str()?;
        let values = counts.column("orders")?.cast(&DataType::UInt64)?;
        let values = values.u64()?;

        Ok(keys
            .into_iter()
            .zip(values.into_iter())
            .filter_map(|(key, value)| Some((key?.to_string(), value?)))
            .collect())
    }

    /// Total price per category.
    pub fn revenue_per_category(df: &DataFrame) -> Result<Vec<(String, f64)>, AggregateError> {
        Self::sum_per_category(df, PRICE)
    }

    /// Total quantity per category.
    pub fn quantity_per_category(df: &DataFrame) -> Result<Vec<(String, f64)>, AggregateError> {
        Self::sum_per_category(df, QUANTITY)
    }

    fn sum_per_category(df: &DataFrame, value: &str) -> Result<Vec<(String, f64)>, AggregateError> {
        let sums = df
            .clone()
            .lazy()
            .filter(col(CATEGORY).is_not_null())
            .group_by([col(CATEGORY).cast(DataType::String)])
            .agg([col(value).cast(DataType::Float64).sum().alias("total")])
            .sort([CATEGORY], SortMultipleOptions::default())
            .collect()?;

        Self::string_f64_pairs(&sums, CATEGORY, "total")
    }

    /// Products with the highest mean quantity per order.
    pub fn top_products_by_quantity(
        df: &DataFrame,
        top_n: usize,
    ) -> Result<Vec<(String, Option<f64>)>, AggregateError> {
        let means = df
            .clone()
            .lazy()
            .filter(col(PRODUCT_NAME).is_not_null())
            .group_by([col(PRODUCT_NAME).cast(DataType::String)])
            .agg([col(QUANTITY).cast(DataType::Float64).mean().alias("mean_quantity")])
            .sort(
                ["mean_quantity", PRODUCT_NAME],
                SortMultipleOptions::default()
                    .with_order_descending_multi([true, false])
                    .with_nulls_last(true),
            )
            .limit(top_n as IdxSize)
            .collect()?;

        let names = means.column(PRODUCT_NAME)?.str()?;
        let values = means.column("mean_quantity")?.f64()?;

        Ok(names
            .into_iter()
            .zip(values.into_iter())
            .filter_map(|(name, mean)| Some((name?.to_string(), mean)))
            .collect())
    }

    /// Orders per calendar month, oldest first. Rows without a date are skipped.
    pub fn monthly_orders(df: &DataFrame) -> Result<Vec<(MonthKey, u64)>, AggregateError> {
        let counts = df
            .clone()
            .lazy()
            .filter(col(ORDER_DATE).is_not_null())
            .group_by([
                col(ORDER_DATE).dt().year().cast(DataType::Int32).alias("year"),
                col(ORDER_DATE).dt().month().cast(DataType::UInt32).alias("month"),
            ])
            .agg([len().alias("orders")])
            .sort(["year", "month"], SortMultipleOptions::default())
            .collect()?;

        let years = counts.column("year")?.i32()?;
        let months = counts.column("month")?.u32()?;
        let orders = counts.column("orders")?.cast(&DataType::UInt64)?;
        let orders = orders.u64()?;

        Ok(years
            .into_iter()
            .zip(months.into_iter())
            .zip(orders.into_iter())
            .filter_map(|((year, month), n)| Some((MonthKey { year: year?, month: month? }, n?)))
            .collect())
    }

    /// Orders per calendar date, oldest first. Rows without a date are skipped.
    pub fn daily_orders(df: &DataFrame) -> Result<Vec<(NaiveDate, u64)>, AggregateError> {
        let counts = df
            .clone()
            .lazy()
            .filter(col(ORDER_DATE).is_not_null())
            .group_by([col(ORDER_DATE)])
            .agg([len().alias("orders")])
            .sort([ORDER_DATE], SortMultipleOptions::default())
            .collect()?;

        let days = counts.column(ORDER_DATE)?.cast(&DataType::Int32)?;
        let days = days.i32()?;
        let orders = counts.column("orders")?.cast(&DataType::UInt64)?;
        let orders = orders.u64()?;

        Ok(days
            .into_iter()
            .zip(orders.into_iter())
            .filter_map(|(day, n)| Some((date_from_unix_days(day?)?, n?)))
            .collect())
    }

    /// The Price column as plain values, nulls and NaN left out.
    pub fn prices(df: &DataFrame) -> Result<Vec<f64>, AggregateError> {
        let prices = df.column(PRICE)?.cast(&DataType::Float64)?;
        Ok(prices
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect())
    }

    fn string_f64_pairs(
        df: &DataFrame,
        key: &str,
        value: &str,
    ) -> Result<Vec<(String, f64)>, AggregateError> {
        let keys = df.column(key)?.str()?;
        let values = df.column(value)?.f64()?;

        Ok(keys
            .into_iter()
            .zip(values.into_iter())
            .filter_map(|(k, v)| Some((k?.to_string(), v?)))
            .collect())
    }
}
