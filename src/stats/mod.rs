//! Stats module - aggregate views and descriptive statistics

mod aggregator;
mod calculator;

pub use aggregator::{MonthKey, OrderAggregates, OrderAggregator};
pub use calculator::{HistogramBin, PriceSummary, StatsCalculator};
