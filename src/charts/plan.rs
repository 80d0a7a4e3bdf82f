//! Chart Plan
//! Turns aggregate views into renderer-independent chart descriptions.

use crate::settings::PipelineSettings;
use crate::stats::{HistogramBin, MonthKey, OrderAggregates, StatsCalculator};

/// The chart figures produced by a run, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    OrdersPerCategory,
    RevenuePerCategory,
    TopProducts,
    MonthlyTrend,
    PriceDistribution,
    QuantityShare,
    DailyOrders,
}

impl ChartKind {
    /// File-name friendly identifier.
    pub fn slug(&self) -> &'static str {
        match self {
            ChartKind::OrdersPerCategory => "orders_per_category",
            ChartKind::RevenuePerCategory => "revenue_per_category",
            ChartKind::TopProducts => "top_products",
            ChartKind::MonthlyTrend => "monthly_trend",
            ChartKind::PriceDistribution => "price_distribution",
            ChartKind::QuantityShare => "quantity_share",
            ChartKind::DailyOrders => "daily_orders",
        }
    }
}

/// Geometry-free content of a chart.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartBody {
    /// One bar per label.
    Bar { labels: Vec<String>, values: Vec<f64> },
    /// Points joined in label order, each marked.
    Line { labels: Vec<String>, values: Vec<f64> },
    /// Pre-binned histogram with an optional mean marker.
    Histogram {
        bins: Vec<HistogramBin>,
        mean: Option<f64>,
    },
    /// Share of the whole per label.
    Pie { labels: Vec<String>, values: Vec<f64> },
    /// Raw series overlaid with its centered rolling mean.
    DualLine {
        labels: Vec<String>,
        values: Vec<f64>,
        rolling: Vec<Option<f64>>,
        window: usize,
    },
}

/// Chart data for a single figure
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub kind: ChartKind,
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub body: ChartBody,
}

/// Builds the list of charts for one run.
pub struct ChartPlan;

impl ChartPlan {
    pub fn build(aggregates: &OrderAggregates, settings: &PipelineSettings) -> Vec<ChartData> {
        let mut charts = Vec::with_capacity(7);

        let (labels, values) = split_counts(&aggregates.orders_per_category);
        charts.push(ChartData {
            kind: ChartKind::OrdersPerCategory,
            title: "Number of Orders per Category".to_string(),
            x_desc: "Category".to_string(),
            y_desc: "Number of Orders".to_string(),
            body: ChartBody::Bar { labels, values },
        });

        let (labels, values) = split_pairs(&aggregates.revenue_per_category);
        charts.push(ChartData {
            kind: ChartKind::RevenuePerCategory,
            title: "Total Revenue per Category".to_string(),
            x_desc: "Category".to_string(),
            y_desc: "Revenue (INR)".to_string(),
            body: ChartBody::Bar { labels, values },
        });

        if settings.include_top_products {
            // Products without a mean quantity get an empty bar
            let (labels, values) = aggregates
                .top_products_by_quantity
                .iter()
                .map(|(name, mean)| (name.clone(), mean.unwrap_or(0.0)))
                .unzip();
            charts.push(ChartData {
                kind: ChartKind::TopProducts,
                title: format!("Top {} Products by Average Quantity", settings.top_n),
                x_desc: "Product Name".to_string(),
                y_desc: "Average Quantity".to_string(),
                body: ChartBody::Bar { labels, values },
            });
        }

        let (labels, values) = split_months(&aggregates.monthly_orders);
        charts.push(ChartData {
            kind: ChartKind::MonthlyTrend,
            title: "Monthly Order Trend".to_string(),
            x_desc: "Month".to_string(),
            y_desc: "Number of Orders".to_string(),
            body: ChartBody::Line { labels, values },
        });

        charts.push(ChartData {
            kind: ChartKind::PriceDistribution,
            title: "Price Distribution".to_string(),
            x_desc: "Price (INR)".to_string(),
            y_desc: "Frequency".to_string(),
            body: ChartBody::Histogram {
                bins: StatsCalculator::histogram(&aggregates.prices, settings.histogram_bins),
                mean: aggregates.price_summary.as_ref().map(|s| s.mean),
            },
        });

        let (labels, values) = split_pairs(&aggregates.quantity_per_category);
        charts.push(ChartData {
            kind: ChartKind::QuantityShare,
            title: "Quantity Share per Category".to_string(),
            x_desc: String::new(),
            y_desc: String::new(),
            body: ChartBody::Pie { labels, values },
        });

        charts.push(ChartData {
            kind: ChartKind::DailyOrders,
            title: format!(
                "Daily Orders with {}-Day Rolling Average",
                settings.rolling_window
            ),
            x_desc: "Date".to_string(),
            y_desc: "Number of Orders".to_string(),
            body: ChartBody::DualLine {
                labels: aggregates
                    .daily_orders
                    .iter()
                    .map(|(date, _)| date.format("%Y-%m-%d").to_string())
                    .collect(),
                values: aggregates
                    .daily_orders
                    .iter()
                    .map(|(_, n)| *n as f64)
                    .collect(),
                rolling: aggregates.daily_rolling_mean.clone(),
                window: settings.rolling_window,
            },
        });

        charts
    }
}

fn split_pairs(pairs: &[(String, f64)]) -> (Vec<String>, Vec<f64>) {
    pairs.iter().cloned().unzip()
}

fn split_months(pairs: &[(MonthKey, u64)]) -> (Vec<String>, Vec<f64>) {
    pairs
        .iter()
        .map(|(month, n)| (month.to_string(), *n as f64))
        .unzip()
}

fn split_counts(pairs: &[(String, u64)]) -> (Vec<String>, Vec<f64>) {
    pairs
        .iter()
        .map(|(label, n)| (label.clone(), *n as f64))
        .unzip()
}
