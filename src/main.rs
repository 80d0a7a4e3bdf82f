//! Order Insights - Retail Order Spreadsheet Analysis & Chart Viewer
//!
//! Loads an order spreadsheet, cleans it, aggregates it by category, product
//! and date, and shows the resulting charts one at a time.

mod charts;
mod data;
mod gui;
mod settings;
mod stats;

use anyhow::Context;
use charts::{ChartPlan, StaticChartRenderer};
use data::{DataCleaner, LoaderError, OrderLoader};
use env_logger::Env;
use log::info;
use settings::PipelineSettings;
use stats::OrderAggregator;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = PipelineSettings::default();

    let df = match OrderLoader::load(&settings.input_path, settings.sheet_index) {
        Ok(df) => df,
        Err(LoaderError::FileNotFound(path)) => {
            eprintln!("Error: File '{}' not found.", path.display());
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to load order spreadsheet"),
    };

    println!("{}", OrderLoader::describe(&df));

    let tables = DataCleaner::clean(&df)?;
    let aggregates = OrderAggregator::compute(&tables.normalized, &settings)?;

    if let Some(summary) = &aggregates.price_summary {
        info!(
            "Price over {} orders: mean {:.2}, median {:.2}, std {:.2}, range {:.2}..{:.2}",
            summary.count,
            summary.mean,
            summary.median,
            summary.std,
            summary.min,
            summary.max
        );
    }

    let plan = ChartPlan::build(&aggregates, &settings);
    let rendered =
        StaticChartRenderer::render_all(&plan, settings.chart_width, settings.chart_height)
            .context("Failed to render charts")?;
    info!("Rendered {} charts", rendered.len());

    let saved = gui::present_charts(&rendered, &settings.export_dir)?;
    if !saved.is_empty() {
        info!("Saved {} charts to {}", saved.len(), settings.export_dir.display());
    }

    Ok(())
}
