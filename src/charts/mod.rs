//! Charts module - Chart planning and rendering

mod plan;
mod renderer;

pub use plan::{ChartBody, ChartData, ChartKind, ChartPlan};
pub use renderer::{RenderError, RenderedChart, StaticChartRenderer};
