//! GUI module - Chart window and batch export

mod app;
mod chart_viewer;
mod control_panel;

pub use app::present_charts;
pub use chart_viewer::ChartViewer;
pub use control_panel::{NavAction, NavigationBar};
