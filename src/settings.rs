//! Pipeline Settings
//! Fixed constants for one analysis run, passed explicitly to each stage.

use std::path::PathBuf;

/// Spreadsheet read when the application starts.
pub const DEFAULT_INPUT_PATH: &str = "blinkit_unstructured_dataset (1).xlsx";

/// Settings for a single load → clean → aggregate → render run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub input_path: PathBuf,
    /// Zero-based sheet index; only the first sheet is read by default.
    pub sheet_index: usize,
    pub top_n: usize,
    /// Width of the centered rolling mean over daily order counts.
    pub rolling_window: usize,
    pub histogram_bins: usize,
    pub chart_width: u32,
    pub chart_height: u32,
    /// Adds the top products chart to the plan; off by default.
    pub include_top_products: bool,
    /// Where charts are written when no window can be opened.
    pub export_dir: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            sheet_index: 0,
            top_n: 10,
            rolling_window: 7,
            histogram_bins: 20,
            chart_width: 1200,
            chart_height: 800,
            include_top_products: false,
            export_dir: PathBuf::from("charts"),
        }
    }
}
