//! Order Insights Window
//! Shows the rendered charts one at a time, or saves them as PNG files when
//! no window can be opened.

use crate::charts::{RenderError, RenderedChart};
use crate::gui::{ChartViewer, NavAction, NavigationBar};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const WINDOW_TITLE: &str = "Order Insights";

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Failed to open chart window: {0}")]
    Display(String),

    #[error("Failed to save chart to '{path}': {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: RenderError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application window.
pub struct OrderInsightsApp {
    viewer: ChartViewer,
    nav: NavigationBar,
}

impl OrderInsightsApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, charts: Vec<RenderedChart>) -> Self {
        let viewer = ChartViewer::new(charts);
        Self {
            nav: NavigationBar::new(viewer.len()),
            viewer,
        }
    }
}

impl eframe::App for OrderInsightsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut action = NavigationBar::read_keys(ctx);

        // Bottom panel - navigation
        egui::TopBottomPanel::bottom("navigation")
            .min_height(36.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                let clicked = self.nav.show(ui, self.viewer.title(self.nav.index));
                if clicked != NavAction::None {
                    action = clicked;
                }
            });

        // Central panel - current chart
        egui::CentralPanel::default().show(ctx, |ui| {
            self.viewer.show(ctx, ui, self.nav.index);
        });

        if self.nav.apply(action) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

/// Display the charts, falling back to PNG files when no display is available.
///
/// Returns the written paths in the fallback case, an empty list otherwise.
pub fn present_charts(
    charts: &[RenderedChart],
    export_dir: &Path,
) -> Result<Vec<PathBuf>, ViewerError> {
    if !has_display() {
        warn!("No display available, saving charts to {}", export_dir.display());
        return export_charts(charts, export_dir);
    }

    match show_charts(charts.to_vec()) {
        Ok(()) => Ok(Vec::new()),
        Err(e) => {
            warn!("{}, saving charts to {}", e, export_dir.display());
            export_charts(charts, export_dir)
        }
    }
}

/// Open the window and block until it is closed.
pub fn show_charts(charts: Vec<RenderedChart>) -> Result<(), ViewerError> {
    let (width, height) = charts
        .first()
        .map(|chart| (chart.width as f32, chart.height as f32))
        .unwrap_or((1200.0, 800.0));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width + 40.0, height + 80.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title(WINDOW_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(OrderInsightsApp::new(cc, charts)))),
    )
    .map_err(|e| ViewerError::Display(e.to_string()))
}

/// Save every chart as `NN_<slug>.png` under `export_dir`.
pub fn export_charts(
    charts: &[RenderedChart],
    export_dir: &Path,
) -> Result<Vec<PathBuf>, ViewerError> {
    fs::create_dir_all(export_dir)?;

    let mut written = Vec::with_capacity(charts.len());
    for (idx, chart) in charts.iter().enumerate() {
        let path = export_dir.join(chart_file_name(idx, chart));
        chart
            .save_png(&path)
            .map_err(|source| ViewerError::Export {
                path: path.clone(),
                source,
            })?;
        info!("Saved {}", path.display());
        written.push(path);
    }

    Ok(written)
}

fn chart_file_name(idx: usize, chart: &RenderedChart) -> String {
    format!("{:02}_{}.png", idx + 1, chart.kind.slug())
}

#[cfg(target_os = "linux")]
fn has_display() -> bool {
    std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
}

#[cfg(not(target_os = "linux"))]
fn has_display() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartKind;
    use tempfile::tempdir;

    fn solid_chart(kind: ChartKind) -> RenderedChart {
        RenderedChart {
            kind,
            title: kind.slug().to_string(),
            width: 8,
            height: 6,
            rgb: vec![200u8; 8 * 6 * 3],
        }
    }

    #[test]
    fn export_numbers_files_in_display_order() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("charts");
        let charts = vec![
            solid_chart(ChartKind::OrdersPerCategory),
            solid_chart(ChartKind::MonthlyTrend),
        ];

        let written = export_charts(&charts, &out).unwrap();

        assert_eq!(
            written,
            vec![
                out.join("01_orders_per_category.png"),
                out.join("02_monthly_trend.png"),
            ]
        );
        assert!(written.iter().all(|path| path.exists()));
    }

    #[test]
    fn export_reports_bad_buffers() {
        let dir = tempdir().unwrap();
        let mut chart = solid_chart(ChartKind::DailyOrders);
        chart.rgb.clear();

        let err = export_charts(&[chart], dir.path()).unwrap_err();
        assert!(matches!(err, ViewerError::Export { .. }));
    }
}
